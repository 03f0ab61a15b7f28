use super::*;
use crate::classify::RuleCategory;

fn write_config(dir: &std::path::Path, contents: &str) -> ProjectPaths {
    let paths = ProjectPaths::new(dir.to_path_buf());
    std::fs::write(paths.config_path(), contents.as_bytes()).expect("write config");
    paths
}

#[test]
fn missing_config_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path().to_path_buf());
    let config = load_config(&paths).expect("load config");
    assert!(config.is_none());

    let settings = resolve_settings(config, &Overrides::default()).expect("settings");
    assert_eq!(settings.api_version, DEFAULT_API_VERSION);
    assert_eq!(settings.sf_command, "sf");
    assert_eq!(settings.git_command, "git");
    assert!(settings.target_org.is_none());
    assert!(settings.retrieve_args.is_empty());
    assert!(settings.extra_rules.is_empty());
}

#[test]
fn config_values_are_loaded_and_overridden() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = write_config(
        dir.path(),
        r#"{
            "schema_version": 1,
            "api_version": "57.0",
            "target_org": "staging",
            "deploy_args": "--wait 30 --test-level 'RunLocalTests'",
            "extra_rules": [
                {"marker": "documents", "suffix": ".document-meta.xml", "type": "Document", "extraction": "folder_path"}
            ]
        }"#,
    );
    let config = load_config(&paths).expect("load config");

    let settings = resolve_settings(
        config,
        &Overrides {
            api_version: Some("60.0".to_string()),
            target_org: None,
        },
    )
    .expect("settings");

    assert_eq!(settings.api_version, "60.0");
    assert_eq!(settings.target_org.as_deref(), Some("staging"));
    assert_eq!(
        settings.deploy_args,
        vec!["--wait", "30", "--test-level", "RunLocalTests"]
    );
    assert_eq!(settings.extra_rules.len(), 1);
    assert_eq!(settings.extra_rules[0].category, RuleCategory::Configured);
    assert_eq!(settings.extra_rules[0].extraction, Extraction::FolderPath);
}

#[test]
fn unknown_fields_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = write_config(dir.path(), r#"{"schema_version": 1, "apiVersion": "58.0"}"#);
    assert!(load_config(&paths).is_err());
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = write_config(dir.path(), r#"{"schema_version": 2}"#);
    let err = load_config(&paths).expect_err("schema version");
    assert!(format!("{err:#}").contains("schema_version 2"));
}

#[test]
fn malformed_api_version_is_rejected() {
    assert!(validate_api_version("58").is_err());
    assert!(validate_api_version("v58.0").is_err());
    assert!(validate_api_version("58.0").is_ok());
    let err = resolve_settings(
        None,
        &Overrides {
            api_version: Some("latest".to_string()),
            target_org: None,
        },
    )
    .expect_err("bad override");
    assert!(err.to_string().contains("latest"));
}

#[test]
fn unbalanced_quotes_in_args_are_rejected() {
    let config = ProjectConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        retrieve_args: Some("--wait 'oops".to_string()),
        ..ProjectConfig::default()
    };
    assert!(resolve_settings(Some(config), &Overrides::default()).is_err());
}

#[test]
fn invalid_extra_rule_is_rejected() {
    let config = ProjectConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        extra_rules: vec![RuleConfig {
            marker: "a/b".to_string(),
            suffix: None,
            metadata_type: "X".to_string(),
            extraction: Extraction::StripSuffix,
        }],
        ..ProjectConfig::default()
    };
    let err = resolve_settings(Some(config), &Overrides::default()).expect_err("bad rule");
    assert!(format!("{err:#}").contains("single directory name"));
}

#[test]
fn blank_command_is_rejected() {
    let config = ProjectConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        sf_command: Some("  ".to_string()),
        ..ProjectConfig::default()
    };
    assert!(validate_config(&config).is_err());
}

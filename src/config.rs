//! Project configuration.
//!
//! An optional `.delta-deploy.json` at the project root tunes the manifest
//! version, the external tools, and extra classification rules. CLI flags
//! override file values; a missing file means defaults.
use crate::classify::{ClassificationRule, Extraction};
use crate::manifest::DEFAULT_API_VERSION;
use crate::paths::ProjectPaths;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;

/// Current schema version for `.delta-deploy.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

const DEFAULT_SF_COMMAND: &str = "sf";
const DEFAULT_GIT_COMMAND: &str = "git";

/// On-disk project config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sf_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_org: Option<String>,
    /// Extra arguments for retrieval, shell-quoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieve_args: Option<String>,
    /// Extra arguments for deployment, shell-quoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_args: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_rules: Vec<RuleConfig>,
}

/// A classification rule declared in the project config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub marker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(rename = "type")]
    pub metadata_type: String,
    pub extraction: Extraction,
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_version: Option<String>,
    pub target_org: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_version: String,
    pub sf_command: String,
    pub git_command: String,
    pub target_org: Option<String>,
    pub retrieve_args: Vec<String>,
    pub deploy_args: Vec<String>,
    pub extra_rules: Vec<ClassificationRule>,
}

/// Load `.delta-deploy.json`, returning `None` when the project has none.
pub fn load_config(paths: &ProjectPaths) -> Result<Option<ProjectConfig>> {
    let path = paths.config_path();
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: ProjectConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(Some(config))
}

/// Validate schema version and user-provided values.
pub fn validate_config(config: &ProjectConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if let Some(version) = config.api_version.as_deref() {
        validate_api_version(version)?;
    }
    for (label, value) in [
        ("sf_command", config.sf_command.as_deref()),
        ("git_command", config.git_command.as_deref()),
        ("target_org", config.target_org.as_deref()),
    ] {
        if value.is_some_and(|value| value.trim().is_empty()) {
            return Err(anyhow!("{label} must be non-empty when set"));
        }
    }
    Ok(())
}

/// Check the manifest API version looks like `58.0`.
pub fn validate_api_version(version: &str) -> Result<()> {
    let pattern = Regex::new(r"^\d+\.\d+$").context("compile api version pattern")?;
    if !pattern.is_match(version) {
        return Err(anyhow!(
            "api_version must look like \"58.0\" (got {version:?})"
        ));
    }
    Ok(())
}

/// Merge config file values, CLI overrides, and defaults.
pub fn resolve_settings(config: Option<ProjectConfig>, overrides: &Overrides) -> Result<Settings> {
    let config = config.unwrap_or_default();
    let api_version = overrides
        .api_version
        .clone()
        .or(config.api_version)
        .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    validate_api_version(&api_version)?;

    let retrieve_args = split_args(config.retrieve_args.as_deref(), "retrieve_args")?;
    let deploy_args = split_args(config.deploy_args.as_deref(), "deploy_args")?;
    let extra_rules = config
        .extra_rules
        .iter()
        .map(|rule| {
            ClassificationRule::configured(
                &rule.marker,
                rule.suffix.as_deref(),
                &rule.metadata_type,
                rule.extraction,
            )
        })
        .collect::<Result<Vec<_>>>()
        .context("invalid extra_rules entry")?;

    Ok(Settings {
        api_version,
        sf_command: config
            .sf_command
            .unwrap_or_else(|| DEFAULT_SF_COMMAND.to_string()),
        git_command: config
            .git_command
            .unwrap_or_else(|| DEFAULT_GIT_COMMAND.to_string()),
        target_org: overrides.target_org.clone().or(config.target_org),
        retrieve_args,
        deploy_args,
        extra_rules,
    })
}

fn split_args(raw: Option<&str>, label: &str) -> Result<Vec<String>> {
    match raw {
        Some(raw) => shell_words::split(raw).with_context(|| format!("parse {label}")),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

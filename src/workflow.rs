//! End-to-end command flow.
//!
//! changed paths -> records -> grouping -> manifest text -> selected mode.
use crate::changes::{ChangedPath, GitCli};
use crate::classify::{Classification, RuleSet};
use crate::cli::{Mode, RootArgs};
use crate::config::{load_config, resolve_settings, Overrides, Settings};
use crate::manifest::{aggregate, serialize, ManifestGrouping, MetadataRecord};
use crate::paths::{ensure_project_root, ProjectPaths};
use crate::pipeline::Pipeline;
use crate::platform::SfCli;
use crate::util::display_path;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Changed paths sorted into classified records and leftovers.
#[derive(Debug, Default)]
pub struct ClassifiedChanges {
    pub records: Vec<MetadataRecord>,
    /// Paths no rule recognized.
    pub unmatched: Vec<String>,
    /// Paths a rule recognized but could not name.
    pub malformed: Vec<String>,
}

impl ClassifiedChanges {
    pub fn unclassified_count(&self) -> usize {
        self.unmatched.len() + self.malformed.len()
    }
}

/// Classify every changed path.
pub fn classify_changes(rules: &RuleSet, changes: &[ChangedPath]) -> ClassifiedChanges {
    let mut classified = ClassifiedChanges::default();
    for change in changes {
        match rules.inspect(&change.path) {
            Classification::Matched(record) => classified.records.push(record),
            Classification::Malformed { metadata_type } => {
                tracing::debug!(path = %change.path, %metadata_type, "malformed component path");
                classified.malformed.push(change.path.clone());
            }
            Classification::Unmatched => {
                tracing::debug!(path = %change.path, "no classification rule");
                classified.unmatched.push(change.path.clone());
            }
        }
    }
    classified
}

pub fn run(args: &RootArgs) -> Result<()> {
    let project_root = ensure_project_root(&args.project_root)?;
    let paths = ProjectPaths::new(project_root);
    let settings = resolve_settings(
        load_config(&paths)?,
        &Overrides {
            api_version: args.api_version.clone(),
            target_org: args.target_org.clone(),
        },
    )?;

    let git = GitCli::new(&settings.git_command, paths.root())?;
    let changes = git.changed_paths(&args.branch, &args.head)?;
    if changes.is_empty() {
        println!("No changes detected against {}.", args.branch);
        return Ok(());
    }

    let rules = RuleSet::builtin().with_extra(settings.extra_rules.iter().cloned());
    let classified = classify_changes(&rules, &changes);
    report_unclassified(&classified);
    let grouping = aggregate(classified.records);
    if grouping.is_empty() {
        println!(
            "No deployable components among {} changed files.",
            changes.len()
        );
        return Ok(());
    }
    log_grouping(&grouping);
    let document = serialize(&grouping, &settings.api_version);

    match args.mode() {
        Mode::ManifestOnly { output } => {
            let output = match output {
                Some(path) if path.is_relative() => paths.root().join(path),
                Some(path) => path,
                None => paths.default_manifest_path(),
            };
            write_manifest(&output, &document)?;
            println!(
                "Wrote {} components across {} types to {}",
                grouping.component_count(),
                grouping.type_count(),
                display_path(&output, Some(paths.root()))
            );
        }
        Mode::RetrieveOnly => {
            let platform = sf_cli(&settings, &paths)?;
            Pipeline::new(&platform, &paths).run_retrieve(&document)?;
            println!(
                "Retrieved {} components across {} types.",
                grouping.component_count(),
                grouping.type_count()
            );
        }
        Mode::Deploy { changeset } => {
            let platform = sf_cli(&settings, &paths)?;
            let report = Pipeline::new(&platform, &paths).run_deploy(&document, &changeset)?;
            println!(
                "Deployed change set {:?} ({} files).",
                report.changeset, report.archive_entries
            );
        }
    }
    Ok(())
}

fn sf_cli(settings: &Settings, paths: &ProjectPaths) -> Result<SfCli> {
    SfCli::from_settings(settings, paths.root())
}

fn write_manifest(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, document).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn report_unclassified(classified: &ClassifiedChanges) {
    let count = classified.unclassified_count();
    if count == 0 {
        return;
    }
    eprintln!(
        "warning: {count} changed paths matched no metadata rule ({} unrecognized, {} malformed); run with --verbose to list them",
        classified.unmatched.len(),
        classified.malformed.len()
    );
}

fn log_grouping(grouping: &ManifestGrouping) {
    for (metadata_type, names) in grouping.sorted_blocks() {
        tracing::info!(%metadata_type, count = names.len(), "manifest type");
    }
}

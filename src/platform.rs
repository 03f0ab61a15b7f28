//! Remote platform collaborator.
//!
//! Retrieval and deployment are opaque, blocking calls to the platform CLI.
//! The [`Platform`] trait is the seam the pipeline is written against.
use crate::config::Settings;
use crate::util::{failure_detail, path_to_string};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// Where retrieved components should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveTarget<'a> {
    /// Update the project's source tree in place.
    SourceTree,
    /// Write a metadata-format archive into this directory.
    MetadataDir(&'a Path),
}

/// A retrieval selected by a manifest document.
#[derive(Debug, Clone, Copy)]
pub struct RetrieveRequest<'a> {
    pub manifest: &'a Path,
    pub target: RetrieveTarget<'a>,
}

pub trait Platform {
    /// Fetch the components listed in the manifest.
    fn retrieve(&self, request: &RetrieveRequest<'_>) -> Result<()>;
    /// Deploy a single metadata archive.
    fn deploy(&self, archive: &Path) -> Result<()>;
}

/// The `sf` command-line tool.
#[derive(Debug, Clone)]
pub struct SfCli {
    program: PathBuf,
    project_root: PathBuf,
    target_org: Option<String>,
    retrieve_args: Vec<String>,
    deploy_args: Vec<String>,
}

impl SfCli {
    /// Resolve the configured CLI on `PATH`.
    pub fn from_settings(settings: &Settings, project_root: &Path) -> Result<Self> {
        let program = which::which(&settings.sf_command)
            .with_context(|| format!("locate {:?} on PATH", settings.sf_command))?;
        Ok(Self {
            program,
            project_root: project_root.to_path_buf(),
            target_org: settings.target_org.clone(),
            retrieve_args: settings.retrieve_args.clone(),
            deploy_args: settings.deploy_args.clone(),
        })
    }

    fn run(&self, action: &str, args: &[String]) -> Result<()> {
        tracing::debug!(program = %self.program.display(), ?args, "{action} starting");
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("run {} for {action}", self.program.display()))?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            success = output.status.success(),
            "{action} finished"
        );
        if !output.status.success() {
            return Err(anyhow!("{action} failed: {}", failure_detail(&output)));
        }
        Ok(())
    }
}

impl Platform for SfCli {
    fn retrieve(&self, request: &RetrieveRequest<'_>) -> Result<()> {
        let args = build_retrieve_args(request, self.target_org.as_deref(), &self.retrieve_args)?;
        self.run("retrieve", &args)
    }

    fn deploy(&self, archive: &Path) -> Result<()> {
        let args = build_deploy_args(archive, self.target_org.as_deref(), &self.deploy_args)?;
        self.run("deploy", &args)
    }
}

fn build_retrieve_args(
    request: &RetrieveRequest<'_>,
    target_org: Option<&str>,
    extra: &[String],
) -> Result<Vec<String>> {
    let mut args = vec![
        "project".to_string(),
        "retrieve".to_string(),
        "start".to_string(),
        "--manifest".to_string(),
        path_to_string(request.manifest, "manifest")?,
    ];
    if let RetrieveTarget::MetadataDir(dir) = request.target {
        args.push("--target-metadata-dir".to_string());
        args.push(path_to_string(dir, "retrieve target")?);
    }
    push_common_args(&mut args, target_org, extra);
    Ok(args)
}

fn build_deploy_args(
    archive: &Path,
    target_org: Option<&str>,
    extra: &[String],
) -> Result<Vec<String>> {
    let mut args = vec![
        "project".to_string(),
        "deploy".to_string(),
        "start".to_string(),
        "--metadata-dir".to_string(),
        path_to_string(archive, "deploy archive")?,
    ];
    push_common_args(&mut args, target_org, extra);
    Ok(args)
}

fn push_common_args(args: &mut Vec<String>, target_org: Option<&str>, extra: &[String]) {
    if let Some(org) = target_org {
        args.push("--target-org".to_string());
        args.push(org.to_string());
    }
    args.extend(extra.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tree_retrieve_has_no_target_dir() {
        let request = RetrieveRequest {
            manifest: Path::new("/p/.delta-deploy-1/package.xml"),
            target: RetrieveTarget::SourceTree,
        };
        let args = build_retrieve_args(&request, None, &[]).expect("args");
        assert_eq!(
            args,
            vec![
                "project",
                "retrieve",
                "start",
                "--manifest",
                "/p/.delta-deploy-1/package.xml"
            ]
        );
    }

    #[test]
    fn metadata_retrieve_targets_the_work_dir() {
        let request = RetrieveRequest {
            manifest: Path::new("/w/package.xml"),
            target: RetrieveTarget::MetadataDir(Path::new("/w/retrieved")),
        };
        let args = build_retrieve_args(&request, Some("uat"), &["--wait".to_string(), "10".to_string()])
            .expect("args");
        assert_eq!(
            &args[5..],
            [
                "--target-metadata-dir",
                "/w/retrieved",
                "--target-org",
                "uat",
                "--wait",
                "10"
            ]
        );
    }

    #[test]
    fn deploy_passes_the_archive_as_metadata_dir() {
        let args = build_deploy_args(Path::new("/w/deploy.zip"), None, &[]).expect("args");
        assert_eq!(
            args,
            vec!["project", "deploy", "start", "--metadata-dir", "/w/deploy.zip"]
        );
    }
}

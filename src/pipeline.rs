//! Retrieve, patch, repackage, and deploy.
//!
//! A run walks `Idle -> Retrieved -> Extracted -> Patched -> Packaged ->
//! Deployed`; any error moves it to `Failed`. All on-disk state lives in a
//! per-run working directory owned by a [`CleanupGuard`], so it is removed on
//! every exit path. External calls are blocking and never retried.
use crate::archive::{extract_archive, pack_directory};
use crate::cleanup::{remove_path, CleanupGuard};
use crate::patch::patch_manifest_file;
use crate::paths::{ProjectPaths, WorkPaths, MANIFEST_FILE_NAME};
use crate::platform::{Platform, RetrieveRequest, RetrieveTarget};
use crate::util::display_path;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Retrieved,
    Extracted,
    Patched,
    Packaged,
    Deployed,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "idle",
            PipelineState::Retrieved => "retrieved",
            PipelineState::Extracted => "extracted",
            PipelineState::Patched => "patched",
            PipelineState::Packaged => "packaged",
            PipelineState::Deployed => "deployed",
            PipelineState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Summary of a completed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub changeset: String,
    pub archive_entries: usize,
}

/// Drives one pipeline run against a [`Platform`].
pub struct Pipeline<'a, P: Platform> {
    platform: &'a P,
    paths: &'a ProjectPaths,
    state: PipelineState,
    failed_after: Option<PipelineState>,
}

impl<'a, P: Platform> Pipeline<'a, P> {
    pub fn new(platform: &'a P, paths: &'a ProjectPaths) -> Self {
        Self {
            platform,
            paths,
            state: PipelineState::Idle,
            failed_after: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Last state reached before the run failed.
    pub fn failed_after(&self) -> Option<PipelineState> {
        self.failed_after
    }

    /// Retrieve the manifest's components into the project source tree.
    pub fn run_retrieve(&mut self, manifest: &str) -> Result<()> {
        self.ensure_idle()?;
        let work = self.paths.create_work_dir()?;
        let mut guard = CleanupGuard::new();
        guard.track(work.root());
        let manifest_path = self.stage_manifest(&work, manifest, &mut guard)?;

        self.platform
            .retrieve(&RetrieveRequest {
                manifest: &manifest_path,
                target: RetrieveTarget::SourceTree,
            })
            .context("retrieve components into the source tree")
            .map_err(|err| self.fail(err))?;
        self.advance(
            PipelineState::Retrieved,
            format!("components written to {}", self.paths.root().display()),
        );
        Ok(())
    }

    /// Run the full pipeline, stamping `changeset` into the deployed manifest.
    pub fn run_deploy(&mut self, manifest: &str, changeset: &str) -> Result<DeployReport> {
        self.ensure_idle()?;
        let work = self.paths.create_work_dir()?;
        let mut guard = CleanupGuard::new();
        guard.track(work.root());
        let manifest_path = self.stage_manifest(&work, manifest, &mut guard)?;

        self.deploy_stages(&work, &manifest_path, changeset)
            .map_err(|err| self.fail(err))
    }

    fn deploy_stages(
        &mut self,
        work: &WorkPaths,
        manifest_path: &Path,
        changeset: &str,
    ) -> Result<DeployReport> {
        let retrieved_dir = work.retrieved_dir();
        fs::create_dir_all(&retrieved_dir)
            .with_context(|| format!("create {}", retrieved_dir.display()))?;
        self.platform
            .retrieve(&RetrieveRequest {
                manifest: manifest_path,
                target: RetrieveTarget::MetadataDir(&retrieved_dir),
            })
            .context("retrieve components")?;
        self.advance(
            PipelineState::Retrieved,
            format!("metadata archive fetched into {}", self.rel(&retrieved_dir)),
        );

        let retrieved_archive = work.retrieved_archive();
        if !retrieved_archive.is_file() {
            return Err(anyhow!(
                "retrieval reported success but produced no archive at {}",
                retrieved_archive.display()
            ));
        }
        let extracted_dir = work.extracted_dir();
        extract_archive(&retrieved_archive, &extracted_dir)?;
        remove_path(&retrieved_archive);
        self.advance(
            PipelineState::Extracted,
            format!("archive unpacked into {}", self.rel(&extracted_dir)),
        );

        let extracted_manifest = locate_manifest(&extracted_dir)?;
        patch_manifest_file(&extracted_manifest, changeset)?;
        self.advance(
            PipelineState::Patched,
            format!("change set {changeset:?} stamped into {}", self.rel(&extracted_manifest)),
        );

        let deploy_archive = work.deploy_archive();
        let archive_entries = pack_directory(&extracted_dir, &deploy_archive)?;
        self.advance(
            PipelineState::Packaged,
            format!("{archive_entries} files packed into {}", self.rel(&deploy_archive)),
        );

        self.platform
            .deploy(&deploy_archive)
            .context("deploy change set")?;
        self.advance(
            PipelineState::Deployed,
            format!("change set {changeset:?} deployed"),
        );

        Ok(DeployReport {
            changeset: changeset.to_string(),
            archive_entries,
        })
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(anyhow!("pipeline already ran (state: {})", self.state));
        }
        Ok(())
    }

    fn stage_manifest(
        &mut self,
        work: &WorkPaths,
        manifest: &str,
        guard: &mut CleanupGuard,
    ) -> Result<PathBuf> {
        let manifest_path = work.manifest_path();
        guard.track(&manifest_path);
        if let Err(err) = fs::write(&manifest_path, manifest)
            .with_context(|| format!("write {}", manifest_path.display()))
        {
            return Err(self.fail(err));
        }
        Ok(manifest_path)
    }

    fn advance(&mut self, next: PipelineState, detail: String) {
        tracing::info!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
        println!("[{next}] {detail}");
    }

    fn fail(&mut self, err: anyhow::Error) -> anyhow::Error {
        tracing::warn!(state = %self.state, "pipeline failed");
        self.failed_after = Some(self.state);
        let failed_in = self.state;
        self.state = PipelineState::Failed;
        err.context(format!("pipeline failed after the {failed_in} state"))
    }

    fn rel(&self, path: &Path) -> String {
        display_path(path, Some(self.paths.root()))
    }
}

/// Find the manifest inside an unpacked archive: at its root or one folder down.
fn locate_manifest(extracted_dir: &Path) -> Result<PathBuf> {
    let direct = extracted_dir.join(MANIFEST_FILE_NAME);
    if direct.is_file() {
        return Ok(direct);
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(extracted_dir)
        .with_context(|| format!("read {}", extracted_dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    dirs.into_iter()
        .map(|dir| dir.join(MANIFEST_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            anyhow!(
                "retrieved archive has no {MANIFEST_FILE_NAME} under {}",
                extracted_dir.display()
            )
        })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

//! Typed paths into the project and per-run working directory.
//!
//! The project root is resolved once at startup and passed around explicitly;
//! nothing here searches the filesystem for it.
use crate::util::now_epoch_ms;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Optional project config file name.
pub const CONFIG_FILE_NAME: &str = ".delta-deploy.json";
/// Manifest file name used both locally and inside retrieved archives.
pub const MANIFEST_FILE_NAME: &str = "package.xml";
/// Prefix of per-run working directories under the project root.
pub const WORK_DIR_PREFIX: &str = ".delta-deploy-";
/// Archive name the platform writes into a metadata retrieve target.
pub const RETRIEVED_ARCHIVE_NAME: &str = "unpackaged.zip";
/// Repackaged archive name at the top of the working directory.
pub const DEPLOY_ARCHIVE_NAME: &str = "deploy.zip";

/// Canonicalize the user-supplied project root.
pub fn ensure_project_root(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("resolve project root {}", path.display()))
}

/// Locations derived from the project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `.delta-deploy.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Return the manifest path used when no `--output` is given.
    pub fn default_manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Create a fresh working directory for one run.
    ///
    /// Fails if the directory already exists; runs never share state.
    pub fn create_work_dir(&self) -> Result<WorkPaths> {
        let run_id = format!("{}-{}", now_epoch_ms()?, std::process::id());
        let root = self.root.join(format!("{WORK_DIR_PREFIX}{run_id}"));
        fs::create_dir(&root).with_context(|| format!("create {}", root.display()))?;
        Ok(WorkPaths { root })
    }
}

/// Layout of a single run's working directory.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    root: PathBuf,
}

impl WorkPaths {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the generated manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Return the metadata retrieve target directory.
    pub fn retrieved_dir(&self) -> PathBuf {
        self.root.join("retrieved")
    }

    /// Return the archive the platform drops into [`Self::retrieved_dir`].
    pub fn retrieved_archive(&self) -> PathBuf {
        self.retrieved_dir().join(RETRIEVED_ARCHIVE_NAME)
    }

    /// Return the directory the retrieved archive is unpacked into.
    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    /// Return the repackaged archive path.
    pub fn deploy_archive(&self) -> PathBuf {
        self.root.join(DEPLOY_ARCHIVE_NAME)
    }
}

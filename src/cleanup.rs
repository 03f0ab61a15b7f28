//! Scoped removal of transient pipeline state.
//!
//! A [`CleanupGuard`] owns every path a run creates. Dropping it removes them,
//! so success, early returns via `?`, and panics all leave the project clean.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removes tracked paths when dropped.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file or directory for removal.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove everything now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Newest first so files go before the directories holding them.
        for path in self.paths.drain(..).rev() {
            remove_path(&path);
        }
    }
}

/// Best-effort recursive removal; a missing path is not an error.
///
/// Returns `true` when nothing remains at `path`.
pub fn remove_path(path: &Path) -> bool {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed");
            true
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            eprintln!("warning: failed to clean {}: {err}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_removes_files_and_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let work = dir.path().join("work");
        fs::create_dir_all(work.join("nested/deeper")).expect("create work");
        fs::write(work.join("nested/deeper/file.txt"), "x").expect("write");
        let manifest = dir.path().join("package.xml");
        fs::write(&manifest, "<Package/>").expect("write manifest");

        {
            let mut guard = CleanupGuard::new();
            guard.track(&work);
            guard.track(&manifest);
            assert_eq!(guard.tracked().len(), 2);
        }

        assert!(!work.exists());
        assert!(!manifest.exists());
    }

    #[test]
    fn missing_paths_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ghost = dir.path().join("never-created");
        assert!(remove_path(&ghost));
        let mut guard = CleanupGuard::new();
        guard.track(&ghost);
        guard.release();
        assert!(!ghost.exists());
    }

    #[test]
    fn cleanup_runs_on_error_return() {
        fn failing_stage(work: &Path) -> anyhow::Result<()> {
            let mut guard = CleanupGuard::new();
            fs::create_dir_all(work)?;
            guard.track(work);
            fs::write(work.join("partial.zip"), "partial")?;
            anyhow::bail!("stage failed");
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let work = dir.path().join("work");
        assert!(failing_stage(&work).is_err());
        assert!(!work.exists());
    }
}

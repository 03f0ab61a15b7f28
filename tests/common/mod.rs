//! Shared test infrastructure for binary-level tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Path to the compiled `delta-deploy` binary.
pub fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_delta-deploy"))
}

/// Run the binary with `args` and capture its output.
pub fn run_binary(args: &[&str]) -> Output {
    Command::new(binary())
        .args(args)
        .env_remove("DELTA_DEPLOY_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("run delta-deploy")
}

/// A throwaway git repository acting as a project root.
pub struct GitProject {
    dir: TempDir,
}

impl GitProject {
    /// Create a repository with one empty commit, or `None` when git is missing.
    pub fn init() -> Option<Self> {
        if which::which("git").is_err() {
            eprintln!("Skipping: git not available");
            return None;
        }
        let project = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        project.git(&["init", "-q"]);
        project.commit("initial");
        Some(project)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn root_arg(&self) -> &str {
        self.root().to_str().expect("utf-8 temp dir")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(path, contents).expect("write file");
    }

    pub fn commit(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&[
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "--allow-empty",
            "-m",
            message,
        ]);
    }

    /// Entries left behind by pipeline runs.
    pub fn work_dirs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.root())
            .expect("read project root")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(".delta-deploy-"))
            })
            .collect()
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .stdout(Stdio::null())
            .status()
            .expect("run git");
        assert!(status.success(), "git {args:?} failed");
    }
}

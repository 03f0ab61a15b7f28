//! Changed paths reported by version control.
use crate::util::failure_detail;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How a path changed between the two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
}

/// One added or modified path, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub path: String,
    pub kind: ChangeKind,
}

/// Parse `git diff --name-status` output, keeping added and modified entries.
pub fn parse_name_status(output: &str) -> Result<Vec<ChangedPath>> {
    let pattern = Regex::new(r"^([AM])\d*\t(.+)$").context("compile name-status pattern")?;
    let mut changes = Vec::new();
    for line in output.lines() {
        let Some(captures) = pattern.captures(line) else {
            continue;
        };
        let kind = match &captures[1] {
            "A" => ChangeKind::Added,
            _ => ChangeKind::Modified,
        };
        changes.push(ChangedPath {
            path: captures[2].replace('\\', "/"),
            kind,
        });
    }
    Ok(changes)
}

/// `git` invoked from the project root.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    project_root: PathBuf,
}

impl GitCli {
    /// Resolve `command` on `PATH`.
    pub fn new(command: &str, project_root: &Path) -> Result<Self> {
        let program =
            which::which(command).with_context(|| format!("locate {command:?} on PATH"))?;
        Ok(Self {
            program,
            project_root: project_root.to_path_buf(),
        })
    }

    /// Paths added or modified in `head` relative to `base`.
    pub fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<ChangedPath>> {
        let args = build_diff_args(base, head);
        tracing::debug!(program = %self.program.display(), ?args, "listing changed paths");
        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run git diff in {}", self.project_root.display()))?;
        if !output.status.success() {
            return Err(anyhow!("git diff failed: {}", failure_detail(&output)));
        }
        let stdout = String::from_utf8(output.stdout).context("git diff output is not UTF-8")?;
        parse_name_status(&stdout)
    }
}

fn build_diff_args(base: &str, head: &str) -> Vec<String> {
    vec![
        "-c".to_string(),
        "core.quotePath=false".to_string(),
        "diff".to_string(),
        "--name-status".to_string(),
        "--no-renames".to_string(),
        "--diff-filter=AM".to_string(),
        base.to_string(),
        head.to_string(),
        "--".to_string(),
    ]
}

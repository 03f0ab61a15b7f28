use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Output;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

pub fn path_to_string(path: &Path, label: &str) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{label} path is not valid UTF-8"))
}

/// First non-empty stderr line, or the exit status when stderr is silent.
pub fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    match stderr.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) => line.to_string(),
        None => format!("status {}", output.status),
    }
}

/// Current epoch time in milliseconds.
pub fn now_epoch_ms() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_path_is_relative_to_base_when_possible() {
        let base = Path::new("/project");
        assert_eq!(
            display_path(Path::new("/project/package.xml"), Some(base)),
            "package.xml"
        );
        assert_eq!(display_path(Path::new("/elsewhere/x"), Some(base)), "/elsewhere/x");
        assert_eq!(display_path(Path::new("rel/x"), None), "rel/x");
    }
}

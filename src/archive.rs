//! Zip archive helpers for the retrieve/deploy round trip.
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Highest deflate level.
const MAX_COMPRESSION_LEVEL: i64 = 9;

/// Unpack `archive` into `dest`, creating `dest` if needed.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip =
        ZipArchive::new(file).with_context(|| format!("read archive {}", archive.display()))?;
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    zip.extract(dest)
        .with_context(|| format!("extract {} into {}", archive.display(), dest.display()))?;
    tracing::debug!(
        archive = %archive.display(),
        entries = zip.len(),
        "archive extracted"
    );
    Ok(())
}

/// Zip every file below `root` into `archive`, keyed by its path relative to `root`.
///
/// Returns the number of files written.
pub fn pack_directory(root: &Path, archive: &Path) -> Result<usize> {
    let files = collect_files(root)?;
    if files.is_empty() {
        return Err(anyhow!("nothing to package under {}", root.display()));
    }
    let file = File::create(archive).with_context(|| format!("create {}", archive.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(MAX_COMPRESSION_LEVEL));
    for path in &files {
        let entry_name = entry_name(root, path)?;
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        zip.start_file(entry_name.as_str(), options)
            .with_context(|| format!("add {entry_name} to archive"))?;
        zip.write_all(&bytes)
            .with_context(|| format!("write {entry_name} to archive"))?;
    }
    zip.finish()
        .with_context(|| format!("finish {}", archive.display()))?;
    Ok(files.len())
}

/// All regular files below `root`, sorted. Symlinks are skipped, not followed.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound && dir == root => break,
            Err(err) => return Err(err).with_context(|| format!("read {}", dir.display())),
        };
        for entry in entries {
            let entry = entry.with_context(|| format!("read {}", dir.display()))?;
            let file_type = entry
                .file_type()
                .with_context(|| format!("inspect {}", entry.path().display()))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            } else {
                tracing::debug!(path = %entry.path().display(), "skipping non-regular entry");
            }
        }
    }
    files.sort();
    Ok(files)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let parts = rel
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| anyhow!("archive path {} is not valid UTF-8", rel.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

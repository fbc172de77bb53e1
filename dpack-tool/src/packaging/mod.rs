use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dpack_lib::Config;
use glob::Pattern;

use crate::fs_utils;

pub mod zip;

/// A file selected for packaging, paired with the name its data will
/// carry inside the archive.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name_in_archive: String,
}

/// Compression method applied to every entry in the archive.
#[derive(Debug, Clone, Copy)]
pub enum Compressor {
    Deflate,
    Stored,
}

/// Counters reported after a successful build.
#[derive(Debug, Clone, Copy)]
pub struct BuildSummary {
    pub added: usize,
    pub skipped: usize,
}

/// Resolves the source paths, in order, into the list of archive entries.
///
/// A file source contributes one entry named by its base name alone; two
/// file sources sharing a base name therefore collide, and the later one
/// wins on extraction. A directory source contributes one entry per file
/// found by [`fs_utils::dir_entries`]. A path that is missing, matches a
/// skip pattern, or exists but is neither a regular file nor a directory
/// (broken symlink, device node), produces a warning and counts as
/// skipped; it never fails the plan. Traversal and metadata I/O errors do.
///
/// Per-path progress lines are only printed with `progress` set, so a dry
/// run can reuse the plan without them.
pub fn plan_entries(
    sources: &[String],
    skip: &[Pattern],
    progress: bool,
) -> Result<(Vec<FileEntry>, usize)> {
    let mut entries = Vec::new();
    let mut skipped: usize = 0;

    for source in sources {
        let path = Path::new(source);
        if !path.exists() {
            eprintln!("⚠️  Warning: '{source}' does not exist. Skipping.");
            skipped += 1;
            continue;
        }
        if fs_utils::is_skipped(path, skip) {
            eprintln!("⚠️  Warning: '{source}' matches a skip pattern. Skipping.");
            skipped += 1;
            continue;
        }

        if path.is_file() {
            let name = path
                .file_name()
                .with_context(|| format!("no file name in '{source}'"))?
                .to_string_lossy()
                .to_string();
            if progress {
                println!("Added file: {source}");
            }
            entries.push(FileEntry {
                path: path.to_path_buf(),
                name_in_archive: name,
            });
        } else if path.is_dir() {
            if progress {
                println!("Processing folder: {source}...");
            }
            for entry in fs_utils::dir_entries(path, skip) {
                entries.push(entry?);
            }
        } else {
            eprintln!("⚠️  Warning: '{source}' is not a file or directory. Skipping.");
            skipped += 1;
        }
    }

    Ok((entries, skipped))
}

/// Packages `sources` into a zip archive at `output`.
///
/// The archive is created in truncate mode, so a previous archive at the
/// same path is replaced, never appended to. On a hard error (destination
/// not creatable, a source unreadable after it passed the existence check,
/// write failure) the build aborts and a partially written file may be
/// left at `output`.
pub fn build(
    output: &Path,
    sources: &[String],
    skip: &[Pattern],
    config: &Config,
    compressor: Compressor,
) -> Result<BuildSummary> {
    let (entries, skipped) = plan_entries(sources, skip, true)?;
    fs_utils::total_size(config, &entries)?;
    zip::write_zip(output, &entries, compressor)?;

    Ok(BuildSummary {
        added: entries.len(),
        skipped,
    })
}

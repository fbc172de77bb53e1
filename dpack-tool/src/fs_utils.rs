use anyhow::{Context, Result};
use dpack_lib::Config;
use glob::Pattern;
use std::{
    fs,
    path::{Component, Path},
};
use walkdir::WalkDir;

use crate::packaging::FileEntry;

/// Compiles the configured skip globs, failing on the first invalid pattern.
pub fn compile_skip_patterns(patterns: Option<&[String]>) -> Result<Vec<Pattern>> {
    patterns
        .unwrap_or(&[])
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid skip pattern: {p}")))
        .collect()
}

pub fn is_skipped(path: &Path, patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|p| p.matches(&path_str))
}

/// Builds an archive entry name from a relative path.
///
/// Only normal components survive; root, prefix, `.` and `..` are dropped,
/// so the resulting name can never point outside the extraction root.
pub fn arcname_from(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Lazily walks a source directory, yielding one entry per regular file.
///
/// Traversal is depth-first, with the contents of each directory visited in
/// lexicographic file-name order. Entry names are computed relative to the
/// *parent* of `dir`, so the directory's own name stays as the top-level
/// folder inside the archive. Paths matching a skip pattern are pruned,
/// subtrees included.
pub fn dir_entries<'a>(
    dir: &Path,
    skip: &'a [Pattern],
) -> impl Iterator<Item = Result<FileEntry>> + 'a {
    let anchor = dir.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| !is_skipped(e.path(), skip))
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => return Some(Err(anyhow::Error::from(e))),
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let rel = entry.path().strip_prefix(&anchor).unwrap_or(entry.path());
            Some(Ok(FileEntry {
                path: entry.path().to_path_buf(),
                name_in_archive: arcname_from(rel),
            }))
        })
}

/// Sums the on-disk size of all planned entries and enforces the configured
/// `max_size` limit. If the limit is exceeded, exits with code 42.
pub fn total_size(config: &Config, entries: &[FileEntry]) -> Result<u64> {
    let mut total: u64 = 0;
    for entry in entries {
        let meta = fs::metadata(&entry.path)
            .with_context(|| format!("reading metadata for {}", entry.path.display()))?;
        total += meta.len();
    }

    if let Some(limit) = config.max_size.filter(|v| *v > 0) {
        if total > limit {
            eprintln!(
                "Error: total size {} exceeds limit {}",
                encode_size(total),
                encode_size(limit)
            );
            std::process::exit(42);
        }
    }

    Ok(total)
}

const SIZE_SUFFIXES: [(&str, u64); 8] = [
    ("ki", 1024),
    ("mi", 1024 * 1024),
    ("gi", 1024 * 1024 * 1024),
    ("ti", 1024 * 1024 * 1024 * 1024),
    ("kb", 1000),
    ("mb", 1000 * 1000),
    ("gb", 1000 * 1000 * 1000),
    ("tb", 1000 * 1000 * 1000 * 1000),
];

/// Parses human-readable sizes in binary (Ki/Mi/Gi/Ti) and decimal
/// (KB/MB/GB/TB) units. Plain numbers are taken as bytes.
/// Examples: "512Mi", "10Gi", "1MB", "500kb", "1024", "2.5GB"
pub fn parse_size(s: &str) -> Result<u64> {
    let normalized = s.trim().to_ascii_lowercase();

    for (suffix, multiplier) in SIZE_SUFFIXES {
        if let Some(number) = normalized.strip_suffix(suffix) {
            let number: f64 = number
                .trim()
                .parse()
                .with_context(|| format!("invalid size format: {s}"))?;
            return Ok((number * multiplier as f64) as u64);
        }
    }

    normalized
        .parse::<u64>()
        .with_context(|| format!("invalid size format: {s}"))
}

/// Converts bytes into a human-friendly string using binary units.
pub fn encode_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    // One decimal at most, none when the value is whole (1.5 KiB, 2 MiB)
    let rounded = (size * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0} {}", UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}

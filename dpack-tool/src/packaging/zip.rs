use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Compressor, FileEntry};

/// Writes the planned entries into a zip archive at `output`.
///
/// The destination is truncated, every entry uses the same compression
/// method, and the central directory is finalized before returning. Errors
/// abort the write; the partial file is left for the caller to deal with.
pub fn write_zip(output: &Path, entries: &[FileEntry], compressor: Compressor) -> Result<()> {
    let method = match compressor {
        Compressor::Deflate => CompressionMethod::Deflated,
        Compressor::Stored => CompressionMethod::Stored,
    };
    let options = FileOptions::default()
        .compression_method(method)
        .unix_permissions(0o644);

    let out = File::create(output)
        .with_context(|| format!("creating archive {}", output.display()))?;
    let mut archive = ZipWriter::new(out);

    for entry in entries {
        archive
            .start_file(entry.name_in_archive.as_str(), options)
            .with_context(|| format!("starting entry {}", entry.name_in_archive))?;
        let mut src = File::open(&entry.path)
            .with_context(|| format!("reading {}", entry.path.display()))?;
        io::copy(&mut src, &mut archive)
            .with_context(|| format!("writing entry {}", entry.name_in_archive))?;
    }

    archive.finish().context("finalizing archive")?;
    Ok(())
}

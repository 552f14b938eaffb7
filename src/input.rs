//! Input discovery and reading.
//!
//! Inputs are UTF-8 text files, optionally gzip-compressed (`.gz`). A
//! directory argument is walked recursively and filtered by the
//! `[ingest] include_globs` patterns; `.git`, `target`, and `node_modules`
//! are always skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ragline_core::chunk::Chunker;
use ragline_core::models::Chunk;
use walkdir::WalkDir;

/// Open `path` as a buffered line reader, decompressing `.gz` files.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open input: {}", path.display()))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Chunk a whole file. Read and decode errors abort with the file name.
pub fn read_chunks(path: &Path, chunker: &Chunker) -> Result<Vec<Chunk>> {
    let reader = open_text(path)?;
    let mut chunks = Vec::new();
    for chunk in chunker.chunks(reader) {
        chunks.push(chunk.with_context(|| format!("Failed to read {}", path.display()))?);
    }
    tracing::debug!(path = %path.display(), chunks = chunks.len(), "chunked input");
    Ok(chunks)
}

/// Expand `path` into the list of files to ingest.
///
/// A file is returned as-is regardless of the include patterns. A
/// directory is walked and filtered. Results are sorted so id assignment
/// is stable between runs.
pub fn discover_inputs(path: &Path, include_globs: &[String]) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Input does not exist: {}", path.display());
    }

    let include_set = build_globset(include_globs)?;
    let exclude_set = build_globset(&[
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ])?;

    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(path).unwrap_or(entry.path());
        let rel_str = relative.to_string_lossy().to_string();
        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        files.push(entry.into_path());
    }
    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

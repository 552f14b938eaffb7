//! `ragline chunk` and `ragline ingest`.
//!
//! Ingestion walks every input path, chunks each file, and feeds the
//! chunks through an [`IngestionPipeline`](ragline_core::ingest::IngestionPipeline).
//! Sequential ids continue across files so that a multi-file run assigns
//! the same ids as ingesting the concatenated chunk list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ragline_core::ingest::{FailurePolicy, IdStrategy, IngestReport};

use crate::input::{discover_inputs, read_chunks};
use crate::services::Services;

/// Flags of `ragline ingest`.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub start_id: u64,
    pub batch_size: Option<usize>,
    pub max_chars: Option<usize>,
    pub content_ids: bool,
    pub skip_failed: bool,
}

/// Totals across all files of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files: usize,
    pub chunks: usize,
    pub batches: usize,
    pub upserted: usize,
    pub skipped: usize,
    /// First sequential id not used by this run.
    pub next_id: u64,
}

impl IngestSummary {
    fn add(&mut self, chunks: usize, report: &IngestReport) {
        self.files += 1;
        self.chunks += chunks;
        self.batches += report.batches;
        self.upserted += report.upserted;
        self.skipped += report.skipped;
    }
}

pub fn run_ingest(
    services: &Services,
    paths: &[PathBuf],
    opts: &IngestOptions,
) -> Result<IngestSummary> {
    let config = services.config();
    let chunker = services.chunker(opts.max_chars);
    let policy = if opts.skip_failed {
        FailurePolicy::SkipBatch
    } else {
        FailurePolicy::FailFast
    };
    let pipeline = services.ingestion(opts.batch_size, policy);

    let mut files = Vec::new();
    for path in paths {
        files.extend(discover_inputs(path, &config.ingest.include_globs)?);
    }
    if files.is_empty() {
        println!("No input files found.");
        return Ok(IngestSummary {
            next_id: opts.start_id,
            ..Default::default()
        });
    }

    pipeline
        .ensure_collection(config.store.vector_size, config.store.distance)
        .with_context(|| format!("Failed to prepare collection '{}'", pipeline.collection()))?;

    let mut summary = IngestSummary {
        next_id: opts.start_id,
        ..Default::default()
    };
    for file in &files {
        let chunks = read_chunks(file, &chunker)?;
        let ids = if opts.content_ids {
            IdStrategy::ContentHash
        } else {
            IdStrategy::Sequential {
                start: summary.next_id,
            }
        };
        let report = pipeline
            .ingest_with(&chunks, &ids)
            .with_context(|| format!("Failed to ingest {}", file.display()))?;
        tracing::info!(
            file = %file.display(),
            chunks = chunks.len(),
            upserted = report.upserted,
            skipped = report.skipped,
            "ingested file"
        );
        summary.next_id = summary.next_id.saturating_add(chunks.len() as u64);
        summary.add(chunks.len(), &report);
    }

    println!("ingest {}", pipeline.collection());
    println!("  files: {}", summary.files);
    println!("  chunks: {}", summary.chunks);
    println!("  batches: {}", summary.batches);
    println!("  upserted: {}", summary.upserted);
    if summary.skipped > 0 {
        println!("  skipped: {}", summary.skipped);
    }
    if !opts.content_ids {
        println!("  next id: {}", summary.next_id);
    }
    println!("ok");
    Ok(summary)
}

/// Print the chunks of one file without touching any service.
pub fn run_chunk(services: &Services, path: &Path, max_chars: Option<usize>) -> Result<usize> {
    let chunker = services.chunker(max_chars);
    let chunks = read_chunks(path, &chunker)?;
    for (i, chunk) in chunks.iter().enumerate() {
        println!("[{}] ({} chars) {}", i, chunk.char_len(), chunk);
    }
    println!("{} chunks (max_chars = {})", chunks.len(), chunker.max_chars());
    Ok(chunks.len())
}

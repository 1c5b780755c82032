//! Tabular (CSV) chunking.
//!
//! Reads rows, chunks the text in one content column and writes one
//! output row per chunk. Each output row keeps every original column,
//! with the content column replaced by the chunk text, followed by the
//! chunk fields:
//!
//! | Mode | Appended columns |
//! |------|------------------|
//! | `window` | `token_count`, `chunk_index`, `chunk_token_count` |
//! | `structure` | `token_count`, `chunk_index`, `chunk_token_count`, `chunk_id`, `parent_id`, `title`, `level` |
//!
//! `token_count` is the size of the whole source cell and repeats on every
//! chunk of that row. `chunk_index` is `chunk_<n>`, counted from 1 within
//! each input row. Rows whose content cell is empty or whitespace produce
//! no output.

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use mdchunk_core::{Tokenizer, WindowChunker};
use std::io::{Read, Write};
use std::path::Path;

use crate::ingest::StructurePlan;

const WINDOW_COLUMNS: &[&str] = &["token_count", "chunk_index", "chunk_token_count"];
const STRUCTURE_COLUMNS: &[&str] = &[
    "token_count",
    "chunk_index",
    "chunk_token_count",
    "chunk_id",
    "parent_id",
    "title",
    "level",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RecordMode {
    /// Overlapping token windows.
    #[default]
    Window,
    /// Heading sections.
    Structure,
}

/// The chunker applied to each content cell.
pub enum RecordChunker<'a> {
    Window(&'a WindowChunker<'a>),
    Structure {
        plan: &'a StructurePlan,
        counter: &'a dyn Tokenizer,
    },
}

struct ChunkRow {
    text: String,
    token_count: usize,
    extra: Vec<String>,
}

impl RecordChunker<'_> {
    fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordChunker::Window(_) => WINDOW_COLUMNS,
            RecordChunker::Structure { .. } => STRUCTURE_COLUMNS,
        }
    }

    /// Tokens in a whole content cell.
    fn count_tokens(&self, text: &str) -> usize {
        match self {
            RecordChunker::Window(chunker) => chunker.tokenizer().count_tokens(text),
            RecordChunker::Structure { counter, .. } => counter.count_tokens(text),
        }
    }

    fn rows(&self, text: &str) -> Result<Vec<ChunkRow>> {
        match self {
            RecordChunker::Window(chunker) => Ok(chunker
                .split(text)?
                .into_iter()
                .map(|w| ChunkRow {
                    token_count: w.token_count,
                    text: w.text,
                    extra: Vec::new(),
                })
                .collect()),
            RecordChunker::Structure { plan, counter } => Ok(plan
                .chunk_text(text)?
                .into_iter()
                .map(|c| ChunkRow {
                    token_count: counter.count_tokens(&c.content),
                    extra: vec![
                        c.id,
                        c.parent_id.unwrap_or_default(),
                        c.title,
                        c.level.to_string(),
                    ],
                    text: c.content,
                })
                .collect()),
        }
    }
}

/// Counts reported after a records run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordsSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub chunks_written: usize,
}

/// Chunk `column` of every row read from `reader`, writing CSV to `writer`.
pub fn process_records<R: Read, W: Write>(
    reader: R,
    writer: W,
    column: &str,
    chunker: &RecordChunker,
) -> Result<RecordsSummary> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let column_index = headers.iter().position(|h| h == column).ok_or_else(|| {
        anyhow!(
            "content column '{}' not found (available: {})",
            column,
            headers.iter().collect::<Vec<_>>().join(", ")
        )
    })?;

    let mut wtr = csv::Writer::from_writer(writer);
    let mut out_headers: Vec<&str> = headers.iter().collect();
    out_headers.extend_from_slice(chunker.columns());
    wtr.write_record(&out_headers)?;

    let mut summary = RecordsSummary::default();
    for (row_no, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", row_no + 1))?;
        summary.rows_read += 1;

        let content = record.get(column_index).unwrap_or_default();
        if content.trim().is_empty() {
            summary.rows_skipped += 1;
            continue;
        }

        let rows = chunker
            .rows(content)
            .with_context(|| format!("Failed to chunk CSV row {}", row_no + 1))?;
        let cell_tokens = chunker.count_tokens(content).to_string();
        for (i, row) in rows.iter().enumerate() {
            let chunk_index = format!("chunk_{}", i + 1);
            let token_count = row.token_count.to_string();

            let mut fields: Vec<&str> = record
                .iter()
                .enumerate()
                .map(|(idx, field)| if idx == column_index { row.text.as_str() } else { field })
                .collect();
            fields.push(&cell_tokens);
            fields.push(&chunk_index);
            fields.push(&token_count);
            fields.extend(row.extra.iter().map(String::as_str));
            wtr.write_record(&fields)?;
            summary.chunks_written += 1;
        }
    }
    wtr.flush()?;

    tracing::info!(
        rows = summary.rows_read,
        skipped = summary.rows_skipped,
        chunks = summary.chunks_written,
        "records processed"
    );
    Ok(summary)
}

/// File-to-file wrapper around [`process_records`].
pub fn run_records(
    input: &Path,
    output: &Path,
    column: &str,
    chunker: &RecordChunker,
) -> Result<RecordsSummary> {
    let reader = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = std::fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    process_records(reader, writer, column, chunker)
        .with_context(|| format!("Failed to process {}", input.display()))
}

//! JSON and JSONL output of chunk records.
//!
//! Every record is flattened with the path of the document it came from,
//! so JSONL output can be concatenated across runs and still be traced
//! back to its source. JSONL writes one record per line; JSON writes a
//! single pretty-printed array.

use anyhow::{Context, Result};
use clap::ValueEnum;
use mdchunk_core::{Chunk, TokenWindow};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ingest::{DocumentChunks, DocumentWindows};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
    /// A single pretty-printed JSON array.
    Json,
}

#[derive(Serialize)]
struct ChunkRecord<'a> {
    source: &'a str,
    #[serde(flatten)]
    chunk: &'a Chunk,
}

#[derive(Serialize)]
struct WindowRecord<'a> {
    source: &'a str,
    #[serde(flatten)]
    window: &'a TokenWindow,
}

/// Open `output`, or stdout when `None`.
pub fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout().lock()))),
    }
}

pub fn write_chunks(docs: &[DocumentChunks], format: OutputFormat, out: &mut dyn Write) -> Result<usize> {
    let records: Vec<ChunkRecord> = docs
        .iter()
        .flat_map(|doc| {
            doc.chunks.iter().map(move |chunk| ChunkRecord {
                source: &doc.source,
                chunk,
            })
        })
        .collect();
    write_records(&records, format, out)?;
    Ok(records.len())
}

pub fn write_windows(docs: &[DocumentWindows], format: OutputFormat, out: &mut dyn Write) -> Result<usize> {
    let records: Vec<WindowRecord> = docs
        .iter()
        .flat_map(|doc| {
            doc.windows.iter().map(move |window| WindowRecord {
                source: &doc.source,
                window,
            })
        })
        .collect();
    write_records(&records, format, out)?;
    Ok(records.len())
}

fn write_records<T: Serialize>(records: &[T], format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Jsonl => {
            for record in records {
                serde_json::to_writer(&mut *out, record)?;
                out.write_all(b"\n")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, records)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;
    Ok(())
}

//! Chunking summary.
//!
//! Gives a quick read on what a structural run produced: document and
//! chunk counts, token totals under the configured tokenizer, and how
//! much code, link and table metadata was found. Used by `mdchunk stats`.

use anyhow::Result;
use mdchunk_core::Tokenizer;
use std::io::Write;

use crate::ingest::DocumentChunks;
use crate::sources::SourceDocument;

/// Aggregate counts over a set of chunked documents.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChunkStats {
    pub documents: usize,
    pub input_bytes: u64,
    pub chunks: usize,
    pub total_tokens: usize,
    pub max_tokens: usize,
    pub code_blocks: usize,
    pub links: usize,
    pub tables: usize,
    pub max_depth: u8,
    pub per_document: Vec<DocumentStats>,
}

/// Per-document row of the breakdown table.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    pub source: String,
    pub chunks: usize,
    pub tokens: usize,
}

impl ChunkStats {
    pub fn collect(docs: &[SourceDocument], results: &[DocumentChunks], tokenizer: &dyn Tokenizer) -> Self {
        let mut stats = ChunkStats {
            documents: results.len(),
            input_bytes: docs.iter().map(SourceDocument::byte_len).sum(),
            ..Default::default()
        };

        for doc in results {
            let mut doc_tokens = 0;
            for chunk in &doc.chunks {
                let tokens = tokenizer.count_tokens(&chunk.content);
                doc_tokens += tokens;
                stats.max_tokens = stats.max_tokens.max(tokens);
                stats.code_blocks += chunk.code_blocks.len();
                stats.links += chunk.links.len();
                stats.tables += chunk.tables.len();
                stats.max_depth = stats.max_depth.max(chunk.level);
            }
            stats.chunks += doc.chunks.len();
            stats.total_tokens += doc_tokens;
            stats.per_document.push(DocumentStats {
                source: doc.source.clone(),
                chunks: doc.chunks.len(),
                tokens: doc_tokens,
            });
        }

        stats
    }

    pub fn average_tokens(&self) -> f64 {
        if self.chunks == 0 {
            0.0
        } else {
            self.total_tokens as f64 / self.chunks as f64
        }
    }
}

/// Print the summary in the fixed-width layout used by `mdchunk stats`.
pub fn print_stats(stats: &ChunkStats, tokenizer: &str, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "mdchunk chunk stats")?;
    writeln!(out, "===================")?;
    writeln!(out)?;
    writeln!(out, "  Documents:   {}", stats.documents)?;
    writeln!(out, "  Input size:  {}", format_bytes(stats.input_bytes))?;
    writeln!(out, "  Chunks:      {}", stats.chunks)?;
    writeln!(out, "  Tokenizer:   {}", tokenizer)?;
    writeln!(out, "  Tokens:      {}", stats.total_tokens)?;
    writeln!(out, "  Avg tokens:  {:.1}", stats.average_tokens())?;
    writeln!(out, "  Max tokens:  {}", stats.max_tokens)?;
    writeln!(out, "  Max depth:   {}", stats.max_depth)?;
    writeln!(out)?;
    writeln!(out, "  Code blocks: {}", stats.code_blocks)?;
    writeln!(out, "  Links:       {}", stats.links)?;
    writeln!(out, "  Tables:      {}", stats.tables)?;

    if !stats.per_document.is_empty() {
        writeln!(out)?;
        writeln!(out, "  By document:")?;
        writeln!(out, "  {:<48} {:>8} {:>10}", "SOURCE", "CHUNKS", "TOKENS")?;
        writeln!(out, "  {}", "-".repeat(68))?;
        for doc in &stats.per_document {
            writeln!(out, "  {:<48} {:>8} {:>10}", doc.source, doc.chunks, doc.tokens)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdchunk_core::{chunk_document, CharTokenizer};
    use std::path::PathBuf;

    const DOC: &str = "# Guide\nSee [a](https://a.example).\n\n```sh\nmake\n```\n## Table\n| a | b |\n|---|---|\n| 1 | 2 |\n";

    fn stats() -> ChunkStats {
        let docs = vec![SourceDocument::new("guide.md", PathBuf::from("guide.md"), DOC.to_string())];
        let results = vec![DocumentChunks {
            source: "guide.md".to_string(),
            content_hash: docs[0].content_hash.clone(),
            chunks: chunk_document(DOC).unwrap(),
        }];
        ChunkStats::collect(&docs, &results, &CharTokenizer)
    }

    #[test]
    fn test_collect_counts() {
        let stats = stats();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.total_tokens, DOC.chars().count());
        assert_eq!(stats.code_blocks, 1);
        assert_eq!(stats.links, 1);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.input_bytes, DOC.len() as u64);
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(ChunkStats::default().average_tokens(), 0.0);
    }

    #[test]
    fn test_print_layout() {
        let mut out = Vec::new();
        print_stats(&stats(), "chars", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Documents:   1"));
        assert!(text.contains("Chunks:      2"));
        assert!(text.contains("Tables:      1"));
        assert!(text.contains("guide.md"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}

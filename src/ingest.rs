//! Chunking pipeline.
//!
//! Turns loaded [`SourceDocument`]s into chunk or window records.
//! Documents are independent, so each is chunked on the rayon pool with
//! its own call state; results come back in input order.
//!
//! A placeholder collision is retried here with a salted protector, up to
//! [`MAX_SALT_RETRIES`] times, before the document is reported as failed.

use anyhow::{Context, Result};
use mdchunk_core::{Chunk, ChunkError, StructuralChunker, TokenWindow, Tokenizer, WindowChunker};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, StructureConfig};
use crate::sources::SourceDocument;
use crate::tokenizer::tokenizer_for_unit;

/// Salted attempts after a placeholder collision.
pub const MAX_SALT_RETRIES: u64 = 3;

/// Structural chunks of one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentChunks {
    pub source: String,
    pub content_hash: String,
    pub chunks: Vec<Chunk>,
}

/// Token windows of one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentWindows {
    pub source: String,
    pub content_hash: String,
    pub windows: Vec<TokenWindow>,
}

/// Builds structural chunkers from `[structure]` settings.
///
/// Kept separate from a single chunker so a fresh salt can be applied on
/// retry.
#[derive(Clone)]
pub struct StructurePlan {
    settings: StructureConfig,
    tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl StructurePlan {
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = config.structure.clone();
        let tokenizer = match settings.max_size {
            Some(_) => Some(tokenizer_for_unit(settings.unit, config.tokenizer.kind)?),
            None => None,
        };
        let plan = Self {
            settings,
            tokenizer,
        };
        plan.chunker(0)?;
        Ok(plan)
    }

    pub fn chunker(&self, salt: u64) -> Result<StructuralChunker> {
        let mut builder = StructuralChunker::builder()
            .protect_code_blocks(self.settings.protect_code_blocks)
            .protect_tables(self.settings.protect_tables)
            .salt(salt);
        if let Some(max_size) = self.settings.max_size {
            builder = builder.max_size(self.settings.unit, max_size);
        }
        if let Some(tokenizer) = &self.tokenizer {
            builder = builder.tokenizer(Arc::clone(tokenizer));
        }
        builder.build().context("invalid [structure] settings")
    }

    /// Chunk one document, retrying with a new salt on collision.
    pub fn chunk_text(&self, text: &str) -> Result<Vec<Chunk>> {
        let mut salt = 0;
        loop {
            match self.chunker(salt)?.chunk_document(text) {
                Ok(chunks) => return Ok(chunks),
                Err(ChunkError::PlaceholderCollision { placeholder }) if salt < MAX_SALT_RETRIES => {
                    tracing::warn!(%placeholder, salt, "placeholder collision, retrying with new salt");
                    salt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Structural chunking of every document, in input order.
pub fn chunk_structure(docs: &[SourceDocument], plan: &StructurePlan) -> Result<Vec<DocumentChunks>> {
    let results = docs
        .par_iter()
        .map(|doc| -> Result<DocumentChunks> {
            let chunks = plan
                .chunk_text(&doc.text)
                .with_context(|| format!("Failed to chunk {}", doc.source))?;
            tracing::debug!(source = %doc.source, chunks = chunks.len(), "structured");
            Ok(DocumentChunks {
                source: doc.source.clone(),
                content_hash: doc.content_hash.clone(),
                chunks,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        documents = results.len(),
        chunks = results.iter().map(|d| d.chunks.len()).sum::<usize>(),
        "structural chunking complete"
    );
    Ok(results)
}

/// Token windows of every document, in input order.
pub fn chunk_windows(docs: &[SourceDocument], chunker: &WindowChunker) -> Result<Vec<DocumentWindows>> {
    let results = docs
        .par_iter()
        .map(|doc| -> Result<DocumentWindows> {
            let windows = chunker
                .split(&doc.text)
                .with_context(|| format!("Failed to window {}", doc.source))?;
            tracing::debug!(source = %doc.source, windows = windows.len(), "windowed");
            Ok(DocumentWindows {
                source: doc.source.clone(),
                content_hash: doc.content_hash.clone(),
                windows,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        documents = results.len(),
        windows = results.iter().map(|d| d.windows.len()).sum::<usize>(),
        target_size = chunker.target_size(),
        overlap = chunker.overlap(),
        "window chunking complete"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdchunk_core::CharTokenizer;
    use std::path::PathBuf;

    fn doc(name: &str, text: &str) -> SourceDocument {
        SourceDocument::new(name, PathBuf::from(name), text.to_string())
    }

    fn docs() -> Vec<SourceDocument> {
        (0..16)
            .map(|i| doc(&format!("doc{i:02}.md"), &format!("# Doc {i}\n\nBody {i}.\n\n## Sub\n\nMore.\n")))
            .collect()
    }

    #[test]
    fn test_structure_preserves_input_order() {
        let plan = StructurePlan::from_config(&Config::default()).unwrap();
        let results = chunk_structure(&docs(), &plan).unwrap();
        assert_eq!(results.len(), 16);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.source, format!("doc{i:02}.md"));
            assert_eq!(result.chunks.len(), 2);
            assert_eq!(result.chunks[0].title, format!("Doc {i}"));
            assert_eq!(result.chunks[1].parent_id.as_deref(), Some(result.chunks[0].id.as_str()));
        }
    }

    #[test]
    fn test_structure_plan_applies_budget() {
        let mut config = Config::default();
        config.structure.max_size = Some(12);
        let plan = StructurePlan::from_config(&config).unwrap();
        let chunks = plan
            .chunk_text("# Title\n\nfirst paragraph\n\nsecond paragraph\n")
            .unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.title == "Title"));
        assert_eq!(
            chunks.iter().map(|c| c.content.as_str()).collect::<String>(),
            "# Title\n\nfirst paragraph\n\nsecond paragraph\n"
        );
    }

    #[test]
    fn test_structure_plan_protection_toggles() {
        let mut config = Config::default();
        config.structure.protect_code_blocks = false;
        let plan = StructurePlan::from_config(&config).unwrap();
        let chunks = plan.chunk_text("# A\n```\n# exposed heading\n```\n").unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_windows_per_document() {
        let tokenizer = CharTokenizer;
        let chunker = WindowChunker::new(&tokenizer, 8, 2).unwrap();
        let results = chunk_windows(&[doc("a.md", "abcdefghijklmnop"), doc("b.md", "")], &chunker).unwrap();
        assert_eq!(results[0].windows.len(), 3);
        assert_eq!(results[0].windows[0].text, "abcdefgh");
        assert!(results[1].windows.is_empty());
    }
}

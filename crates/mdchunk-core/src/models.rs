//! Output records produced by the two chunkers.
//!
//! Both record kinds are plain immutable values: they are created by a
//! single chunking call and never mutated afterwards. Field names are
//! stable so records can be serialized by the application layer.

use serde::{Deserialize, Serialize};

/// Title given to content that precedes the first heading.
pub const INTRODUCTION_TITLE: &str = "Introduction";

/// One heading-delimited section of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the output sequence, starting at 0.
    pub index: usize,
    /// Stable content-derived identifier (see [`crate::identity`]).
    pub id: String,
    /// Id of the nearest enclosing shallower heading, if any.
    pub parent_id: Option<String>,
    /// Heading text, or [`INTRODUCTION_TITLE`] for pre-heading content.
    pub title: String,
    /// Heading depth 1–6; `0` for content before the first heading.
    pub level: u8,
    /// Part number when an oversized section was split; `0` otherwise.
    pub part: usize,
    /// Raw section text with protected blocks restored.
    pub content: String,
    /// Number of Unicode scalar values in `content`.
    pub char_count: usize,
    /// Fenced code blocks found in `content`, in order.
    pub code_blocks: Vec<CodeBlock>,
    /// Inline Markdown links found in `content`, in order.
    pub links: Vec<Link>,
    /// Raw text of each table block found in `content`, in order.
    pub tables: Vec<String>,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// First word of the fence info string; empty when unspecified.
    pub language: String,
    /// Lines between the opening and closing fence.
    pub content: String,
}

/// An inline `[text](url)` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// One fixed-size slice of a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWindow {
    /// First token index (inclusive).
    pub start_index: usize,
    /// Last token index (exclusive).
    pub end_index: usize,
    /// Decoded text for `start_index..end_index`.
    pub text: String,
    /// `end_index - start_index`.
    pub token_count: usize,
}

impl Chunk {
    /// True for content that precedes the first heading.
    pub fn is_introduction(&self) -> bool {
        self.level == 0
    }
}

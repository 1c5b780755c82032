//! Reversible masking of atomic Markdown blocks.
//!
//! Fenced code blocks and pipe tables must never be cut by a chunk
//! boundary, and a `# comment` inside a code fence must never be taken
//! for a heading. Before structural analysis every such block is
//! replaced by an opaque single-line placeholder; after splitting, the
//! placeholders are substituted back.
//!
//! # Placeholders
//!
//! A placeholder is the block kind plus a truncated SHA-256 digest of the
//! block text (and an optional salt), wrapped in Unicode private-use
//! delimiters:
//!
//! ```text
//! U+E000 "mdchunk:code:" <32 hex chars> U+E001
//! ```
//!
//! It contains no `#`, no backtick and no pipe, so it is inert for heading,
//! fence and table detection. Identical blocks share a placeholder.
//! Before use each placeholder is checked against the document text and
//! against placeholders already issued; a clash is reported as
//! [`ChunkError::PlaceholderCollision`] and the caller may retry with
//! [`BlockProtector::with_salt`].
//!
//! # Detection
//!
//! - **Code fence**: a line starting (after indentation) with three
//!   backticks and an optional info string, closed by the next line made
//!   only of backticks (three or more). The first open/close pair wins;
//!   fences do not nest. An unterminated fence is left unprotected.
//! - **Table**: a pipe-delimited header row, a separator row of
//!   dashes/colons, then one or more pipe-delimited rows. The whole
//!   contiguous run is one block.
//!
//! A block's range covers its lines but not the final line terminator, so
//! the placeholder always sits on its own line.

use std::collections::HashMap;
use std::ops::Range;

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::error::{ChunkError, Result};

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';
const PLACEHOLDER_TAG: &str = "mdchunk";
/// Digest bytes kept in a placeholder (hex-encoded to twice as many chars).
const PLACEHOLDER_DIGEST_BYTES: usize = 16;

/// Kind of atomic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Code,
    Table,
}

impl BlockKind {
    fn label(self) -> &'static str {
        match self {
            BlockKind::Code => "code",
            BlockKind::Table => "table",
        }
    }
}

/// Which block kinds to protect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectOptions {
    pub code_blocks: bool,
    pub tables: bool,
}

impl Default for ProtectOptions {
    fn default() -> Self {
        Self {
            code_blocks: true,
            tables: true,
        }
    }
}

/// A block located in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    pub kind: BlockKind,
    /// Byte range of the block, excluding its final line terminator.
    pub range: Range<usize>,
}

/// One line of a text, without its terminator.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    body: &'a str,
}

impl Line<'_> {
    fn end(&self) -> usize {
        self.start + self.body.len()
    }
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for piece in text.split_inclusive('\n') {
        let body = match piece.strip_suffix('\n') {
            Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
            None => piece,
        };
        lines.push(Line {
            start: offset,
            body,
        });
        offset += piece.len();
    }
    lines
}

/// Opening fence: returns the info string (possibly empty).
pub(crate) fn fence_open(line: &str) -> Option<&str> {
    let info = line.trim_start().strip_prefix("```")?;
    let info = info.trim_start_matches('`').trim();
    if info.contains('`') {
        return None;
    }
    Some(info)
}

pub(crate) fn is_fence_close(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '`')
}

pub(crate) fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

pub(crate) fn is_table_separator(line: &str) -> bool {
    if !is_table_row(line) {
        return false;
    }
    let trimmed = line.trim();
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut cells = 0;
    for cell in inner.split('|') {
        let cell = cell.trim();
        if cell.is_empty() || !cell.contains('-') || !cell.chars().all(|c| c == '-' || c == ':') {
            return false;
        }
        cells += 1;
    }
    cells > 0
}

/// Locate code fences and tables in document order.
///
/// Fences are always recognised so that a table-looking run inside a
/// fence is not reported as a table, but they are only returned when
/// `options.code_blocks` is set.
pub fn find_blocks(text: &str, options: ProtectOptions) -> Vec<BlockSpan> {
    let lines = split_lines(text);
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].body;

        if fence_open(line).is_some() {
            match (i + 1..lines.len()).find(|&j| is_fence_close(lines[j].body)) {
                Some(close) => {
                    if options.code_blocks {
                        blocks.push(BlockSpan {
                            kind: BlockKind::Code,
                            range: lines[i].start..lines[close].end(),
                        });
                    }
                    i = close + 1;
                }
                None => {
                    debug!(line = i + 1, "unterminated code fence left unprotected");
                    i += 1;
                }
            }
            continue;
        }

        if options.tables
            && is_table_row(line)
            && i + 2 < lines.len()
            && is_table_separator(lines[i + 1].body)
            && is_table_row(lines[i + 2].body)
        {
            let mut last = i + 2;
            while last + 1 < lines.len() && is_table_row(lines[last + 1].body) {
                last += 1;
            }
            blocks.push(BlockSpan {
                kind: BlockKind::Table,
                range: lines[i].start..lines[last].end(),
            });
            i = last + 1;
            continue;
        }

        i += 1;
    }

    blocks
}

/// An original block kept aside while its placeholder stands in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedBlock {
    pub kind: BlockKind,
    pub text: String,
}

/// Placeholder → original block text, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMap {
    entries: Vec<(String, ProtectedBlock)>,
    index: HashMap<String, usize>,
}

impl BlockMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, placeholder: &str) -> Option<&ProtectedBlock> {
        self.index.get(placeholder).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProtectedBlock)> {
        self.entries.iter().map(|(p, b)| (p.as_str(), b))
    }

    /// Record a placeholder; identical blocks may share one, different
    /// blocks may not.
    fn insert(&mut self, placeholder: String, block: ProtectedBlock) -> Result<()> {
        if let Some(&i) = self.index.get(&placeholder) {
            if self.entries[i].1 != block {
                return Err(ChunkError::PlaceholderCollision { placeholder });
            }
            return Ok(());
        }
        self.index.insert(placeholder.clone(), self.entries.len());
        self.entries.push((placeholder, block));
        Ok(())
    }

    /// Substitute every placeholder in `masked` back to its block text.
    ///
    /// Text without placeholders is returned unchanged, so restoring twice
    /// is a no-op.
    pub fn restore(&self, masked: &str) -> String {
        if self.entries.is_empty() || !masked.contains(PLACEHOLDER_OPEN) {
            return masked.to_string();
        }
        let mut out = masked.to_string();
        for (placeholder, block) in &self.entries {
            if out.contains(placeholder.as_str()) {
                out = out.replace(placeholder.as_str(), &block.text);
            }
        }
        out
    }
}

/// Masks and restores atomic blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockProtector {
    options: ProtectOptions,
    salt: u64,
}

impl BlockProtector {
    pub fn new(options: ProtectOptions) -> Self {
        Self { options, salt: 0 }
    }

    /// Mix `salt` into every placeholder digest.
    pub fn with_salt(mut self, salt: u64) -> Self {
        self.salt = salt;
        self
    }

    pub fn options(&self) -> ProtectOptions {
        self.options
    }

    fn placeholder(&self, kind: BlockKind, block: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.to_le_bytes());
        hasher.update(kind.label().as_bytes());
        hasher.update(block.as_bytes());
        let digest = hasher.finalize();
        format!(
            "{PLACEHOLDER_OPEN}{PLACEHOLDER_TAG}:{}:{}{PLACEHOLDER_CLOSE}",
            kind.label(),
            hex::encode(&digest[..PLACEHOLDER_DIGEST_BYTES])
        )
    }

    /// Replace every protected block with its placeholder.
    pub fn mask(&self, text: &str) -> Result<(String, BlockMap)> {
        let blocks = find_blocks(text, self.options);
        let mut map = BlockMap::default();
        if blocks.is_empty() {
            return Ok((text.to_string(), map));
        }

        let mut masked = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in &blocks {
            let original = &text[span.range.clone()];
            let placeholder = self.placeholder(span.kind, original);
            if text.contains(placeholder.as_str()) {
                return Err(ChunkError::PlaceholderCollision { placeholder });
            }
            masked.push_str(&text[cursor..span.range.start]);
            masked.push_str(&placeholder);
            cursor = span.range.end;
            map.insert(
                placeholder,
                ProtectedBlock {
                    kind: span.kind,
                    text: original.to_string(),
                },
            )?;
        }
        masked.push_str(&text[cursor..]);

        trace!(blocks = blocks.len(), unique = map.len(), "masked atomic blocks");
        Ok((masked, map))
    }

    /// Inverse of [`mask`](Self::mask).
    pub fn restore(&self, masked: &str, map: &BlockMap) -> String {
        map.restore(masked)
    }
}

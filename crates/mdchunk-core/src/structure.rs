//! Heading-structured chunking of Markdown documents.
//!
//! Splits a document at ATX headings (`#` … `######`) into one [`Chunk`]
//! per section and links every section to its enclosing heading, turning
//! the flat output into a navigable outline.
//!
//! # Algorithm
//!
//! 1. Mask fenced code and tables with the [`BlockProtector`], so a
//!    `# comment` inside a fence is never read as a heading and no block
//!    can be cut.
//! 2. Scan line by line. A heading line closes the current section and
//!    opens a new one at its level; text before the first heading forms a
//!    level-0 section titled [`INTRODUCTION_TITLE`].
//! 3. Resolve parents with a level stack local to the call: a level-`L`
//!    section's parent is the most recent id recorded at the deepest level
//!    below `L`. Its own id is then recorded at `L` and all deeper entries
//!    are cleared, since a new heading closes every subtree opened before
//!    it.
//! 4. Restore the blocks of each section, derive its id from the restored
//!    content and the parent id, and extract code blocks, links and tables
//!    from the restored text. A repeat of an earlier chunk with the same
//!    content and parent also mixes in its occurrence number.
//!
//! With a [`SizeBudget`], a section larger than the budget is split at
//! blank-line paragraph boundaries into consecutive parts that share the
//! section's title, level and parent. Masked blocks occupy a single line,
//! so a part boundary can never fall inside one; a paragraph or block that
//! alone exceeds the budget is emitted whole.
//!
//! Every section keeps its line terminators, so concatenating the
//! `content` of all chunks reproduces the input byte for byte.
//!
//! # Example
//!
//! ```rust
//! use mdchunk_core::structure::chunk_document;
//!
//! let chunks = chunk_document("# A\n## B\ntext\n# C\n").unwrap();
//! let titles: Vec<&str> = chunks.iter().map(|c| c.title.as_str()).collect();
//! assert_eq!(titles, ["A", "B", "C"]);
//! assert_eq!(chunks[1].parent_id.as_deref(), Some(chunks[0].id.as_str()));
//! assert_eq!(chunks[2].parent_id, None);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ChunkError, Result};
use crate::identity::{chunk_id, chunk_id_with_occurrence};
use crate::metadata::{extract_code_blocks, extract_links, extract_tables};
use crate::models::{Chunk, INTRODUCTION_TITLE};
use crate::protect::{BlockMap, BlockProtector, ProtectOptions};
use crate::tokenizer::{SizeUnit, Tokenizer};

/// Deepest heading level recognised.
pub const MAX_HEADING_LEVEL: usize = 6;

/// Parse an ATX heading line into `(level, title)`.
///
/// Requires 1–6 `#` at the start of the line, whitespace, then a non-empty
/// title. Seven or more `#`, a missing space, or an empty title make the
/// line plain text.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > MAX_HEADING_LEVEL {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some((hashes as u8, title))
}

/// Upper bound on the size of a structural chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBudget {
    pub unit: SizeUnit,
    pub max_size: usize,
}

/// A heading-delimited span of the masked text.
struct Section<'a> {
    level: u8,
    title: String,
    masked: &'a str,
}

fn split_sections(masked: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut level = 0u8;
    let mut title = INTRODUCTION_TITLE.to_string();
    let mut start = 0;
    let mut offset = 0;

    for line in masked.split_inclusive('\n') {
        if let Some((next_level, next_title)) = parse_heading(line) {
            if offset > start {
                sections.push(Section {
                    level,
                    title: std::mem::take(&mut title),
                    masked: &masked[start..offset],
                });
            }
            level = next_level;
            title = next_title.to_string();
            start = offset;
        }
        offset += line.len();
    }

    if start < masked.len() {
        sections.push(Section {
            level,
            title,
            masked: &masked[start..],
        });
    }

    sections
}

/// Byte offsets where a new paragraph starts: right after a blank line
/// that is followed by a non-blank line.
fn paragraph_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut offset = 0;
    let mut prev_blank = false;
    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        if prev_blank && !blank && offset > 0 {
            starts.push(offset);
        }
        prev_blank = blank;
        offset += line.len();
    }
    starts
}

/// Per-call level stack mapping heading level to the latest id seen there.
#[derive(Default)]
struct LevelStack {
    ids: [Option<String>; MAX_HEADING_LEVEL + 1],
}

impl LevelStack {
    fn parent_of(&self, level: u8) -> Option<String> {
        (1..level as usize).rev().find_map(|l| self.ids[l].clone())
    }

    fn record(&mut self, level: u8, id: String) {
        let level = level as usize;
        if level == 0 {
            return;
        }
        self.ids[level] = Some(id);
        for deeper in &mut self.ids[level + 1..] {
            *deeper = None;
        }
    }
}

/// Heading-aware chunker. Build with [`StructuralChunker::builder`].
#[derive(Clone, Default)]
pub struct StructuralChunker {
    protector: BlockProtector,
    budget: Option<SizeBudget>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl std::fmt::Debug for StructuralChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralChunker")
            .field("protector", &self.protector)
            .field("budget", &self.budget)
            .field("tokenizer", &self.tokenizer.as_ref().map(|t| t.name()))
            .finish()
    }
}

impl StructuralChunker {
    pub fn builder() -> StructuralChunkerBuilder {
        StructuralChunkerBuilder::default()
    }

    pub fn budget(&self) -> Option<SizeBudget> {
        self.budget
    }

    /// Chunk one document into heading sections, in document order.
    pub fn chunk_document(&self, text: &str) -> Result<Vec<Chunk>> {
        let (masked, blocks) = self.protector.mask(text)?;
        let sections = split_sections(&masked);

        let mut stack = LevelStack::default();
        let mut chunks = Vec::with_capacity(sections.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for section in &sections {
            let parent_id = section_parent(&stack, section.level);
            let parts = self.split_parts(section.masked, &blocks)?;

            let mut section_id = None;
            for (part, restored) in parts.into_iter().enumerate() {
                let base = chunk_id(&restored, parent_id.as_deref());
                let occurrence = seen.entry(base.clone()).or_default();
                let id = if *occurrence == 0 {
                    base
                } else {
                    chunk_id_with_occurrence(&restored, parent_id.as_deref(), *occurrence)
                };
                *occurrence += 1;
                section_id.get_or_insert_with(|| id.clone());
                chunks.push(Chunk {
                    index: chunks.len(),
                    id,
                    parent_id: parent_id.clone(),
                    title: section.title.clone(),
                    level: section.level,
                    part,
                    char_count: restored.chars().count(),
                    code_blocks: extract_code_blocks(&restored),
                    links: extract_links(&restored),
                    tables: extract_tables(&restored),
                    content: restored,
                });
            }

            if let Some(id) = section_id {
                stack.record(section.level, id);
            }
        }

        debug!(
            sections = sections.len(),
            chunks = chunks.len(),
            blocks = blocks.len(),
            "chunked document by headings"
        );
        Ok(chunks)
    }

    fn measure(&self, unit: SizeUnit, text: &str) -> Result<usize> {
        unit.measure(text, self.tokenizer.as_deref())
    }

    /// Restore a section, splitting it into budget-sized parts if needed.
    fn split_parts(&self, masked: &str, blocks: &BlockMap) -> Result<Vec<String>> {
        let restored = blocks.restore(masked);
        let Some(budget) = self.budget else {
            return Ok(vec![restored]);
        };
        if self.measure(budget.unit, &restored)? <= budget.max_size {
            return Ok(vec![restored]);
        }

        let mut ends = paragraph_starts(masked);
        ends.push(masked.len());

        let mut parts = Vec::new();
        let mut part_start = 0;
        let mut part_end = 0;
        for end in ends {
            if part_end > part_start {
                let extended = blocks.restore(&masked[part_start..end]);
                if self.measure(budget.unit, &extended)? > budget.max_size {
                    parts.push(blocks.restore(&masked[part_start..part_end]));
                    part_start = part_end;
                }
            }
            part_end = end;
        }
        parts.push(blocks.restore(&masked[part_start..]));
        Ok(parts)
    }
}

fn section_parent(stack: &LevelStack, level: u8) -> Option<String> {
    if level == 0 {
        None
    } else {
        stack.parent_of(level)
    }
}

/// Builder for [`StructuralChunker`].
#[derive(Default)]
pub struct StructuralChunkerBuilder {
    options: ProtectOptions,
    salt: u64,
    budget: Option<SizeBudget>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl StructuralChunkerBuilder {
    /// Keep fenced code blocks atomic. Default: true.
    pub fn protect_code_blocks(mut self, on: bool) -> Self {
        self.options.code_blocks = on;
        self
    }

    /// Keep pipe tables atomic. Default: true.
    pub fn protect_tables(mut self, on: bool) -> Self {
        self.options.tables = on;
        self
    }

    /// Salt for placeholder digests; change it to retry after a
    /// [`ChunkError::PlaceholderCollision`].
    pub fn salt(mut self, salt: u64) -> Self {
        self.salt = salt;
        self
    }

    /// Split sections larger than `max_size` (in `unit`) at paragraph
    /// boundaries.
    pub fn max_size(mut self, unit: SizeUnit, max_size: usize) -> Self {
        self.budget = Some(SizeBudget { unit, max_size });
        self
    }

    /// Tokenizer used to measure token budgets.
    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn build(self) -> Result<StructuralChunker> {
        if let Some(budget) = self.budget {
            if budget.max_size == 0 {
                return Err(ChunkError::Configuration(
                    "max_size must be > 0".to_string(),
                ));
            }
            if budget.unit == SizeUnit::Tokens && self.tokenizer.is_none() {
                return Err(ChunkError::Configuration(
                    "a token budget requires a tokenizer".to_string(),
                ));
            }
        }
        Ok(StructuralChunker {
            protector: BlockProtector::new(self.options).with_salt(self.salt),
            budget: self.budget,
            tokenizer: self.tokenizer,
        })
    }
}

/// Chunk a document with default settings (both block kinds protected,
/// no size budget).
pub fn chunk_document(text: &str) -> Result<Vec<Chunk>> {
    StructuralChunker::default().chunk_document(text)
}

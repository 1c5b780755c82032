//! Content-derived chunk identifiers.
//!
//! An id is the first [`CHUNK_ID_LEN`] hex characters of
//! `SHA-256(content ‖ 0x1F ‖ parent_id)`. Mixing in the parent keeps
//! identical sections under different headings apart; identical input
//! always yields the identical id, across runs and processes.
//!
//! Sibling sections with the same content and parent still hash alike.
//! The structural chunker numbers such repeats in document order and
//! derives their ids with [`chunk_id_with_occurrence`], so every id in a
//! document is unique.

use sha2::{Digest, Sha256};

/// Length of a chunk id in hex characters.
pub const CHUNK_ID_LEN: usize = 16;

/// Derive the id for a chunk with the given content and parent.
///
/// # Example
///
/// ```rust
/// use mdchunk_core::identity::{chunk_id, CHUNK_ID_LEN};
///
/// let a = chunk_id("## Setup\nRun it.\n", None);
/// assert_eq!(a.len(), CHUNK_ID_LEN);
/// assert_eq!(a, chunk_id("## Setup\nRun it.\n", None));
/// assert_ne!(a, chunk_id("## Setup\nRun it.\n", Some(&a)));
/// ```
pub fn chunk_id(content: &str, parent_id: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([0x1f_u8]);
    if let Some(parent) = parent_id {
        hasher.update(parent.as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..CHUNK_ID_LEN / 2])
}

/// Id of the `occurrence`-th chunk (zero-based) sharing `content` and
/// `parent_id` within one document. Occurrence 0 is [`chunk_id`].
pub fn chunk_id_with_occurrence(
    content: &str,
    parent_id: Option<&str>,
    occurrence: usize,
) -> String {
    if occurrence == 0 {
        return chunk_id(content, parent_id);
    }
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([0x1f_u8]);
    if let Some(parent) = parent_id {
        hasher.update(parent.as_bytes());
    }
    hasher.update([0x1f_u8]);
    hasher.update(occurrence.to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..CHUNK_ID_LEN / 2])
}

//! Fixed-size token windows with exact overlap.
//!
//! Splits a token stream into overlapping windows, ignoring document
//! structure entirely.
//!
//! # Algorithm
//!
//! 1. Encode the text into `N` tokens.
//! 2. Start a cursor at `0`.
//! 3. Emit `[start, min(start + target_size, N))`.
//! 4. Stop if the window reached `N`; otherwise move the cursor to
//!    `end - overlap` and repeat.
//!
//! Because `overlap < target_size` the cursor always advances, every
//! window holds at most `target_size` tokens, consecutive windows share
//! exactly `overlap` tokens, and the windows cover `[0, N)` without gaps.
//!
//! # Example
//!
//! ```rust
//! use mdchunk_core::tokenizer::CharTokenizer;
//! use mdchunk_core::window::split;
//!
//! let windows = split(&CharTokenizer, "abcdefghij", 4, 1).unwrap();
//! let texts: Vec<&str> = windows.iter().map(|w| w.text.as_str()).collect();
//! assert_eq!(texts, ["abcd", "defg", "ghij"]);
//! ```

use std::ops::Range;

use tracing::debug;

use crate::error::{ChunkError, Result};
use crate::models::TokenWindow;
use crate::tokenizer::Tokenizer;

/// Check `0 < overlap < target_size`.
pub fn validate(target_size: usize, overlap: usize) -> Result<()> {
    if target_size == 0 {
        return Err(ChunkError::Configuration(
            "target_size must be > 0".to_string(),
        ));
    }
    if overlap == 0 {
        return Err(ChunkError::Configuration(
            "overlap must be > 0".to_string(),
        ));
    }
    if overlap >= target_size {
        return Err(ChunkError::Configuration(format!(
            "overlap ({overlap}) must be smaller than target_size ({target_size})"
        )));
    }
    Ok(())
}

/// Compute the half-open token ranges for a stream of `n` tokens.
pub fn window_spans(n: usize, target_size: usize, overlap: usize) -> Result<Vec<Range<usize>>> {
    validate(target_size, overlap)?;

    let mut spans = Vec::with_capacity(window_count(n, target_size, overlap));
    let mut start = 0;
    while start < n {
        let end = (start + target_size).min(n);
        spans.push(start..end);
        if end == n {
            break;
        }
        start = end - overlap;
    }
    Ok(spans)
}

/// Number of windows produced for `n` tokens.
///
/// `ceil((n - overlap) / (target_size - overlap))` when `n > overlap`,
/// one window for `0 < n <= overlap`, none for `n == 0`. Assumes valid
/// parameters.
pub fn window_count(n: usize, target_size: usize, overlap: usize) -> usize {
    if n == 0 {
        return 0;
    }
    if n <= overlap || target_size <= overlap {
        return 1;
    }
    let step = target_size - overlap;
    (n - overlap).div_ceil(step)
}

/// Reusable window chunker bound to a tokenizer and validated parameters.
pub struct WindowChunker<'t> {
    tokenizer: &'t dyn Tokenizer,
    target_size: usize,
    overlap: usize,
}

impl<'t> WindowChunker<'t> {
    /// Validate parameters once; fails with [`ChunkError::Configuration`].
    pub fn new(tokenizer: &'t dyn Tokenizer, target_size: usize, overlap: usize) -> Result<Self> {
        validate(target_size, overlap)?;
        Ok(Self {
            tokenizer,
            target_size,
            overlap,
        })
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn tokenizer(&self) -> &'t dyn Tokenizer {
        self.tokenizer
    }

    /// Split `text` into windows. Empty text yields no windows.
    pub fn split(&self, text: &str) -> Result<Vec<TokenWindow>> {
        let tokens = self.tokenizer.encode(text);
        let spans = window_spans(tokens.len(), self.target_size, self.overlap)?;

        let mut windows = Vec::with_capacity(spans.len());
        for span in spans {
            let text = self.tokenizer.decode(&tokens[span.clone()]);
            windows.push(TokenWindow {
                start_index: span.start,
                end_index: span.end,
                token_count: span.len(),
                text,
            });
        }

        debug!(
            tokenizer = self.tokenizer.name(),
            tokens = tokens.len(),
            windows = windows.len(),
            "split token windows"
        );
        Ok(windows)
    }
}

/// One-shot form of [`WindowChunker::split`].
pub fn split(
    tokenizer: &dyn Tokenizer,
    text: &str,
    target_size: usize,
    overlap: usize,
) -> Result<Vec<TokenWindow>> {
    WindowChunker::new(tokenizer, target_size, overlap)?.split(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CharTokenizer;

    #[test]
    fn test_empty_text_yields_no_windows() {
        let windows = split(&CharTokenizer, "", 10, 2).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_short_text_single_window() {
        let windows = split(&CharTokenizer, "hello", 10, 3).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_index, 0);
        assert_eq!(windows[0].end_index, 5);
        assert_eq!(windows[0].token_count, 5);
        assert_eq!(windows[0].text, "hello");
    }

    #[test]
    fn test_exact_target_size_single_window() {
        let windows = split(&CharTokenizer, "abcdefgh", 8, 3).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].token_count, 8);
    }

    #[test]
    fn test_windows_share_overlap() {
        let windows = split(&CharTokenizer, "abcdefghijklmno", 6, 2).unwrap();
        let spans: Vec<(usize, usize)> = windows
            .iter()
            .map(|w| (w.start_index, w.end_index))
            .collect();
        assert_eq!(spans, [(0, 6), (4, 10), (8, 14), (12, 15)]);
        assert_eq!(windows[1].text, "efghij");
        assert_eq!(windows[3].text, "mno");
    }

    #[test]
    fn test_rejects_overlap_not_below_target() {
        let err = split(&CharTokenizer, "abc", 4, 4).unwrap_err();
        assert!(matches!(err, ChunkError::Configuration(_)));
        let err = split(&CharTokenizer, "abc", 4, 9).unwrap_err();
        assert!(matches!(err, ChunkError::Configuration(_)));
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(validate(0, 0).is_err());
        assert!(validate(10, 0).is_err());
        assert!(validate(10, 9).is_ok());
    }

    #[test]
    fn test_window_count_matches_spans() {
        for n in 0..60 {
            let spans = window_spans(n, 7, 3).unwrap();
            assert_eq!(spans.len(), window_count(n, 7, 3), "n = {n}");
        }
    }

    #[test]
    fn test_reused_chunker_is_deterministic() {
        let chunker = WindowChunker::new(&CharTokenizer, 5, 1).unwrap();
        let a = chunker.split("the quick brown fox").unwrap();
        let b = chunker.split("the quick brown fox").unwrap();
        assert_eq!(a, b);
        assert_eq!(chunker.target_size(), 5);
        assert_eq!(chunker.overlap(), 1);
        assert_eq!(chunker.tokenizer().name(), "chars");
    }

    /// Two bytes per token, so odd spans cut characters in half.
    struct ByteTokenizer;

    impl Tokenizer for ByteTokenizer {
        fn name(&self) -> &str {
            "bytes"
        }

        fn encode(&self, text: &str) -> Vec<crate::tokenizer::TokenId> {
            text.bytes().map(u32::from).collect()
        }

        fn decode(&self, tokens: &[crate::tokenizer::TokenId]) -> String {
            let bytes: Vec<u8> = tokens.iter().map(|&t| t as u8).collect();
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    #[test]
    fn test_split_inside_multibyte_char_is_lossy() {
        // "é" is two bytes; windows of 3 with overlap 1 cut through it.
        let windows = split(&ByteTokenizer, "éééé", 3, 1).unwrap();
        let spans: Vec<(usize, usize)> = windows
            .iter()
            .map(|w| (w.start_index, w.end_index))
            .collect();
        assert_eq!(spans, [(0, 3), (2, 5), (4, 7), (6, 8)]);
        assert_eq!(windows[0].text, "é\u{FFFD}");
        assert_eq!(windows[3].text, "é");
        for w in &windows {
            assert_eq!(w.token_count, w.end_index - w.start_index);
        }
    }
}

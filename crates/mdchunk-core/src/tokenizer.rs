//! Tokenizer capability and size units.
//!
//! The core never ships a real BPE vocabulary. It defines the
//! [`Tokenizer`] trait that the window chunker and token-based size
//! budgets consume, plus [`CharTokenizer`], which treats every Unicode
//! scalar value as one token and therefore round-trips exactly.
//!
//! Concrete BPE tokenizers (tiktoken encodings) live in the `mdchunk`
//! application crate.

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};

/// Identifier of a single token.
pub type TokenId = u32;

/// Maps text to token sequences and back.
///
/// Implementations used with the window chunker must round-trip:
/// `decode(&encode(x)) == x` for every `x` they support, otherwise window
/// coverage is only exact at the token level, not the text level.
///
/// Decoding never fails. A range that starts or ends inside a multi-byte
/// character decodes with U+FFFD in place of the partial bytes.
pub trait Tokenizer: Send + Sync {
    /// Short name used in logs (e.g. `"cl100k_base"`).
    fn name(&self) -> &str;

    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Decode a token range back into text, lossily.
    fn decode(&self, tokens: &[TokenId]) -> String;

    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// One token per Unicode scalar value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn name(&self) -> &str {
        "chars"
    }

    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.chars().map(|c| c as TokenId).collect()
    }

    fn decode(&self, tokens: &[TokenId]) -> String {
        tokens
            .iter()
            .map(|&t| char::from_u32(t).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Unit in which a size bound is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Tokens under the configured tokenizer.
    #[default]
    Tokens,
    /// Unicode scalar values.
    Characters,
}

impl SizeUnit {
    /// Measure `text` in this unit.
    ///
    /// `Tokens` requires a tokenizer; `Characters` ignores it.
    pub fn measure(self, text: &str, tokenizer: Option<&dyn Tokenizer>) -> Result<usize> {
        match self {
            SizeUnit::Characters => Ok(text.chars().count()),
            SizeUnit::Tokens => tokenizer
                .map(|t| t.count_tokens(text))
                .ok_or_else(|| {
                    ChunkError::Configuration(
                        "a tokenizer is required to measure sizes in tokens".to_string(),
                    )
                }),
        }
    }
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeUnit::Tokens => f.write_str("tokens"),
            SizeUnit::Characters => f.write_str("characters"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_tokenizer_roundtrip_unicode() {
        let text = "Hello 世界! 🌍 Привет";
        let tok = CharTokenizer;
        let ids = tok.encode(text);
        assert_eq!(ids.len(), text.chars().count());
        assert_eq!(tok.decode(&ids), text);
    }

    #[test]
    fn test_char_tokenizer_replaces_surrogate() {
        let text = CharTokenizer.decode(&[0x61, 0xD800, 0x62]);
        assert_eq!(text, "a\u{FFFD}b");
    }

    #[test]
    fn test_measure_characters_without_tokenizer() {
        assert_eq!(SizeUnit::Characters.measure("héllo", None).unwrap(), 5);
    }

    #[test]
    fn test_measure_tokens_requires_tokenizer() {
        let err = SizeUnit::Tokens.measure("hello", None).unwrap_err();
        assert!(matches!(err, ChunkError::Configuration(_)));
        assert_eq!(
            SizeUnit::Tokens.measure("hello", Some(&CharTokenizer)).unwrap(),
            5
        );
    }

    #[test]
    fn test_size_unit_serde_names() {
        let unit: SizeUnit = serde_json::from_str("\"characters\"").unwrap();
        assert_eq!(unit, SizeUnit::Characters);
        assert_eq!(SizeUnit::Tokens.to_string(), "tokens");
    }
}

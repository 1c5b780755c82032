//! Tokenizer selection.
//!
//! The core only knows the [`Tokenizer`] capability. This module binds it
//! to concrete backends: tiktoken BPE vocabularies via `tiktoken-rs`, or
//! the core's [`CharTokenizer`].

use anyhow::{Context, Result};
use mdchunk_core::{CharTokenizer, SizeUnit, TokenId, Tokenizer};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

use crate::config::TokenizerKind;

/// A tiktoken BPE vocabulary.
pub struct TiktokenTokenizer {
    name: &'static str,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().context("failed to load cl100k_base vocabulary")?;
        Ok(Self {
            name: "cl100k_base",
            bpe,
        })
    }

    pub fn p50k() -> Result<Self> {
        let bpe = tiktoken_rs::p50k_base().context("failed to load p50k_base vocabulary")?;
        Ok(Self {
            name: "p50k_base",
            bpe,
        })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        self.name
    }

    fn encode(&self, text: &str) -> Vec<TokenId> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as TokenId)
            .collect()
    }

    /// A token range may end inside a multi-byte character; the partial
    /// bytes decode to U+FFFD.
    fn decode(&self, tokens: &[TokenId]) -> String {
        let ids: Vec<usize> = tokens.iter().map(|&t| t as usize).collect();
        String::from_utf8_lossy(&self.bpe._decode_native(&ids)).into_owned()
    }
}

/// Build the tokenizer named by `kind`.
pub fn build_tokenizer(kind: TokenizerKind) -> Result<Arc<dyn Tokenizer>> {
    let tokenizer: Arc<dyn Tokenizer> = match kind {
        TokenizerKind::Cl100k => Arc::new(TiktokenTokenizer::cl100k()?),
        TokenizerKind::P50k => Arc::new(TiktokenTokenizer::p50k()?),
        TokenizerKind::Chars => Arc::new(CharTokenizer),
    };
    tracing::debug!(tokenizer = tokenizer.name(), "tokenizer ready");
    Ok(tokenizer)
}

/// The tokenizer that measures `unit`: characters always use
/// [`CharTokenizer`], tokens use `kind`.
pub fn tokenizer_for_unit(unit: SizeUnit, kind: TokenizerKind) -> Result<Arc<dyn Tokenizer>> {
    match unit {
        SizeUnit::Characters => Ok(Arc::new(CharTokenizer)),
        SizeUnit::Tokens => build_tokenizer(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdchunk_core::window;

    #[test]
    fn test_cl100k_round_trip() {
        let tokenizer = build_tokenizer(TokenizerKind::Cl100k).unwrap();
        let text = "# Heading\n\nSome *markdown* with `code`.\n";
        let tokens = tokenizer.encode(text);
        assert!(!tokens.is_empty());
        assert!(tokens.len() < text.len());
        assert_eq!(tokenizer.decode(&tokens), text);
    }

    #[test]
    fn test_special_token_text_is_ordinary() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let text = "literal <|endoftext|> marker";
        assert_eq!(tokenizer.decode(&tokenizer.encode(text)), text);
    }

    #[test]
    fn test_cl100k_windows_over_cjk_and_emoji() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let text = "日本語のテキストです。絵文字🌍🚀も含みます。".repeat(800);
        let total = tokenizer.count_tokens(&text);

        let windows = window::split(&tokenizer, &text, 1000, 250).unwrap();
        assert_eq!(windows.len(), window::window_count(total, 1000, 250));
        assert_eq!(windows.last().unwrap().end_index, total);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].token_count, 1000);
            assert_eq!(pair[0].end_index - pair[1].start_index, 250);
        }
    }

    #[test]
    fn test_cl100k_small_windows_cut_characters() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let text = "絵文字🌍🚀と日本語";
        let total = tokenizer.count_tokens(text);
        for target in 2..12 {
            let windows = window::split(&tokenizer, text, target, 1).unwrap();
            assert_eq!(windows.last().unwrap().end_index, total, "target = {target}");
            for w in &windows {
                assert_eq!(w.token_count, w.end_index - w.start_index);
                assert!(!w.text.is_empty());
            }
        }
    }

    #[test]
    fn test_p50k_named() {
        let tokenizer = build_tokenizer(TokenizerKind::P50k).unwrap();
        assert_eq!(tokenizer.name(), "p50k_base");
        assert_eq!(tokenizer.count_tokens(""), 0);
    }

    #[test]
    fn test_characters_unit_ignores_kind() {
        let tokenizer = tokenizer_for_unit(SizeUnit::Characters, TokenizerKind::Cl100k).unwrap();
        assert_eq!(tokenizer.count_tokens("héllo"), 5);
    }

    #[test]
    fn test_chars_kind() {
        let tokenizer = build_tokenizer(TokenizerKind::Chars).unwrap();
        assert_eq!(tokenizer.encode("ab").len(), 2);
    }
}

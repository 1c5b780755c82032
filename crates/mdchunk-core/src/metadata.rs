//! Per-chunk metadata extraction: fenced code, inline links and tables.
//!
//! All extractors are pure and tolerate zero matches. Code fences and
//! tables are located with the same scanner the block protector uses, so
//! what is extracted is exactly what was protected.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CodeBlock, Link};
use crate::protect::{fence_open, find_blocks, BlockKind, ProtectOptions};

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));

/// Fenced code blocks in document order.
///
/// The language is the first word of the info string (`"rust"` for
/// ```` ```rust,ignore ````), or empty. The content is the lines between
/// the fences, joined with `\n`. Unterminated fences are not reported.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let options = ProtectOptions {
        code_blocks: true,
        tables: false,
    };
    find_blocks(text, options)
        .into_iter()
        .filter(|span| span.kind == BlockKind::Code)
        .map(|span| code_block(&text[span.range]))
        .collect()
}

fn code_block(block: &str) -> CodeBlock {
    let lines: Vec<&str> = block
        .lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();

    let language = lines
        .first()
        .and_then(|l| fence_open(l))
        .and_then(|info| {
            info.split(|c: char| c.is_whitespace() || c == ',')
                .next()
        })
        .unwrap_or_default()
        .to_string();

    let content = if lines.len() > 2 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        String::new()
    };

    CodeBlock { language, content }
}

/// Inline `[text](url)` links in document order.
///
/// Images (`![alt](src)`) are skipped, and a quoted title after the URL
/// (`[docs](./README.md "Docs")`) is dropped.
pub fn extract_links(text: &str) -> Vec<Link> {
    LINK_RE
        .captures_iter(text)
        .filter(|caps| caps[1].is_empty())
        .filter_map(|caps| {
            let url = strip_link_title(caps[3].trim());
            if url.is_empty() {
                return None;
            }
            Some(Link {
                text: caps[2].to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

fn strip_link_title(target: &str) -> &str {
    match target.split_once(char::is_whitespace) {
        Some((url, rest)) if rest.trim_start().starts_with(['"', '\'']) => url,
        _ => target,
    }
}

/// Raw text of every pipe table, in document order.
///
/// Table-shaped lines inside code fences are not tables.
pub fn extract_tables(text: &str) -> Vec<String> {
    let options = ProtectOptions {
        code_blocks: false,
        tables: true,
    };
    find_blocks(text, options)
        .into_iter()
        .map(|span| text[span.range].to_string())
        .collect()
}

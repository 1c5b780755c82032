//! # mdchunk
//!
//! Structure-aware Markdown chunking for retrieval pipelines.
//!
//! mdchunk splits Markdown into retrieval-sized pieces two ways: along
//! the heading structure, with code fences and tables kept whole and every
//! section linked to its parent heading, or into overlapping fixed-size
//! token windows. The chunking itself lives in [`mdchunk_core`]; this
//! crate adds configuration, tokenizer selection, file discovery, CSV
//! record processing and JSON output.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │  Sources    │──▶│  mdchunk-core     │──▶│  Export      │
//! │ files / CSV │   │ structure/window │   │ JSONL / CSV  │
//! └─────────────┘   └──────────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mdchunk structure docs/               # heading chunks as JSONL
//! mdchunk window README.md --overlap 100
//! mdchunk records pages.csv --output chunks.csv --mode structure
//! mdchunk stats docs/
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`tokenizer`] | tiktoken and character tokenizers |
//! | [`sources`] | File and directory discovery |
//! | [`ingest`] | Parallel chunking of loaded documents |
//! | [`records`] | CSV row chunking |
//! | [`export`] | JSON / JSONL output |
//! | [`stats`] | Summary statistics |
//! | [`logging`] | Subscriber setup |

pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod records;
pub mod sources;
pub mod stats;
pub mod tokenizer;

pub use mdchunk_core;

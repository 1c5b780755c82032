//! # mdchunk core
//!
//! Pure chunking logic for mdchunk: heading-structured chunking of
//! Markdown, fixed-size token windows, reversible protection of code
//! fences and tables, metadata extraction and content-derived chunk ids.
//!
//! This crate performs no filesystem, network or process I/O and keeps
//! no global state. Every entry point is a synchronous, deterministic
//! function of its input, so documents can be chunked on as many threads
//! as the caller likes.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`structure`] | Heading sections with parent links |
//! | [`window`] | Overlapping fixed-size token windows |
//! | [`protect`] | Placeholder masking of code fences and tables |
//! | [`metadata`] | Code block, link and table extraction |
//! | [`identity`] | Stable chunk ids |
//! | [`tokenizer`] | Tokenizer capability and size units |
//! | [`models`] | Output records |
//! | [`error`] | Error type |

pub mod error;
pub mod identity;
pub mod metadata;
pub mod models;
pub mod protect;
pub mod structure;
pub mod tokenizer;
pub mod window;

pub use error::{ChunkError, Result};
pub use models::{Chunk, CodeBlock, Link, TokenWindow, INTRODUCTION_TITLE};
pub use protect::{BlockMap, BlockProtector, ProtectOptions};
pub use structure::{chunk_document, SizeBudget, StructuralChunker};
pub use tokenizer::{CharTokenizer, SizeUnit, TokenId, Tokenizer};
pub use window::WindowChunker;

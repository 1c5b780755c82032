//! # mdchunk CLI
//!
//! The `mdchunk` binary chunks Markdown files and CSV exports for
//! retrieval pipelines.
//!
//! ## Usage
//!
//! ```bash
//! mdchunk [--config mdchunk.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mdchunk structure <PATH>...` | Heading-structured chunks with parent links |
//! | `mdchunk window <PATH>...` | Overlapping fixed-size token windows |
//! | `mdchunk records <CSV> --output <CSV>` | Chunk one column of a CSV file |
//! | `mdchunk stats <PATH>...` | Summary of a structural run |
//!
//! ## Examples
//!
//! ```bash
//! # Structural chunks of a docs tree, one JSON object per line
//! mdchunk structure docs/ > chunks.jsonl
//!
//! # Split long sections at paragraph boundaries
//! mdchunk structure docs/ --max-size 1500 --unit characters
//!
//! # 512-token windows with 64 tokens of overlap, as a JSON array
//! mdchunk window README.md --target-size 512 --overlap 64 --format json
//!
//! # Chunk the `file_content` column of an export
//! mdchunk records pages.csv --output pages.chunked.csv
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use mdchunk::config::{self, Config, TokenizerKind};
use mdchunk::export::{self, OutputFormat};
use mdchunk::ingest::{self, StructurePlan};
use mdchunk::records::{self, RecordChunker, RecordMode};
use mdchunk::stats::{self, ChunkStats};
use mdchunk::tokenizer::{build_tokenizer, tokenizer_for_unit};
use mdchunk::{logging, sources};
use mdchunk_core::{SizeUnit, WindowChunker};
use std::io::Write;
use std::path::{Path, PathBuf};

/// mdchunk: structure-aware Markdown chunking.
///
/// Settings come from an optional TOML file (`--config`); command-line
/// flags override the file.
#[derive(Parser)]
#[command(
    name = "mdchunk",
    about = "Structure-aware Markdown chunking and token windowing",
    version,
    long_about = "mdchunk splits Markdown into retrieval-sized chunks, either along the heading \
    structure (code fences and tables kept whole, each section linked to its parent heading) or \
    into overlapping fixed-size token windows. Output is JSON Lines, JSON, or CSV."
)]
struct Cli {
    /// Path to a configuration file (TOML).
    ///
    /// When omitted, built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tokenizer for token counts and windows. Overrides `[tokenizer].kind`.
    #[arg(long, global = true, value_enum)]
    tokenizer: Option<TokenizerKind>,

    /// Output format for chunk records.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Jsonl)]
    format: OutputFormat,

    /// Write output to this file instead of stdout.
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Enable debug logging on stderr (`RUST_LOG` takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Split documents at headings.
    ///
    /// Each chunk starts at a heading (or is the "Introduction" before the
    /// first one), keeps code fences and tables intact, and records the id
    /// of its nearest shallower heading as `parent_id`.
    Structure {
        /// Markdown files or directories to scan.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Split sections larger than this at paragraph boundaries.
        #[arg(long)]
        max_size: Option<usize>,

        /// Unit for `--max-size`.
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
    },

    /// Split documents into overlapping token windows.
    Window {
        /// Files or directories to scan.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Tokens per window.
        #[arg(long)]
        target_size: Option<usize>,

        /// Tokens shared by consecutive windows.
        #[arg(long)]
        overlap: Option<usize>,

        /// Count characters instead of tokens.
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
    },

    /// Chunk one column of a CSV file.
    ///
    /// Writes one row per chunk with every original column, the content
    /// column replaced by the chunk text, and chunk fields appended.
    Records {
        /// Input CSV file (first row is the header).
        input: PathBuf,

        /// Column holding the text to chunk. Overrides `[records].content_column`.
        #[arg(long)]
        column: Option<String>,

        /// Chunking mode.
        #[arg(long, value_enum, default_value_t = RecordMode::Window)]
        mode: RecordMode,
    },

    /// Print a summary of structural chunking.
    Stats {
        /// Markdown files or directories to scan.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Tokens,
    Characters,
}

impl From<UnitArg> for SizeUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Tokens => SizeUnit::Tokens,
            UnitArg::Characters => SizeUnit::Characters,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg = config::load_or_default(cli.config.as_deref())?;
    if let Some(kind) = cli.tokenizer {
        cfg.tokenizer.kind = kind;
    }

    match cli.command {
        Commands::Structure {
            paths,
            max_size,
            unit,
        } => {
            if max_size.is_some() {
                cfg.structure.max_size = max_size;
            }
            if let Some(unit) = unit {
                cfg.structure.unit = unit.into();
            }
            cfg.validate()?;

            let plan = StructurePlan::from_config(&cfg)?;
            let docs = sources::collect_documents(&paths, &cfg.input)?;
            let results = ingest::chunk_structure(&docs, &plan)?;

            let mut out = export::open_output(cli.output.as_deref())?;
            let written = export::write_chunks(&results, cli.format, &mut *out)?;
            tracing::info!(records = written, "structural chunks written");
        }
        Commands::Window {
            paths,
            target_size,
            overlap,
            unit,
        } => {
            if let Some(target_size) = target_size {
                cfg.window.target_size = target_size;
            }
            if let Some(overlap) = overlap {
                cfg.window.overlap = overlap;
            }
            if let Some(unit) = unit {
                cfg.window.unit = unit.into();
            }
            cfg.validate()?;

            let tokenizer = tokenizer_for_unit(cfg.window.unit, cfg.tokenizer.kind)?;
            let chunker =
                WindowChunker::new(tokenizer.as_ref(), cfg.window.target_size, cfg.window.overlap)?;
            let docs = sources::collect_documents(&paths, &cfg.input)?;
            let results = ingest::chunk_windows(&docs, &chunker)?;

            let mut out = export::open_output(cli.output.as_deref())?;
            let written = export::write_windows(&results, cli.format, &mut *out)?;
            tracing::info!(records = written, "token windows written");
        }
        Commands::Records {
            input,
            column,
            mode,
        } => {
            let Some(output) = cli.output.as_deref() else {
                anyhow::bail!("records requires --output <FILE>");
            };
            let column = column.unwrap_or_else(|| cfg.records.content_column.clone());
            let summary = run_records_command(&cfg, &input, output, &column, mode)?;
            println!(
                "{}: {} rows read, {} empty, {} chunks written to {}",
                input.display(),
                summary.rows_read,
                summary.rows_skipped,
                summary.chunks_written,
                output.display()
            );
        }
        Commands::Stats { paths } => {
            let plan = StructurePlan::from_config(&cfg)?;
            let counter = build_tokenizer(cfg.tokenizer.kind)?;
            let docs = sources::collect_documents(&paths, &cfg.input)?;
            let results = ingest::chunk_structure(&docs, &plan)?;

            let summary = ChunkStats::collect(&docs, &results, counter.as_ref());
            let mut out = export::open_output(cli.output.as_deref())?;
            stats::print_stats(&summary, counter.name(), &mut *out)?;
            out.flush()?;
        }
    }

    Ok(())
}

fn run_records_command(
    cfg: &Config,
    input: &Path,
    output: &Path,
    column: &str,
    mode: RecordMode,
) -> anyhow::Result<records::RecordsSummary> {
    match mode {
        RecordMode::Window => {
            let tokenizer = tokenizer_for_unit(cfg.window.unit, cfg.tokenizer.kind)?;
            let chunker =
                WindowChunker::new(tokenizer.as_ref(), cfg.window.target_size, cfg.window.overlap)?;
            records::run_records(input, output, column, &RecordChunker::Window(&chunker))
        }
        RecordMode::Structure => {
            let plan = StructurePlan::from_config(cfg)?;
            let counter = build_tokenizer(cfg.tokenizer.kind)?;
            let chunker = RecordChunker::Structure {
                plan: &plan,
                counter: counter.as_ref(),
            };
            records::run_records(input, output, column, &chunker)
        }
    }
}

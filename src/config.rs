//! TOML configuration.
//!
//! Every section is optional. A missing file section falls back to the
//! defaults below, and running without `--config` uses
//! [`Config::default`]. Settings are validated with the same checks the
//! core chunkers apply, so a bad value fails before any input is read.
//!
//! ```toml
//! [window]
//! target_size = 1000
//! overlap = 250
//! unit = "tokens"
//!
//! [structure]
//! max_size = 2000
//! unit = "characters"
//! protect_code_blocks = true
//! protect_tables = true
//!
//! [tokenizer]
//! kind = "cl100k"
//!
//! [input]
//! include_globs = ["**/*.md"]
//! exclude_globs = ["drafts/**"]
//! follow_symlinks = false
//!
//! [records]
//! content_column = "file_content"
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use mdchunk_core::{window, SizeUnit};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub structure: StructureConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub records: RecordsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_target_size")]
    pub target_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default)]
    pub unit: SizeUnit,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            overlap: default_overlap(),
            unit: SizeUnit::Tokens,
        }
    }
}

fn default_target_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    250
}

#[derive(Debug, Deserialize, Clone)]
pub struct StructureConfig {
    #[serde(default)]
    pub max_size: Option<usize>,
    #[serde(default = "default_structure_unit")]
    pub unit: SizeUnit,
    #[serde(default = "default_true")]
    pub protect_code_blocks: bool,
    #[serde(default = "default_true")]
    pub protect_tables: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            max_size: None,
            unit: default_structure_unit(),
            protect_code_blocks: true,
            protect_tables: true,
        }
    }
}

fn default_structure_unit() -> SizeUnit {
    SizeUnit::Characters
}
fn default_true() -> bool {
    true
}

/// Which tokenizer backs token counts and token windows.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// BPE used by GPT-4 and GPT-3.5-turbo.
    #[default]
    #[value(name = "cl100k")]
    Cl100k,
    /// BPE used by Codex and text-davinci models.
    #[value(name = "p50k")]
    P50k,
    /// One token per character.
    Chars,
}

impl std::fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenizerKind::Cl100k => f.write_str("cl100k"),
            TokenizerKind::P50k => f.write_str("p50k"),
            TokenizerKind::Chars => f.write_str("chars"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub kind: TokenizerKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecordsConfig {
    #[serde(default = "default_content_column")]
    pub content_column: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            content_column: default_content_column(),
        }
    }
}

fn default_content_column() -> String {
    "file_content".to_string()
}

impl Config {
    /// Check every setting that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<()> {
        window::validate(self.window.target_size, self.window.overlap)
            .context("invalid [window] settings")?;

        if self.structure.max_size == Some(0) {
            anyhow::bail!("structure.max_size must be > 0");
        }

        if self.input.include_globs.is_empty() {
            anyhow::bail!("input.include_globs must not be empty");
        }

        if self.records.content_column.trim().is_empty() {
            anyhow::bail!("records.content_column must not be empty");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Load `path` when given, otherwise the validated defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.window.target_size, 1000);
        assert_eq!(config.window.overlap, 250);
        assert_eq!(config.window.unit, SizeUnit::Tokens);
        assert_eq!(config.structure.max_size, None);
        assert_eq!(config.structure.unit, SizeUnit::Characters);
        assert!(config.structure.protect_code_blocks);
        assert!(config.structure.protect_tables);
        assert_eq!(config.tokenizer.kind, TokenizerKind::Cl100k);
        assert_eq!(config.records.content_column, "file_content");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.window.target_size, 1000);
        assert_eq!(config.input.include_globs, default_include_globs());
    }

    #[test]
    fn test_partial_sections() {
        let file = write_config(
            r#"
[window]
target_size = 64
overlap = 8
unit = "characters"

[structure]
max_size = 500
protect_tables = false

[tokenizer]
kind = "p50k"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.window.target_size, 64);
        assert_eq!(config.window.overlap, 8);
        assert_eq!(config.window.unit, SizeUnit::Characters);
        assert_eq!(config.structure.max_size, Some(500));
        assert!(config.structure.protect_code_blocks);
        assert!(!config.structure.protect_tables);
        assert_eq!(config.tokenizer.kind, TokenizerKind::P50k);
    }

    #[test]
    fn test_overlap_not_below_target_rejected() {
        let file = write_config("[window]\ntarget_size = 100\noverlap = 100\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("overlap"));
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let file = write_config("[structure]\nmax_size = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("structure.max_size"));
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let file = write_config("[window]\nunit = \"words\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let file = write_config("[db]\npath = \"x.sqlite\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/mdchunk.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.tokenizer.kind, TokenizerKind::Cl100k);
    }
}

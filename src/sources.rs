//! Input discovery.
//!
//! Each path given on the command line is either a file, read as-is, or a
//! directory, walked recursively and filtered through the `[input]`
//! include/exclude globs. Output order is deterministic: documents are
//! sorted by their display path.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::InputConfig;

/// A Markdown document loaded from disk.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path as reported in output records.
    pub source: String,
    pub path: PathBuf,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub content_hash: String,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, path: PathBuf, text: String) -> Self {
        let content_hash = hex::encode(Sha256::digest(text.as_bytes()));
        Self {
            source: source.into(),
            path,
            text,
            content_hash,
        }
    }

    pub fn byte_len(&self) -> u64 {
        self.text.len() as u64
    }
}

/// Load every document named by `paths`.
pub fn collect_documents(paths: &[PathBuf], input: &InputConfig) -> Result<Vec<SourceDocument>> {
    if paths.is_empty() {
        bail!("no input paths given");
    }

    let include_set = build_globset(&input.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()];
    default_excludes.extend(input.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();
    for path in paths {
        if path.is_file() {
            documents.push(read_document(path, &path.display().to_string())?);
        } else if path.is_dir() {
            scan_directory(
                path,
                input.follow_symlinks,
                &include_set,
                &exclude_set,
                &mut documents,
            )?;
        } else {
            bail!("Input path does not exist: {}", path.display());
        }
    }

    documents.sort_by(|a, b| a.source.cmp(&b.source));
    documents.dedup_by(|a, b| a.source == b.source);

    tracing::info!(documents = documents.len(), "collected input documents");
    Ok(documents)
}

fn scan_directory(
    root: &Path,
    follow_symlinks: bool,
    include_set: &GlobSet,
    exclude_set: &GlobSet,
    documents: &mut Vec<SourceDocument>,
) -> Result<()> {
    let walker = WalkDir::new(root).follow_links(follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            tracing::trace!(path = %rel_str, "excluded");
            continue;
        }

        if !include_set.is_match(&rel_str) {
            continue;
        }

        documents.push(read_document(path, &path.display().to_string())?);
    }
    Ok(())
}

fn read_document(path: &Path, source: &str) -> Result<SourceDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(SourceDocument::new(source, path.to_path_buf(), text))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob: {pattern}"))?);
    }
    Ok(builder.build()?)
}

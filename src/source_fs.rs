//! Directory scanner for JSON source records.
//!
//! Walks an import directory, keeps files matching the configured include
//! globs (minus excludes), and hands each one back as a [`SourceItem`]. A
//! file that cannot be read or parsed still yields an item, carrying the
//! error, so one bad file never hides the rest of the batch.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::ImportConfig;
use crate::error::RecordError;
use crate::models::SourceRecord;

/// One candidate source file.
#[derive(Debug)]
pub struct SourceItem {
    /// Path relative to the import root, `/`-separated.
    pub file_id: String,
    pub record: Result<SourceRecord, RecordError>,
}

/// Relative paths of all matching files under `root`, sorted.
pub fn discover(root: &Path, config: &ImportConfig) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("import directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }
        files.push(rel_str);
    }

    files.sort();
    Ok(files)
}

/// Read and parse one discovered file.
pub fn load(root: &Path, file_id: &str) -> SourceItem {
    let record = std::fs::read_to_string(root.join(file_id))
        .map_err(|e| RecordError::Read(e.to_string()))
        .and_then(|text| parse_record(&text));

    SourceItem {
        file_id: file_id.to_string(),
        record,
    }
}

pub fn parse_record(text: &str) -> Result<SourceRecord, RecordError> {
    serde_json::from_str(text).map_err(|e| RecordError::Parse(e.to_string()))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

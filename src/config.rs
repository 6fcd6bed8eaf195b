use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// What an import does when a record's natural key is already stored.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Leave the stored row untouched (first wins).
    #[default]
    Skip,
    /// Replace the stored descriptive fields with the incoming record.
    Overwrite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            on_duplicate: DuplicatePolicy::Skip,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Hard cap applied to every read.
    #[serde(default = "default_row_limit")]
    pub row_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
        }
    }
}

fn default_row_limit() -> i64 {
    300
}

impl SearchConfig {
    /// Clamp a caller-requested limit to the configured cap.
    pub fn effective_limit(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(n) if n > 0 => n.min(self.row_limit),
            _ => self.row_limit,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.search.row_limit < 1 {
        anyhow::bail!("search.row_limit must be >= 1");
    }

    if config.import.include_globs.is_empty() {
        anyhow::bail!("import.include_globs must list at least one pattern");
    }

    Ok(config)
}

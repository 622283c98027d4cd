use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ripple_diff::{DiffConfig, DuplicatePolicy};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ripple.toml";

/// Settings read from `ripple.toml`. Command-line flags override them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Unlike the library default, the tool never panics on bad input:
    /// duplicate ids are rejected with an error unless configured otherwise.
    pub duplicate_policy: DuplicatePolicy,
    pub detect_updates: bool,
    pub default_format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            detect_updates: true,
            default_format: OutputFormat::Text,
        }
    }
}

impl CliConfig {
    /// Load from `path`, or from `ripple.toml` if it exists, or fall back to
    /// defaults. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(&fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Diff settings with an optional policy override applied.
    pub fn diff_with(&self, policy: Option<DuplicatePolicy>) -> DiffConfig {
        DiffConfig {
            duplicate_policy: policy.unwrap_or(self.duplicate_policy),
            detect_updates: self.detect_updates,
        }
    }
}

//! Config file support
//!
//! An optional TOML file can pin the input format and line limit so a
//! `kubectl logs -f ... | loghuman` pipeline needs no flags. Command line
//! flags always win over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use loghuman_types::{RunConfig, Variant};

/// Contents of `config.toml`
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Record shape to decode when no format flag is given
    pub format: Option<Variant>,
    /// Maximum input line length in bytes
    pub max_line_bytes: Option<usize>,
}

impl FileConfig {
    /// Default location: `<config dir>/loghuman/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        let config_dir = dirs::config_dir()?;
        Some(config_dir.join("loghuman").join("config.toml"))
    }

    /// Parse config file contents
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.max_line_bytes == Some(0) {
            anyhow::bail!("max_line_bytes must be greater than zero");
        }
        Ok(config)
    }

    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// Returns the path actually read alongside the config.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Combine with command line overrides into the settings for a run
    pub fn resolve(&self, variant: Option<Variant>, max_line_bytes: Option<usize>) -> RunConfig {
        let mut config = RunConfig::new(variant.or(self.format).unwrap_or_default());
        if let Some(max) = max_line_bytes.or(self.max_line_bytes) {
            config = config.with_max_line_bytes(max);
        }
        config
    }
}

//! Configuration management for `svgbatch.toml`.
//!
//! The file is optional. Values are resolved in this order:
//! built-in defaults, then the file, then command-line flags.
//!
//! # Sections
//!
//! | Section     | Purpose                                  |
//! |-------------|------------------------------------------|
//! | `[pool]`    | Worker threads, idle poll interval       |
//! | `[ledger]`  | Scope directory and ledger file name     |
//! | `[convert]` | Reference width, memory cache            |

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{ConvertConfig, LedgerConfig, PoolConfig};

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::{debug, log};

/// Root configuration structure representing svgbatch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub convert: ConvertConfig,
}

impl BatchConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.is_file() {
            Self::from_path(&cli.config)?
        } else {
            debug!("config"; "{} not found, using defaults", cli.config.display());
            Self::default()
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        debug!("config"; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    ///
    /// Requests may be arriving on stdin, so there is no prompt here:
    /// unknown fields are reported and skipped.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            log!("warning"; "- {}", field);
        }
    }

    /// Command-line flags override file values.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(workers) = cli.worker_count() {
            self.pool.workers = workers;
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.pool.poll_interval_ms = ms;
        }
        if let Some(dir) = &cli.scope_dir {
            self.ledger.scope_dir = dir.clone();
        }
        if let Some(width) = cli.reference_width {
            self.convert.reference_width = width;
        }
        if cli.memory_cache {
            self.convert.memory_cache = true;
        }
    }

    /// Reject values that would make every conversion meaningless.
    pub fn validate(&self) -> Result<()> {
        let width = self.convert.reference_width;
        if !width.is_finite() || width <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "convert.reference_width must be a positive number, got {width}"
            ))
            .into());
        }
        if self.pool.poll_interval_ms == 0 {
            return Err(
                ConfigError::Validation("pool.poll_interval_ms must be positive".into()).into(),
            );
        }
        if self.ledger.file_name.is_empty() || self.ledger.file_name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "ledger.file_name must be a plain file name, got `{}`",
                self.ledger.file_name
            ))
            .into());
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.pool.poll_interval_ms)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> BatchConfig {
    let (parsed, ignored) = BatchConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

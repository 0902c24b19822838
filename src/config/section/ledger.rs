//! `[ledger]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [ledger]
//! scope_dir = "output"        # Must exist; dedup is off otherwise
//! file_name = "cache.txt"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ledger::LEDGER_FILE;

/// Dedup ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory the ledger file lives in.
    pub scope_dir: PathBuf,

    /// Ledger file name inside `scope_dir`.
    pub file_name: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            scope_dir: PathBuf::from("output"),
            file_name: LEDGER_FILE.to_string(),
        }
    }
}

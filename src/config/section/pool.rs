//! `[pool]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [pool]
//! workers = 4                 # Worker threads
//! poll_interval_ms = 100      # Idle wait before re-checking shutdown
//! ```

use serde::{Deserialize, Serialize};

use crate::cli::DEFAULT_WORKERS;

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads. Zero falls back to 1.
    pub workers: usize,

    /// Upper bound, in milliseconds, on how long an idle worker sleeps
    /// before looking at the running flag again.
    pub poll_interval_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            poll_interval_ms: 100,
        }
    }
}

//! `[convert]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [convert]
//! reference_width = 48.0      # Native width of the source assets
//! memory_cache = false        # Reuse PNGs for identical sources
//! ```

use serde::{Deserialize, Serialize};

use crate::convert::REFERENCE_WIDTH;

/// Conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Assumed width of every source, in user units. The render scale is
    /// `target_size / reference_width`.
    pub reference_width: f32,

    /// Keep encoded PNGs in memory, keyed by source content and size.
    pub memory_cache: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            reference_width: REFERENCE_WIDTH,
            memory_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_convert_config() {
        let config = test_parse_config("[convert]\nreference_width = 24.0\nmemory_cache = true");
        assert_eq!(config.convert.reference_width, 24.0);
        assert!(config.convert.memory_cache);
    }

    #[test]
    fn test_convert_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.convert.reference_width, 48.0);
        assert!(!config.convert.memory_cache);
    }
}

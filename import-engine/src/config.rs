//! Execution settings for one import run

use bookmark_import_core::{ImportError, Result};
use serde::{Deserialize, Serialize};

/// Default upper bound on the raw file size (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Files larger than this are rejected during validation
    pub max_file_size_bytes: usize,
    /// Floor for batch shrinking under memory pressure
    pub min_batch_size: usize,
    /// Ceiling for the computed initial batch size
    pub max_batch_size: usize,
    /// Fixed initial batch size instead of the computed one
    pub batch_size_override: Option<usize>,
    /// Multiplier applied to the batch size when pressure is high
    pub shrink_factor: f64,
    /// Pause after a batch that ran under high pressure
    pub reclaim_pause_ms: u64,
    /// Ask the store to enrich every created bookmark
    pub enrich_metadata: bool,
    /// Wait for enrichment tasks before finalization
    pub await_enrichment: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            min_batch_size: 5,
            max_batch_size: 100,
            batch_size_override: None,
            shrink_factor: 0.7,
            reclaim_pause_ms: 50,
            enrich_metadata: false,
            await_enrichment: true,
        }
    }
}

impl ImportConfig {
    /// Reject settings the orchestrator cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |details: &str| {
            Err(ImportError::Configuration {
                details: details.to_string(),
            })
        };

        if self.max_file_size_bytes == 0 {
            return invalid("max_file_size_bytes must be positive");
        }
        if self.min_batch_size == 0 || self.max_batch_size == 0 {
            return invalid("batch sizes must be positive");
        }
        if self.min_batch_size > self.max_batch_size {
            return invalid("min_batch_size exceeds max_batch_size");
        }
        if self.batch_size_override == Some(0) {
            return invalid("batch_size_override must be positive");
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor < 1.0) {
            return invalid("shrink_factor must be between 0 and 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ImportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes, 52_428_800);
    }

    #[test]
    fn test_invalid_settings() {
        let cases = [
            ImportConfig {
                min_batch_size: 50,
                max_batch_size: 10,
                ..Default::default()
            },
            ImportConfig {
                shrink_factor: 1.0,
                ..Default::default()
            },
            ImportConfig {
                shrink_factor: f64::NAN,
                ..Default::default()
            },
            ImportConfig {
                batch_size_override: Some(0),
                ..Default::default()
            },
            ImportConfig {
                min_batch_size: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(ImportError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"max_batch_size": 40, "enrich_metadata": true}"#).unwrap();
        assert_eq!(config.max_batch_size, 40);
        assert!(config.enrich_metadata);
        assert_eq!(config.min_batch_size, 5);
    }
}

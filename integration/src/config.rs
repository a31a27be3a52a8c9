//! Application configuration

use anyhow::Context;
use import_engine::ImportConfig;
use import_planner::MappingOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Overrides the log level
pub const ENV_LOG_LEVEL: &str = "BOOKMARK_IMPORT_LOG";
/// Overrides `import.max_batch_size`
pub const ENV_MAX_BATCH: &str = "BOOKMARK_IMPORT_MAX_BATCH";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub import: ImportConfig,

    pub mapping: MappingOptions,

    /// Log level
    pub log_level: String,

    /// Memory budget for the process memory monitor, in MB
    pub max_memory_mb: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            import: ImportConfig::default(),
            mapping: MappingOptions::default(),
            log_level: "info".to_string(),
            max_memory_mb: 512,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(raw) = lookup(ENV_MAX_BATCH) {
            self.import.max_batch_size = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got {:?}", ENV_MAX_BATCH, raw))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.import
            .validate()
            .context("invalid import configuration")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(config.mapping.merge_folders);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> =
            [(ENV_LOG_LEVEL, "debug"), (ENV_MAX_BATCH, " 40 ")].into_iter().collect();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.import.max_batch_size, 40);
    }

    #[test]
    fn test_bad_overrides_are_rejected() {
        let mut config = AppConfig::default();
        let not_a_number = config.apply_overrides(|key| {
            (key == ENV_MAX_BATCH).then(|| "lots".to_string())
        });
        assert!(not_a_number.is_err());

        let mut config = AppConfig::default();
        // Below the default minimum batch size
        let too_small = config.apply_overrides(|key| (key == ENV_MAX_BATCH).then(|| "2".to_string()));
        assert!(too_small.is_err());
    }
}

//! Logging setup for applications embedding the importer

use anyhow::{anyhow, Context};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Default filter when `RUST_LOG` is unset (e.g. "info", "import_engine=debug")
    pub level: String,

    /// Include thread IDs
    pub include_thread_ids: bool,

    /// Include target module paths
    pub include_targets: bool,

    /// Colored output
    pub ansi: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_thread_ids: false,
            include_targets: true,
            ansi: true,
        }
    }
}

impl LoggerConfig {
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }
}

/// Global tracing subscriber for import runs
pub struct ImportLogger;

impl ImportLogger {
    /// Install the global subscriber. Fails if one is already installed.
    pub fn init(config: LoggerConfig) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .with_context(|| format!("invalid log filter: {}", config.level))?;

        let console_layer = fmt::layer()
            .with_target(config.include_targets)
            .with_thread_ids(config.include_thread_ids)
            .with_ansi(config.ansi);

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow!("logger already initialized: {}", e))?;

        tracing::info!("Logging initialized with level: {}", config.level);

        Ok(())
    }

    /// Initialize with default configuration
    pub fn init_default() -> anyhow::Result<()> {
        Self::init(LoggerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.include_targets);
        assert_eq!(LoggerConfig::with_level("debug").level, "debug");
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggerConfig {
            ansi: false,
            ..LoggerConfig::with_level("warn")
        };
        // Another test may have installed a subscriber first
        let _ = ImportLogger::init(config.clone());
        assert!(ImportLogger::init(config).is_err());
    }
}

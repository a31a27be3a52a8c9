//! Application wiring for bookmark imports
//!
//! Configuration loading, logger setup, error bookkeeping and the
//! [`ImportService`] facade that reads a bookmark file from disk and runs the
//! import pipeline against a destination store.

pub mod config;
pub mod error_handler;
pub mod logger;
pub mod service;

pub use config::{AppConfig, ENV_LOG_LEVEL, ENV_MAX_BATCH};
pub use error_handler::{classify_error, ErrorSeverity, ErrorStatistics, ImportErrorHandler};
pub use logger::{ImportLogger, LoggerConfig};
pub use service::ImportService;

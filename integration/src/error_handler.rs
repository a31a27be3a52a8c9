//! Severity classification and bookkeeping for import errors

use bookmark_import_core::ImportError;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// The importer itself is misconfigured or cannot read input
    Critical,
    /// The import was aborted
    Error,
    /// A single item was skipped
    Warning,
    /// Informational message
    Info,
}

/// Error entry for tracking
#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub error: String,
    pub severity: ErrorSeverity,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub context: String,
}

/// Keeps a bounded history of import errors
pub struct ImportErrorHandler {
    recent_errors: Arc<RwLock<Vec<ErrorEntry>>>,
    max_errors: usize,
}

impl ImportErrorHandler {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(max_errors: usize) -> Self {
        Self {
            recent_errors: Arc::new(RwLock::new(Vec::new())),
            max_errors: max_errors.max(1),
        }
    }

    /// Log and record an error
    pub async fn handle_error(&self, error: &ImportError, context: &str) {
        let severity = classify_error(error);
        self.record(error.to_string(), severity, context).await;
    }

    /// Log and record a message that is already rendered, such as the
    /// recoverable errors collected in an import report
    pub async fn record(&self, message: impl Into<String>, severity: ErrorSeverity, context: &str) {
        let message = message.into();

        match severity {
            ErrorSeverity::Critical => error!("CRITICAL ERROR in {}: {}", context, message),
            ErrorSeverity::Error => error!("ERROR in {}: {}", context, message),
            ErrorSeverity::Warning => warn!("WARNING in {}: {}", context, message),
            ErrorSeverity::Info => info!("INFO in {}: {}", context, message),
        }

        let entry = ErrorEntry {
            error: message,
            severity,
            timestamp: chrono::Utc::now(),
            context: context.to_string(),
        };

        let mut errors = self.recent_errors.write().await;
        errors.push(entry);
        if errors.len() > self.max_errors {
            let excess = errors.len() - self.max_errors;
            errors.drain(0..excess);
        }
    }

    pub async fn get_recent_errors(&self) -> Vec<ErrorEntry> {
        self.recent_errors.read().await.clone()
    }

    pub async fn get_error_stats(&self) -> ErrorStatistics {
        let errors = self.recent_errors.read().await;

        let mut stats = ErrorStatistics {
            total: errors.len(),
            ..Default::default()
        };

        for error in errors.iter() {
            match error.severity {
                ErrorSeverity::Critical => stats.critical += 1,
                ErrorSeverity::Error => stats.errors += 1,
                ErrorSeverity::Warning => stats.warnings += 1,
                ErrorSeverity::Info => stats.info += 1,
            }
        }

        stats
    }

    pub async fn clear_errors(&self) {
        self.recent_errors.write().await.clear();
    }
}

impl Default for ImportErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Severity of an import error
pub fn classify_error(error: &ImportError) -> ErrorSeverity {
    match error {
        ImportError::Configuration { .. } | ImportError::IO { .. } => ErrorSeverity::Critical,
        ImportError::Validation { .. } | ImportError::Parse { .. } => ErrorSeverity::Error,
        ImportError::Mapping { .. } | ImportError::Store { .. } => ErrorSeverity::Warning,
        ImportError::Cancelled => ErrorSeverity::Info,
    }
}

/// Error statistics
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ErrorStatistics {
    pub total: usize,
    pub critical: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmark_import_core::{StoreError, ValidationError};

    #[tokio::test]
    async fn test_error_handler_creation() {
        let handler = ImportErrorHandler::new();
        let stats = handler.get_error_stats().await;
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_handle_error() {
        let handler = ImportErrorHandler::new();
        let error: ImportError = ValidationError::EmptyFile {
            file_name: "bookmarks.html".to_string(),
        }
        .into();

        handler.handle_error(&error, "import_file").await;
        handler.handle_error(&ImportError::Cancelled, "import_file").await;

        let errors = handler.get_recent_errors().await;
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].context, "import_file");
        assert_eq!(errors[0].severity, ErrorSeverity::Error);
        assert_eq!(errors[1].severity, ErrorSeverity::Info);
    }

    #[test]
    fn test_classification() {
        let store: ImportError = StoreError::Unavailable {
            details: "offline".to_string(),
        }
        .into();
        assert_eq!(classify_error(&store), ErrorSeverity::Warning);
        assert_eq!(
            classify_error(&ImportError::Configuration {
                details: "bad".to_string()
            }),
            ErrorSeverity::Critical
        );
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let handler = ImportErrorHandler::with_capacity(3);
        for i in 0..5 {
            handler
                .record(format!("error {}", i), ErrorSeverity::Warning, "batch")
                .await;
        }
        let errors = handler.get_recent_errors().await;
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].error, "error 2");

        let stats = handler.get_error_stats().await;
        assert_eq!(stats.warnings, 3);

        handler.clear_errors().await;
        assert_eq!(handler.get_error_stats().await.total, 0);
    }
}

//! Import service facade
//!
//! Wires configuration, logging, error bookkeeping and the orchestrator
//! together for applications that import bookmark files from disk.

use crate::config::AppConfig;
use crate::error_handler::{ErrorSeverity, ImportErrorHandler};
use crate::logger::{ImportLogger, LoggerConfig};
use bookmark_import_core::{DestinationSnapshot, ImportError, Result};
use import_engine::{
    BookmarkStore, CancellationHandle, ImportOrchestrator, ImportPhase, ImportReport,
    NoopProgressSink, ProcessMemoryMonitor, ProgressSink, ResourceMonitor,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Import service
pub struct ImportService {
    config: AppConfig,
    store: Arc<dyn BookmarkStore>,
    monitor: Arc<dyn ResourceMonitor>,
    sink: Arc<dyn ProgressSink>,
    error_handler: Arc<ImportErrorHandler>,
    cancel: CancellationHandle,
}

impl ImportService {
    /// Create a service without touching global logging
    pub fn new(config: AppConfig, store: Arc<dyn BookmarkStore>) -> anyhow::Result<Self> {
        config.validate()?;
        let monitor: Arc<dyn ResourceMonitor> = Arc::new(ProcessMemoryMonitor::new(config.max_memory_mb));
        Ok(Self {
            config,
            store,
            monitor,
            sink: Arc::new(NoopProgressSink),
            error_handler: Arc::new(ImportErrorHandler::new()),
            cancel: CancellationHandle::new(),
        })
    }

    /// Create a service and install the global logger at the configured level
    pub fn initialize(config: AppConfig, store: Arc<dyn BookmarkStore>) -> anyhow::Result<Self> {
        if let Err(e) = ImportLogger::init(LoggerConfig::with_level(config.log_level.clone())) {
            debug!("Keeping existing logger: {}", e);
        }
        info!("Starting bookmark import service");
        Self::new(config, store)
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn ResourceMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn error_handler(&self) -> &Arc<ImportErrorHandler> {
        &self.error_handler
    }

    /// Handle for cancelling the import currently running on this service
    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    /// Read a bookmark file from disk and import it
    pub async fn import_file(
        &self,
        path: impl AsRef<Path>,
        snapshot: &DestinationSnapshot,
    ) -> Result<ImportReport> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = ImportError::from(e);
                self.error_handler.handle_error(&error, "import_file").await;
                return Err(error);
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.import_bytes(&bytes, &file_name, snapshot).await
    }

    /// Import file contents that are already in memory
    pub async fn import_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        snapshot: &DestinationSnapshot,
    ) -> Result<ImportReport> {
        let orchestrator = ImportOrchestrator::new(Arc::clone(&self.store))
            .with_config(self.config.import.clone())
            .with_monitor(Arc::clone(&self.monitor))
            .with_progress_sink(Arc::clone(&self.sink))
            .with_cancellation(self.cancel.clone());

        match orchestrator
            .run(bytes, file_name, snapshot, &self.config.mapping)
            .await
        {
            Ok(report) => {
                for message in &report.errors {
                    self.error_handler
                        .record(message.clone(), ErrorSeverity::Warning, "bookmark_import")
                        .await;
                }
                if report.phase == ImportPhase::Cancelled {
                    self.error_handler
                        .handle_error(&ImportError::Cancelled, "bookmark_import")
                        .await;
                }
                Ok(report)
            }
            Err(e) => {
                self.error_handler.handle_error(&e, "bookmark_import").await;
                Err(e)
            }
        }
    }
}

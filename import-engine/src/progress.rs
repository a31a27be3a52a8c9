//! Import progress state machine and reporting seam

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Phase of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Validation,
    Parsing,
    FolderCreation,
    BookmarkImport,
    Finalization,
    Completed,
    Cancelled,
    Error,
}

impl ImportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportPhase::Completed | ImportPhase::Cancelled | ImportPhase::Error
        )
    }

    /// Phases advance linearly; cancelled and error are reachable from
    /// every non-terminal phase
    pub fn can_transition_to(&self, next: ImportPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            ImportPhase::Cancelled | ImportPhase::Error => true,
            _ => self.next() == Some(next),
        }
    }

    fn next(&self) -> Option<ImportPhase> {
        match self {
            ImportPhase::Validation => Some(ImportPhase::Parsing),
            ImportPhase::Parsing => Some(ImportPhase::FolderCreation),
            ImportPhase::FolderCreation => Some(ImportPhase::BookmarkImport),
            ImportPhase::BookmarkImport => Some(ImportPhase::Finalization),
            ImportPhase::Finalization => Some(ImportPhase::Completed),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImportPhase::Validation => "validation",
            ImportPhase::Parsing => "parsing",
            ImportPhase::FolderCreation => "folder-creation",
            ImportPhase::BookmarkImport => "bookmark-import",
            ImportPhase::Finalization => "finalization",
            ImportPhase::Completed => "completed",
            ImportPhase::Cancelled => "cancelled",
            ImportPhase::Error => "error",
        }
    }
}

/// Running counters of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub folders_created: usize,
    pub folders_failed: usize,
    pub folders_merged: usize,
    pub bookmarks_imported: usize,
    pub bookmarks_failed: usize,
    pub duplicates_skipped: usize,
    pub errors_encountered: usize,
}

impl ImportStatistics {
    /// Bookmarks accounted for so far
    pub fn bookmarks_processed(&self) -> usize {
        self.bookmarks_imported + self.duplicates_skipped + self.bookmarks_failed
    }
}

/// Progress of one import run. Owned and mutated by the orchestrator only;
/// sinks receive shared references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProgress {
    pub run_id: Uuid,
    pub phase: ImportPhase,
    /// Bookmark creation requests finished in the bookmark-import phase
    pub processed_count: usize,
    pub total_count: usize,
    pub percentage: f64,
    pub statistics: ImportStatistics,
    pub cancel_requested: bool,
    pub can_cancel: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Bookmarks per second
    pub processing_speed: f64,
    pub estimated_time_remaining_ms: Option<u64>,
    pub current_batch: usize,
    pub total_batches: usize,
}

impl ImportProgress {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            phase: ImportPhase::Validation,
            processed_count: 0,
            total_count: 0,
            percentage: 0.0,
            statistics: ImportStatistics::default(),
            cancel_requested: false,
            can_cancel: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            processing_speed: 0.0,
            estimated_time_remaining_ms: None,
            current_batch: 0,
            total_batches: 0,
        }
    }

    /// Move to `next`; illegal transitions are logged and ignored
    pub fn transition(&mut self, next: ImportPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            warn!(
                "Ignoring illegal phase transition {} -> {}",
                self.phase.name(),
                next.name()
            );
            return false;
        }
        self.phase = next;
        self.can_cancel = matches!(
            next,
            ImportPhase::Validation | ImportPhase::Parsing | ImportPhase::BookmarkImport
        );
        true
    }

    /// Record a recoverable error
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.statistics.errors_encountered += 1;
        self.errors.push(message.into());
    }

    /// Update counters derived from `processed_count` and the elapsed time
    pub fn update_rate(&mut self, elapsed_ms: u64) {
        self.percentage = if self.total_count == 0 {
            100.0
        } else {
            (self.processed_count as f64 / self.total_count as f64 * 100.0).min(100.0)
        };

        if self.processed_count == 0 || elapsed_ms == 0 {
            self.processing_speed = 0.0;
            self.estimated_time_remaining_ms = None;
            return;
        }

        let ms_per_item = elapsed_ms as f64 / self.processed_count as f64;
        self.processing_speed = 1000.0 / ms_per_item;
        let remaining = self.total_count.saturating_sub(self.processed_count);
        self.estimated_time_remaining_ms = Some((remaining as f64 * ms_per_item).round() as u64);
    }
}

/// Receives progress updates: one per phase transition and one per batch
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &ImportProgress);
}

/// Sink that drops every update
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_progress(&self, _progress: &ImportProgress) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&ImportProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &ImportProgress) {
        self(progress)
    }
}

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    flag: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; honoured at the next batch boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Withdraw a pending request so the next run starts uncancelled
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

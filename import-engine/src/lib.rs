//! Import execution
//!
//! Runs a bookmark import against a destination [`BookmarkStore`]:
//! validation, parsing, reconciliation, parent-first folder creation and
//! batched bookmark creation with backpressure and cooperative cancellation.
//!
//! # Features
//! - Phase state machine with progress reporting per phase and per batch
//! - Concurrent bookmark creation within a batch, sequential across batches
//! - Batch shrinking driven by an injectable [`ResourceMonitor`]
//! - Optional background metadata enrichment
//! - In-memory store with failure injection

pub mod config;
pub mod progress;
pub mod store;
pub mod monitor;
pub mod batch;
pub mod orchestrator;

pub use config::ImportConfig;
pub use progress::{
    CancellationHandle, ImportPhase, ImportProgress, ImportStatistics, NoopProgressSink,
    ProgressSink,
};
pub use store::{BookmarkStore, MemoryBookmarkStore, StoredBookmark};
pub use monitor::{FixedPressureMonitor, PressureLevel, ProcessMemoryMonitor, ResourceMonitor};
pub use batch::{initial_batch_size, next_batch_size};
pub use orchestrator::{ImportOrchestrator, ImportReport};

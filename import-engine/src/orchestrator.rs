//! Import Orchestrator
//!
//! Drives one import run through its phases:
//! validation, parsing, folder creation, bookmark import, finalization.
//!
//! Fatal problems (bad file, parse failure) end the run in the `error`
//! phase before anything is written. Per-item store failures are recorded
//! and the run continues. Cancellation is cooperative: it is honoured before
//! folder creation starts and at every bookmark batch boundary, never in the
//! middle of a batch.

use crate::batch::{initial_batch_size, next_batch_size};
use crate::config::ImportConfig;
use crate::monitor::{ProcessMemoryMonitor, ResourceMonitor};
use crate::progress::{
    CancellationHandle, ImportPhase, ImportProgress, ImportStatistics, NoopProgressSink,
    ProgressSink,
};
use crate::store::BookmarkStore;
use bookmark_import_core::*;
use bookmark_parser::{parse_bookmarks, FormatDetector};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use import_planner::{
    BookmarkAnalysis, CreateBookmarkRequest, CreateFolderRequest, FolderTarget, MappingOptions,
    MappingResult, MappingStatistics, StructuralMapper, TreeAnalyzer,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Outcome of an import run that reached a terminal phase without a fatal error
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    /// `Completed` or `Cancelled`
    pub phase: ImportPhase,
    pub statistics: ImportStatistics,
    /// Bookmarks found in the parsed file
    pub expected_bookmarks: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub analysis: Option<BookmarkAnalysis>,
    pub mapping: Option<MappingStatistics>,
    /// Size of every bookmark batch that was executed, in order
    pub batch_sizes: Vec<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    /// Completed without a single recorded error
    pub fn is_clean(&self) -> bool {
        self.phase == ImportPhase::Completed && self.errors.is_empty()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// One sentence describing the outcome with concrete counts
    pub fn summary(&self) -> String {
        let s = &self.statistics;
        let counts = format!(
            "{} folders created, {} bookmarks imported, {} skipped as duplicates, {} failed",
            s.folders_created, s.bookmarks_imported, s.duplicates_skipped, s.bookmarks_failed
        );
        match self.phase {
            ImportPhase::Cancelled => format!("Import cancelled: {}", counts),
            _ if self.errors.is_empty() => format!("Import completed cleanly: {}", counts),
            _ => format!(
                "Import completed with {} errors: {}",
                self.errors.len(),
                counts
            ),
        }
    }
}

/// Import Orchestrator
pub struct ImportOrchestrator {
    store: Arc<dyn BookmarkStore>,
    monitor: Arc<dyn ResourceMonitor>,
    sink: Arc<dyn ProgressSink>,
    config: ImportConfig,
    analyzer: TreeAnalyzer,
    cancel: CancellationHandle,
}

impl ImportOrchestrator {
    /// Create an orchestrator writing into `store` with default settings
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self {
            store,
            monitor: Arc::new(ProcessMemoryMonitor::default()),
            sink: Arc::new(NoopProgressSink),
            config: ImportConfig::default(),
            analyzer: TreeAnalyzer::new(),
            cancel: CancellationHandle::new(),
        }
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn ResourceMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share a cancellation flag created elsewhere (usually by the UI)
    pub fn with_cancellation(mut self, cancel: CancellationHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Handle for requesting cancellation of the running import.
    /// A request is scoped to one run: the flag is cleared when that run ends,
    /// whatever its outcome. A request made while no run is active applies to
    /// the next one.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    /// Import raw file bytes
    pub async fn run(
        &self,
        bytes: &[u8],
        file_name: &str,
        snapshot: &DestinationSnapshot,
        options: &MappingOptions,
    ) -> Result<ImportReport> {
        self.config.validate()?;
        let run_id = Uuid::new_v4();

        let result = async move {
            let mut run = RunState::new(run_id, self.sink.as_ref(), &self.cancel);
            info!(file = file_name, size = bytes.len(), "Starting bookmark import");
            run.push();

            let checked =
                match FormatDetector::check(bytes, file_name, self.config.max_file_size_bytes) {
                    Ok(checked) => checked,
                    Err(e) => return Err(run.fail(e.into())),
                };
            run.progress.warnings.extend(checked.detection.warnings.iter().cloned());
            debug!(
                file_type = ?checked.detection.file_type,
                browser = checked.detection.browser_guess.name(),
                "Format detected"
            );

            run.advance(ImportPhase::Parsing);
            let mut tree = match parse_bookmarks(&checked.content, checked.detection.file_type) {
                Ok(tree) => tree,
                Err(e) => return Err(run.fail(e.into())),
            };
            if tree.source_browser == SourceBrowser::Unknown {
                tree.source_browser = checked.detection.browser_guess;
            }

            self.execute(run, &tree, snapshot, options).await
        }
        .instrument(info_span!("bookmark_import", %run_id))
        .await;

        self.cancel.reset();
        result
    }

    /// Import an already parsed tree
    pub async fn import_tree(
        &self,
        tree: &ImportTree,
        snapshot: &DestinationSnapshot,
        options: &MappingOptions,
    ) -> Result<ImportReport> {
        self.config.validate()?;
        let run_id = Uuid::new_v4();

        let result = async move {
            let mut run = RunState::new(run_id, self.sink.as_ref(), &self.cancel);
            info!(bookmarks = tree.total_bookmarks, "Starting import of parsed tree");
            run.push();
            run.advance(ImportPhase::Parsing);
            self.execute(run, tree, snapshot, options).await
        }
        .instrument(info_span!("bookmark_import", %run_id))
        .await;

        self.cancel.reset();
        result
    }

    /// Everything after the file has been parsed
    async fn execute(
        &self,
        mut run: RunState<'_>,
        tree: &ImportTree,
        snapshot: &DestinationSnapshot,
        options: &MappingOptions,
    ) -> Result<ImportReport> {
        if let Err(e) = tree.validate() {
            return Err(run.fail(e.into()));
        }

        let analysis = self.analyzer.analyze(tree);
        run.progress.warnings.extend(analysis.warnings.iter().cloned());
        run.expected = tree.total_bookmarks;
        run.analysis = Some(analysis);

        let mapping = StructuralMapper::new(options.clone()).map(tree, snapshot);
        run.record_mapping(&mapping);

        if self.cancel.is_cancelled() {
            return Ok(run.cancel());
        }

        run.advance(ImportPhase::FolderCreation);
        let created = self.create_folders(&mapping.folder_requests, &mut run).await;

        run.advance(ImportPhase::BookmarkImport);
        let mut enrichment = JoinSet::new();
        let finished = self
            .import_bookmarks(&mapping.bookmark_requests, &created, &mut run, &mut enrichment)
            .await;

        if !finished {
            self.settle_enrichment(&mut enrichment, &mut run).await;
            return Ok(run.cancel());
        }

        run.advance(ImportPhase::Finalization);
        self.settle_enrichment(&mut enrichment, &mut run).await;

        let processed = run.progress.statistics.bookmarks_processed();
        if processed != run.expected {
            warn!(expected = run.expected, processed, "Bookmark count mismatch");
            run.progress.record_error(format!(
                "Expected {} bookmarks but accounted for {}",
                run.expected, processed
            ));
        }

        run.advance(ImportPhase::Completed);
        let report = run.finish();
        info!("{}", report.summary());
        Ok(report)
    }

    /// Create folders sequentially in request order. Returns the
    /// original path of every created folder mapped to its new id.
    async fn create_folders(
        &self,
        requests: &[CreateFolderRequest],
        run: &mut RunState<'_>,
    ) -> HashMap<String, FolderRef> {
        let mut created = HashMap::new();

        for request in requests {
            let parent = match &request.parent {
                None => None,
                Some(FolderTarget::Existing(id)) => Some(id.clone()),
                Some(FolderTarget::Pending(parent_path)) => match created.get(parent_path) {
                    Some(id) => Some(FolderRef::clone(id)),
                    None => {
                        debug!(path = %request.original_path, "Skipping folder below a failed parent");
                        run.progress.statistics.folders_failed += 1;
                        run.progress.record_error(
                            MappingError::UnresolvedParent {
                                path: request.original_path.clone(),
                                parent_path: parent_path.clone(),
                            }
                            .to_string(),
                        );
                        continue;
                    }
                },
            };

            match self
                .store
                .create_folder(
                    &request.name,
                    parent.as_ref(),
                    &request.icon_hint,
                    &request.color_hint,
                )
                .await
            {
                Ok(id) => {
                    debug!(path = %request.original_path, id = %id, "Folder created");
                    run.progress.statistics.folders_created += 1;
                    created.insert(request.original_path.clone(), id);
                }
                Err(e) => {
                    warn!(path = %request.original_path, "Folder creation failed: {}", e);
                    run.progress.statistics.folders_failed += 1;
                    run.progress.record_error(e.to_string());
                }
            }
        }

        info!(
            created = run.progress.statistics.folders_created,
            failed = run.progress.statistics.folders_failed,
            "Folder creation finished"
        );
        created
    }

    /// Run the bookmark batches. Returns false when cancelled.
    async fn import_bookmarks(
        &self,
        requests: &[CreateBookmarkRequest],
        created: &HashMap<String, FolderRef>,
        run: &mut RunState<'_>,
        enrichment: &mut JoinSet<std::result::Result<(), StoreError>>,
    ) -> bool {
        let total = requests.len();
        let mut batch_size = initial_batch_size(total, self.monitor.sample(), &self.config);
        let started = Instant::now();
        let mut offset = 0;

        run.progress.total_count = total;
        run.progress.total_batches = total.div_ceil(batch_size);

        while offset < total {
            if self.cancel.is_cancelled() {
                info!(processed = offset, total, "Cancellation requested, stopping before next batch");
                return false;
            }

            let end = (offset + batch_size).min(total);
            let batch = &requests[offset..end];
            run.progress.current_batch += 1;
            run.batch_sizes.push(batch.len());
            debug!(
                batch = run.progress.current_batch,
                batch_size = batch.len(),
                "Dispatching bookmark batch"
            );

            let outcomes: Vec<(&CreateBookmarkRequest, std::result::Result<BookmarkRef, StoreError>)> =
                stream::iter(batch)
                    .map(|request| {
                        let folder = resolve_folder(request.folder.as_ref(), created);
                        async move {
                            let outcome = self
                                .store
                                .create_bookmark(
                                    &request.title,
                                    &request.url,
                                    request.description.as_deref(),
                                    &request.tags,
                                    folder.as_ref(),
                                )
                                .await;
                            (request, outcome)
                        }
                    })
                    .buffer_unordered(batch.len())
                    .collect()
                    .await;

            for (request, outcome) in outcomes {
                match outcome {
                    Ok(id) => {
                        run.progress.statistics.bookmarks_imported += 1;
                        if self.config.enrich_metadata {
                            let store = Arc::clone(&self.store);
                            let url = request.url.clone();
                            enrichment.spawn(async move { store.enrich_metadata(&id, &url).await });
                        }
                    }
                    Err(e) => {
                        warn!(url = %request.url, "Bookmark creation failed: {}", e);
                        run.progress.statistics.bookmarks_failed += 1;
                        run.progress.record_error(e.to_string());
                    }
                }
            }

            offset = end;
            run.progress.processed_count = offset;
            run.progress.update_rate(started.elapsed().as_millis() as u64);

            let pressure = self.monitor.sample();
            let next = next_batch_size(batch_size, pressure, &self.config);
            if pressure.is_elevated() {
                debug!(?pressure, from = batch_size, to = next, "Shrinking batch size");
                tokio::time::sleep(Duration::from_millis(self.config.reclaim_pause_ms)).await;
            }
            batch_size = next;
            run.progress.total_batches =
                run.progress.current_batch + (total - offset).div_ceil(batch_size);
            run.push();
        }

        true
    }

    /// Join or detach background enrichment depending on the configuration
    async fn settle_enrichment(
        &self,
        enrichment: &mut JoinSet<std::result::Result<(), StoreError>>,
        run: &mut RunState<'_>,
    ) {
        if enrichment.is_empty() {
            return;
        }
        if !self.config.await_enrichment {
            debug!(pending = enrichment.len(), "Leaving metadata enrichment in the background");
            enrichment.detach_all();
            return;
        }

        while let Some(joined) = enrichment.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => run.progress.warnings.push(e.to_string()),
                Err(e) => run
                    .progress
                    .warnings
                    .push(format!("Metadata enrichment task failed: {}", e)),
            }
        }
    }
}

fn resolve_folder(
    target: Option<&FolderTarget>,
    created: &HashMap<String, FolderRef>,
) -> Option<FolderRef> {
    match target? {
        FolderTarget::Existing(id) => Some(id.clone()),
        // Folder failed to create: the bookmark goes to the root
        FolderTarget::Pending(path) => created.get(path).cloned(),
    }
}

/// Mutable state of one run, owned by the orchestrator task
struct RunState<'a> {
    progress: ImportProgress,
    sink: &'a dyn ProgressSink,
    cancel: &'a CancellationHandle,
    expected: usize,
    analysis: Option<BookmarkAnalysis>,
    mapping: Option<MappingStatistics>,
    batch_sizes: Vec<usize>,
    started_at: DateTime<Utc>,
}

impl<'a> RunState<'a> {
    fn new(run_id: Uuid, sink: &'a dyn ProgressSink, cancel: &'a CancellationHandle) -> Self {
        Self {
            progress: ImportProgress::new(run_id),
            sink,
            cancel,
            expected: 0,
            analysis: None,
            mapping: None,
            batch_sizes: Vec::new(),
            started_at: Utc::now(),
        }
    }

    fn push(&mut self) {
        if self.cancel.is_cancelled() {
            self.progress.cancel_requested = true;
        }
        self.sink.on_progress(&self.progress);
    }

    fn advance(&mut self, next: ImportPhase) {
        if self.progress.transition(next) {
            info!(phase = next.name(), "Import phase changed");
            self.push();
        }
    }

    fn record_mapping(&mut self, mapping: &MappingResult) {
        let stats = &mut self.progress.statistics;
        stats.folders_merged = mapping.statistics.folders_merged;
        stats.duplicates_skipped = mapping.statistics.bookmarks_skipped;

        for e in &mapping.errors {
            if e.affects_bookmark() {
                self.progress.statistics.bookmarks_failed += 1;
            } else {
                self.progress.statistics.folders_failed += 1;
            }
            self.progress.record_error(e.to_string());
        }
        self.mapping = Some(mapping.statistics.clone());
    }

    /// End the run with a fatal error
    fn fail(mut self, e: ImportError) -> ImportError {
        error!(phase = self.progress.phase.name(), "Import failed: {}", e);
        self.progress.errors.push(e.user_message());
        self.advance(ImportPhase::Error);
        e
    }

    fn cancel(mut self) -> ImportReport {
        self.progress.cancel_requested = true;
        self.advance(ImportPhase::Cancelled);
        self.finish()
    }

    fn finish(self) -> ImportReport {
        ImportReport {
            run_id: self.progress.run_id,
            phase: self.progress.phase,
            statistics: self.progress.statistics,
            expected_bookmarks: self.expected,
            errors: self.progress.errors,
            warnings: self.progress.warnings,
            analysis: self.analysis,
            mapping: self.mapping,
            batch_sizes: self.batch_sizes,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

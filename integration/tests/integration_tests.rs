//! End-to-end tests: bookmark files on disk through the import service into
//! an in-memory destination store.

use bookmark_import_core::*;
use import_engine::*;
use integration::*;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

const FIREFOX_EXPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<!-- This is an automatically generated file. -->
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks Menu</H1>
<DL><p>
    <DT><H3 ADD_DATE="1600000000" LAST_MODIFIED="1600000001">Web Dev</H3>
    <DL><p>
        <DT><A HREF="https://developer.mozilla.org/en-US/docs/Web" ADD_DATE="1600000002" LAST_CHARSET="UTF-8" TAGS="reference,web">MDN</A>
        <DD>The web reference
        <DT><H3>Rust</H3>
        <DL><p>
            <DT><A HREF="https://docs.rs" ADD_DATE="1600000003">Docs.rs</A>
            <DT><A HREF="https://crates.io">crates.io</A>
        </DL><p>
    </DL><p>
    <DT><A HREF="place:sort=8&maxResults=10">Recently Bookmarked</A>
    <DT><A HREF="https://news.ycombinator.com">Hacker News</A>
</DL><p>
"#;

const CHROME_EXPORT: &str = r#"{
  "checksum": "abc123",
  "roots": {
    "bookmark_bar": {
      "children": [
        { "date_added": "13250000000000000", "name": "Rust", "type": "url", "url": "https://www.rust-lang.org" },
        { "children": [
            { "name": "Tokio", "type": "url", "url": "https://tokio.rs" }
          ], "name": "Async", "type": "folder" }
      ],
      "name": "Bookmarks bar",
      "type": "folder"
    },
    "other": { "children": [], "name": "Other bookmarks", "type": "folder" },
    "synced": {
      "children": [
        { "name": "Phone link", "type": "url", "url": "https://m.example.com" }
      ],
      "name": "Mobile bookmarks",
      "type": "folder"
    }
  },
  "version": 1
}"#;

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn quiet_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.import.reclaim_pause_ms = 0;
    config
}

fn service(store: Arc<MemoryBookmarkStore>) -> ImportService {
    ImportService::new(quiet_config(), store)
        .unwrap()
        .with_monitor(Arc::new(FixedPressureMonitor(PressureLevel::Low)))
}

// ============================================================================
// File imports
// ============================================================================

#[tokio::test]
async fn test_import_firefox_html_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bookmarks.html", FIREFOX_EXPORT.as_bytes());
    let store = Arc::new(MemoryBookmarkStore::new());

    let report = service(store.clone())
        .import_file(&path, &DestinationSnapshot::default())
        .await
        .unwrap();

    assert_eq!(report.phase, ImportPhase::Completed);
    assert_eq!(report.expected_bookmarks, 4);
    assert_eq!(report.statistics.bookmarks_imported, 4);
    assert_eq!(report.statistics.folders_created, 2);
    assert!(report.is_clean());

    let analysis = report.analysis.as_ref().unwrap();
    assert_eq!(analysis.skipped_links, 1);
    assert_eq!(analysis.max_depth, 1);

    let folders = store.folders().await;
    let web_dev = folders.iter().find(|f| f.name == "Web Dev").unwrap();
    let rust = folders.iter().find(|f| f.name == "Rust").unwrap();
    assert_eq!(rust.parent.as_ref(), Some(&web_dev.id));

    let bookmarks = store.bookmarks().await;
    let mdn = bookmarks.iter().find(|b| b.title == "MDN").unwrap();
    assert_eq!(mdn.description.as_deref(), Some("The web reference"));
    assert_eq!(mdn.tags, vec!["reference", "web"]);
    assert_eq!(mdn.folder.as_ref(), Some(&web_dev.id));

    let hn = bookmarks.iter().find(|b| b.title == "Hacker News").unwrap();
    assert_eq!(hn.folder, None);
}

#[tokio::test]
async fn test_import_chrome_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "Bookmarks", CHROME_EXPORT.as_bytes());
    let store = Arc::new(MemoryBookmarkStore::new());

    let report = service(store.clone())
        .import_file(&path, &DestinationSnapshot::default())
        .await
        .unwrap();

    assert_eq!(report.phase, ImportPhase::Completed);
    assert_eq!(report.statistics.bookmarks_imported, 3);
    // Bookmarks bar, Async and Mobile bookmarks; the empty root is skipped
    assert_eq!(report.statistics.folders_created, 3);

    let names: Vec<String> = store.folders().await.into_iter().map(|f| f.name).collect();
    assert!(names.contains(&"Mobile bookmarks".to_string()));
    assert!(!names.contains(&"Other bookmarks".to_string()));
}

#[tokio::test]
async fn test_auto_tags_and_default_folder() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bookmarks.html", FIREFOX_EXPORT.as_bytes());
    let inbox = ExistingFolder {
        id: FolderRef::new("inbox"),
        name: "Imported".to_string(),
        parent: None,
    };
    let store = Arc::new(MemoryBookmarkStore::with_folders(vec![inbox.clone()]));

    let mut config = quiet_config();
    config.mapping.auto_generate_tags = true;
    config.mapping.preserve_folder_structure = false;
    config.mapping.default_folder_ref = Some(inbox.id.clone());
    let service = ImportService::new(config, store.clone()).unwrap();

    let report = service
        .import_file(&path, &store.snapshot().await)
        .await
        .unwrap();
    assert_eq!(report.statistics.folders_created, 0);

    let bookmarks = store.bookmarks().await;
    assert!(bookmarks.iter().all(|b| b.folder.as_ref() == Some(&inbox.id)));
    let hn = bookmarks.iter().find(|b| b.title == "Hacker News").unwrap();
    assert_eq!(hn.tags, vec!["news", "tech"]);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bookmarks.html", FIREFOX_EXPORT.as_bytes());
    let store = Arc::new(MemoryBookmarkStore::new());
    let service = service(store.clone());

    service
        .import_file(&path, &store.snapshot().await)
        .await
        .unwrap();
    let second = service
        .import_file(&path, &store.snapshot().await)
        .await
        .unwrap();

    assert_eq!(second.statistics.folders_created, 0);
    assert_eq!(second.statistics.folders_merged, 2);
    assert_eq!(second.statistics.bookmarks_imported, 0);
    assert_eq!(second.statistics.duplicates_skipped, 4);
    assert_eq!(store.folders().await.len(), 2);
    assert_eq!(store.bookmarks().await.len(), 4);
}

#[tokio::test]
async fn test_store_failures_are_recorded_as_warnings() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bookmarks.html", FIREFOX_EXPORT.as_bytes());
    let store = Arc::new(MemoryBookmarkStore::new());
    store.fail_on_url("https://docs.rs").await;
    let service = service(store.clone());

    let report = service
        .import_file(&path, &DestinationSnapshot::default())
        .await
        .unwrap();

    assert_eq!(report.phase, ImportPhase::Completed);
    assert_eq!(report.statistics.bookmarks_failed, 1);
    assert_eq!(report.statistics.bookmarks_imported, 3);
    assert!(report.summary().contains("with 1 errors"));

    let stats = service.error_handler().get_error_stats().await;
    assert_eq!(stats.warnings, 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_file_is_critical() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryBookmarkStore::new());
    let service = service(store);

    let result = service
        .import_file(dir.path().join("nope.html"), &DestinationSnapshot::default())
        .await;
    assert!(matches!(result, Err(ImportError::IO { .. })));

    let errors = service.error_handler().get_recent_errors().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].severity, ErrorSeverity::Critical);
}

#[tokio::test]
async fn test_unrecognized_file_is_rejected_before_writing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "notes.txt", b"shopping list: milk, eggs");
    let store = Arc::new(MemoryBookmarkStore::new());
    let service = service(store.clone());

    let error = service
        .import_file(&path, &DestinationSnapshot::default())
        .await
        .unwrap_err();
    assert!(error.is_fatal());
    assert!(error.user_message().contains("not a browser bookmark export"));
    assert_eq!(store.folder_calls() + store.bookmark_calls(), 0);
    assert_eq!(service.error_handler().get_error_stats().await.errors, 1);
}

#[tokio::test]
async fn test_cancelled_import_is_reported_and_next_import_runs() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bookmarks.html", FIREFOX_EXPORT.as_bytes());
    let store = Arc::new(MemoryBookmarkStore::new());
    let service = service(store.clone());

    service.cancellation_handle().cancel();
    let report = service
        .import_file(&path, &DestinationSnapshot::default())
        .await
        .unwrap();

    assert_eq!(report.phase, ImportPhase::Cancelled);
    assert_eq!(store.bookmark_calls(), 0);
    assert_eq!(service.error_handler().get_error_stats().await.info, 1);

    let retry = service
        .import_file(&path, &DestinationSnapshot::default())
        .await
        .unwrap();
    assert_eq!(retry.phase, ImportPhase::Completed);
    assert_eq!(retry.statistics.bookmarks_imported, 4);
    assert_eq!(store.bookmarks().await.len(), 4);
}

// ============================================================================
// Configuration and progress
// ============================================================================

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"log_level": "debug", "import": {{"max_batch_size": 25}}, "mapping": {{"merge_folders": false}}}}"#
    )
    .unwrap();

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.import.max_batch_size, 25);
    assert_eq!(config.import.min_batch_size, 5);
    assert!(!config.mapping.merge_folders);
    assert!(config.mapping.skip_duplicates);
}

#[test]
fn test_config_errors_carry_context() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let error = AppConfig::from_file(file.path()).unwrap_err();
    assert!(error.to_string().contains("failed to parse config file"));

    let missing = AppConfig::from_file("/definitely/not/here.json").unwrap_err();
    assert!(missing.to_string().contains("failed to read config file"));
}

#[tokio::test]
async fn test_large_import_under_pressure() {
    let mut html = String::from("<!DOCTYPE NETSCAPE-Bookmark-file-1>\n<DL><p>\n");
    for i in 0..6000 {
        html.push_str(&format!(
            "<DT><A HREF=\"https://site{}.example\">Site {}</A>\n",
            i, i
        ));
    }
    html.push_str("</DL><p>\n");

    let phases = Arc::new(Mutex::new(Vec::new()));
    let seen = phases.clone();
    let sink = move |p: &ImportProgress| {
        let mut phases = seen.lock().unwrap();
        if phases.last() != Some(&p.phase) {
            phases.push(p.phase);
        }
    };

    let store = Arc::new(MemoryBookmarkStore::new());
    let service = ImportService::new(quiet_config(), store.clone())
        .unwrap()
        .with_monitor(Arc::new(FixedPressureMonitor(PressureLevel::High)))
        .with_progress_sink(Arc::new(sink));

    let report = service
        .import_bytes(html.as_bytes(), "big.html", &DestinationSnapshot::default())
        .await
        .unwrap();

    assert_eq!(report.statistics.bookmarks_imported, 6000);
    assert!(report.warnings.iter().any(|w| w.starts_with("Large import")));
    assert!(report.batch_sizes.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(report.batch_sizes[0], 70);
    assert_eq!(*report.batch_sizes.last().unwrap(), 5);
    assert_eq!(store.bookmarks().await.len(), 6000);
    assert_eq!(phases.lock().unwrap().last(), Some(&ImportPhase::Completed));
}

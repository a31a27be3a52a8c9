//! Destination store seam
//!
//! The orchestrator writes through [`BookmarkStore`]; every call may fail
//! with a recoverable [`StoreError`]. [`MemoryBookmarkStore`] keeps
//! everything in memory and supports failure injection for tests and
//! dry runs.

use async_trait::async_trait;
use bookmark_import_core::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Destination collection the import writes into
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderRef>,
        icon_hint: &str,
        color_hint: &str,
    ) -> std::result::Result<FolderRef, StoreError>;

    async fn create_bookmark(
        &self,
        title: &str,
        url: &str,
        description: Option<&str>,
        tags: &[String],
        folder: Option<&FolderRef>,
    ) -> std::result::Result<BookmarkRef, StoreError>;

    /// Best-effort metadata fetch for a created bookmark
    async fn enrich_metadata(
        &self,
        _bookmark: &BookmarkRef,
        _url: &str,
    ) -> std::result::Result<(), StoreError> {
        Ok(())
    }
}

/// A bookmark held by [`MemoryBookmarkStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBookmark {
    pub id: BookmarkRef,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub folder: Option<FolderRef>,
}

/// In-memory destination
#[derive(Default)]
pub struct MemoryBookmarkStore {
    folders: RwLock<Vec<ExistingFolder>>,
    bookmarks: RwLock<Vec<StoredBookmark>>,
    enriched: RwLock<Vec<BookmarkRef>>,
    failing_urls: RwLock<HashSet<String>>,
    failing_folders: RwLock<HashSet<String>>,
    bookmark_calls: AtomicUsize,
    folder_calls: AtomicUsize,
}

impl MemoryBookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing folders
    pub fn with_folders(folders: Vec<ExistingFolder>) -> Self {
        Self {
            folders: RwLock::new(folders),
            ..Default::default()
        }
    }

    /// Make every `create_bookmark` call for this URL fail
    pub async fn fail_on_url(&self, url: &str) {
        self.failing_urls.write().await.insert(normalize_url(url));
    }

    /// Make every `create_folder` call with this name fail
    pub async fn fail_on_folder(&self, name: &str) {
        self.failing_folders.write().await.insert(name.to_string());
    }

    pub async fn folders(&self) -> Vec<ExistingFolder> {
        self.folders.read().await.clone()
    }

    pub async fn bookmarks(&self) -> Vec<StoredBookmark> {
        self.bookmarks.read().await.clone()
    }

    pub async fn enriched(&self) -> Vec<BookmarkRef> {
        self.enriched.read().await.clone()
    }

    /// Number of `create_bookmark` calls, failed ones included
    pub fn bookmark_calls(&self) -> usize {
        self.bookmark_calls.load(Ordering::SeqCst)
    }

    pub fn folder_calls(&self) -> usize {
        self.folder_calls.load(Ordering::SeqCst)
    }

    /// Current contents as a reconciliation snapshot
    pub async fn snapshot(&self) -> DestinationSnapshot {
        let urls: Vec<String> = self
            .bookmarks
            .read()
            .await
            .iter()
            .map(|b| b.url.clone())
            .collect();
        DestinationSnapshot::new(self.folders().await).with_bookmark_urls(urls)
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderRef>,
        _icon_hint: &str,
        _color_hint: &str,
    ) -> std::result::Result<FolderRef, StoreError> {
        self.folder_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_folders.read().await.contains(name) {
            return Err(StoreError::FolderCreationFailed {
                name: name.to_string(),
                reason: "rejected by store".to_string(),
            });
        }

        let mut folders = self.folders.write().await;
        if let Some(parent) = parent {
            if !folders.iter().any(|f| &f.id == parent) {
                return Err(StoreError::FolderCreationFailed {
                    name: name.to_string(),
                    reason: format!("parent {} does not exist", parent),
                });
            }
        }

        let id = FolderRef::new(Uuid::new_v4().to_string());
        folders.push(ExistingFolder {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.cloned(),
        });
        Ok(id)
    }

    async fn create_bookmark(
        &self,
        title: &str,
        url: &str,
        description: Option<&str>,
        tags: &[String],
        folder: Option<&FolderRef>,
    ) -> std::result::Result<BookmarkRef, StoreError> {
        self.bookmark_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_urls.read().await.contains(&normalize_url(url)) {
            return Err(StoreError::BookmarkCreationFailed {
                url: url.to_string(),
                reason: "rejected by store".to_string(),
            });
        }

        let id = BookmarkRef::new(Uuid::new_v4().to_string());
        self.bookmarks.write().await.push(StoredBookmark {
            id: id.clone(),
            title: title.to_string(),
            url: url.to_string(),
            description: description.map(str::to_string),
            tags: tags.to_vec(),
            folder: folder.cloned(),
        });
        Ok(id)
    }

    async fn enrich_metadata(
        &self,
        bookmark: &BookmarkRef,
        _url: &str,
    ) -> std::result::Result<(), StoreError> {
        self.enriched.write().await.push(bookmark.clone());
        Ok(())
    }
}

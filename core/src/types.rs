//! Canonical bookmark import model
//!
//! Both file parsers produce an [`ImportTree`]; everything downstream
//! (analysis, reconciliation, execution) works on this format-agnostic shape.
//! Folders reference each other only through their slash-joined `path`,
//! never through destination ids, since nothing exists in the destination yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Separator between folder names in an [`ImportedFolder::path`]
pub const PATH_SEPARATOR: char = '/';

/// Classification of a raw bookmark file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Netscape bookmark file (HTML)
    Html,
    /// Chromium `Bookmarks` JSON
    Json,
    Unknown,
}

/// Browser a bookmark export most likely came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceBrowser {
    Chrome,
    Firefox,
    Edge,
    Safari,
    #[default]
    Unknown,
}

impl SourceBrowser {
    pub fn name(&self) -> &'static str {
        match self {
            SourceBrowser::Chrome => "Chrome",
            SourceBrowser::Firefox => "Firefox",
            SourceBrowser::Edge => "Edge",
            SourceBrowser::Safari => "Safari",
            SourceBrowser::Unknown => "Unknown",
        }
    }
}

/// A single bookmark read from an export file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedBookmark {
    pub title: String,
    pub url: String,
    pub added_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub icon_data_uri: Option<String>,
    pub tags: Vec<String>,
    /// Path of the containing folder, `None` for root-level bookmarks
    pub folder_path: Option<String>,
}

impl ImportedBookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            added_at: None,
            description: None,
            icon_data_uri: None,
            tags: Vec::new(),
            folder_path: None,
        }
    }

    pub fn in_folder(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }
}

/// A folder read from an export file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedFolder {
    pub name: String,
    /// Slash-joined ancestor names plus own name, unique within one tree
    pub path: String,
    /// Number of ancestors
    pub depth: usize,
    pub parent_path: Option<String>,
    pub children: Vec<ImportedFolder>,
    pub bookmarks: Vec<ImportedBookmark>,
}

impl ImportedFolder {
    /// Create an empty folder below `parent_path` (or at the root).
    /// `name` must already be cleaned.
    pub fn new(name: impl Into<String>, parent_path: Option<&str>, depth: usize) -> Self {
        let name = name.into();
        let path = crate::tree::join_path(parent_path, &name);
        Self {
            name,
            path,
            depth,
            parent_path: parent_path.map(str::to_string),
            children: Vec::new(),
            bookmarks: Vec::new(),
        }
    }

    /// Bookmarks in this folder and every descendant
    pub fn total_bookmarks(&self) -> usize {
        self.descendants_and_self().map(|f| f.bookmarks.len()).sum()
    }

    /// Descendant folders, excluding this one
    pub fn total_subfolders(&self) -> usize {
        self.descendants_and_self().count() - 1
    }

    /// This folder and every descendant, depth-first pre-order
    pub fn descendants_and_self(&self) -> impl Iterator<Item = &ImportedFolder> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let folder = stack.pop()?;
            stack.extend(folder.children.iter().rev());
            Some(folder)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty() && self.children.is_empty()
    }
}

/// Parse root of a bookmark export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportTree {
    pub title: String,
    pub root_folders: Vec<ImportedFolder>,
    pub root_bookmarks: Vec<ImportedBookmark>,
    pub total_bookmarks: usize,
    pub total_folders: usize,
    pub source_browser: SourceBrowser,
    /// Links dropped during parsing (unsupported scheme or empty URL)
    #[serde(default)]
    pub skipped_links: usize,
}

impl ImportTree {
    pub fn new(title: impl Into<String>, source_browser: SourceBrowser) -> Self {
        Self {
            title: title.into(),
            root_folders: Vec::new(),
            root_bookmarks: Vec::new(),
            total_bookmarks: 0,
            total_folders: 0,
            source_browser,
            skipped_links: 0,
        }
    }
}

/// Opaque id of a folder in the destination store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderRef(pub String);

impl FolderRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque id of a bookmark in the destination store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookmarkRef(pub String);

impl BookmarkRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A folder that already exists in the destination collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingFolder {
    pub id: FolderRef,
    pub name: String,
    pub parent: Option<FolderRef>,
}

/// Pre-fetched view of the destination collection used for reconciliation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationSnapshot {
    pub folders: Vec<ExistingFolder>,
    /// URLs already bookmarked in the destination, stored normalized
    pub bookmark_urls: HashSet<String>,
}

impl DestinationSnapshot {
    pub fn new(folders: Vec<ExistingFolder>) -> Self {
        Self {
            folders,
            bookmark_urls: HashSet::new(),
        }
    }

    pub fn with_bookmark_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bookmark_urls
            .extend(urls.into_iter().map(|u| normalize_url(u.as_ref())));
        self
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.bookmark_urls.contains(&normalize_url(url))
    }
}

/// Key used for URL duplicate detection: trimmed and lowercased
pub fn normalize_url(url: &str) -> String {
    url.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_url_lookup_is_normalized() {
        let snapshot = DestinationSnapshot::default()
            .with_bookmark_urls(["https://Example.com/Path ", "https://rust-lang.org"]);
        assert!(snapshot.contains_url("  HTTPS://EXAMPLE.COM/path"));
        assert!(snapshot.contains_url("https://rust-lang.org"));
        assert!(!snapshot.contains_url("https://rust-lang.org/learn"));
    }

    #[test]
    fn test_tree_without_skipped_links_field() {
        let json = r#"{
            "title": "Bookmarks",
            "root_folders": [],
            "root_bookmarks": [],
            "total_bookmarks": 0,
            "total_folders": 0,
            "source_browser": "firefox"
        }"#;
        let tree: ImportTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.skipped_links, 0);
        assert_eq!(tree.source_browser, SourceBrowser::Firefox);
    }

    #[test]
    fn test_new_folder_path() {
        let root = ImportedFolder::new("Dev", None, 0);
        assert_eq!(root.path, "Dev");
        assert_eq!(root.parent_path, None);

        let child = ImportedFolder::new("Rust", Some("Dev"), 1);
        assert_eq!(child.path, "Dev/Rust");
        assert_eq!(child.parent_path.as_deref(), Some("Dev"));
        assert!(child.is_empty());
        assert_eq!(FolderRef::new("f-1").to_string(), "f-1");
    }
}

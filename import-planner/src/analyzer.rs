//! Import Tree Analyzer
//!
//! Produces an informational summary of a parsed bookmark export before
//! anything is written: per-folder statistics, a display tree for previews,
//! the number of repeated URLs, a rough size estimate and advisory warnings.
//! Analysis never fails the import.

use bookmark_import_core::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-node markup overhead used by the size estimate
const BOOKMARK_MARKUP_BYTES: usize = 48;
const FOLDER_MARKUP_BYTES: usize = 36;

/// Thresholds for advisory warnings
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Warn when folders nest deeper than this
    pub max_depth: usize,
    /// Warn when an import holds more bookmarks than this
    pub large_import: usize,
    /// Warn when more folders than this are empty
    pub max_empty_folders: usize,
    /// Warn when analysis itself takes longer than this
    pub slow_analysis: Duration,
    /// Display tree folders at or below this depth start collapsed
    pub collapse_depth: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            large_import: 5000,
            max_empty_folders: 10,
            slow_analysis: Duration::from_secs(5),
            collapse_depth: 2,
        }
    }
}

/// Aggregate counts for one folder. The synthetic root entry has depth -1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStatistics {
    pub name: String,
    /// `None` for the synthetic root entry
    pub path: Option<String>,
    pub depth: i32,
    pub direct_bookmarks: usize,
    pub direct_subfolders: usize,
    pub total_bookmarks: usize,
    pub total_subfolders: usize,
    pub is_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeNodeKind {
    Folder,
    Bookmark,
}

/// Denormalized node for previewing an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkTreeNode {
    pub id: String,
    pub kind: TreeNodeKind,
    pub title: String,
    /// Folder path for folders, containing folder path for bookmarks
    /// (empty at the root)
    pub path: String,
    pub children: Vec<BookmarkTreeNode>,
    pub url: Option<String>,
    /// Subtree bookmark count, folders only
    pub bookmark_count: Option<usize>,
    /// UI hint only
    pub collapsed: bool,
}

/// Result of analyzing an import tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkAnalysis {
    pub total_bookmarks: usize,
    pub total_folders: usize,
    pub max_depth: usize,
    pub empty_folders: usize,
    /// Number of distinct URLs that occur more than once
    pub duplicate_urls: usize,
    pub skipped_links: usize,
    pub root_statistics: FolderStatistics,
    /// One entry per folder, depth-first pre-order
    pub folder_statistics: Vec<FolderStatistics>,
    pub display_tree: Vec<BookmarkTreeNode>,
    pub estimated_size_bytes: usize,
    pub estimated_size: String,
    pub warnings: Vec<String>,
    pub analysis_duration_ms: u64,
}

impl BookmarkAnalysis {
    /// Statistics of the folder at `path`
    pub fn statistics_for(&self, path: &str) -> Option<&FolderStatistics> {
        self.folder_statistics
            .iter()
            .find(|s| s.path.as_deref() == Some(path))
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Analyzer for parsed bookmark trees
pub struct TreeAnalyzer {
    config: AnalyzerConfig,
}

impl TreeAnalyzer {
    /// Create a new analyzer with default thresholds
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create a new analyzer with custom thresholds
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a parsed tree
    pub fn analyze(&self, tree: &ImportTree) -> BookmarkAnalysis {
        let start = Instant::now();

        let (root_statistics, folder_statistics) = folder_statistics(tree);
        let display_tree = build_display_tree(tree, self.config.collapse_depth);
        let duplicate_urls = count_duplicate_urls(tree);
        let estimated_size_bytes = estimate_size_bytes(tree);
        let max_depth = tree.max_depth().unwrap_or(0);
        let empty_folders = folder_statistics.iter().filter(|s| s.is_empty).count();

        let mut warnings = Vec::new();
        if tree.total_bookmarks == 0 {
            warnings.push("No bookmarks were found in this file".to_string());
        }
        if max_depth > self.config.max_depth {
            warnings.push(format!(
                "Folders are nested {} levels deep; deep hierarchies are hard to browse",
                max_depth
            ));
        }
        if tree.total_bookmarks > self.config.large_import {
            warnings.push(format!(
                "Large import: {} bookmarks may take a while",
                tree.total_bookmarks
            ));
        }
        if empty_folders > self.config.max_empty_folders {
            warnings.push(format!("{} folders are empty", empty_folders));
        }
        if tree.skipped_links > 0 {
            warnings.push(format!(
                "{} links were skipped because they are not web addresses",
                tree.skipped_links
            ));
        }

        let elapsed = start.elapsed();
        if elapsed > self.config.slow_analysis {
            warnings.push(format!(
                "Analysis took {:.1}s; the import may be slow",
                elapsed.as_secs_f64()
            ));
        }

        debug!(
            "Analyzed {} bookmarks in {} folders: {} duplicate URLs, {} warnings",
            tree.total_bookmarks,
            tree.total_folders,
            duplicate_urls,
            warnings.len()
        );

        BookmarkAnalysis {
            total_bookmarks: tree.total_bookmarks,
            total_folders: tree.total_folders,
            max_depth,
            empty_folders,
            duplicate_urls,
            skipped_links: tree.skipped_links,
            root_statistics,
            folder_statistics,
            display_tree,
            estimated_size_bytes,
            estimated_size: format_size(estimated_size_bytes),
            warnings,
            analysis_duration_ms: elapsed.as_millis() as u64,
        }
    }
}

impl Default for TreeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for the synthetic root plus every folder (pre-order)
pub fn folder_statistics(tree: &ImportTree) -> (FolderStatistics, Vec<FolderStatistics>) {
    fn collect(folder: &ImportedFolder, out: &mut Vec<FolderStatistics>) -> (usize, usize) {
        let index = out.len();
        out.push(FolderStatistics {
            name: folder.name.clone(),
            path: Some(folder.path.clone()),
            depth: folder.depth as i32,
            direct_bookmarks: folder.bookmarks.len(),
            direct_subfolders: folder.children.len(),
            total_bookmarks: 0,
            total_subfolders: 0,
            is_empty: folder.is_empty(),
        });

        let mut bookmarks = folder.bookmarks.len();
        let mut subfolders = folder.children.len();
        for child in &folder.children {
            let (child_bookmarks, child_subfolders) = collect(child, out);
            bookmarks += child_bookmarks;
            subfolders += child_subfolders;
        }

        out[index].total_bookmarks = bookmarks;
        out[index].total_subfolders = subfolders;
        (bookmarks, subfolders)
    }

    let mut stats = Vec::with_capacity(tree.total_folders);
    let mut total_bookmarks = tree.root_bookmarks.len();
    let mut total_subfolders = tree.root_folders.len();
    for folder in &tree.root_folders {
        let (bookmarks, subfolders) = collect(folder, &mut stats);
        total_bookmarks += bookmarks;
        total_subfolders += subfolders;
    }

    let root = FolderStatistics {
        name: tree.title.clone(),
        path: None,
        depth: -1,
        direct_bookmarks: tree.root_bookmarks.len(),
        direct_subfolders: tree.root_folders.len(),
        total_bookmarks,
        total_subfolders,
        is_empty: tree.root_bookmarks.is_empty() && tree.root_folders.is_empty(),
    };
    (root, stats)
}

/// Build preview nodes: subfolders first, then bookmarks, in file order
pub fn build_display_tree(tree: &ImportTree, collapse_depth: usize) -> Vec<BookmarkTreeNode> {
    fn bookmark_node(bookmark: &ImportedBookmark, index: usize) -> BookmarkTreeNode {
        let path = bookmark.folder_path.clone().unwrap_or_default();
        BookmarkTreeNode {
            id: format!("bookmark:{}:{}", path, index),
            kind: TreeNodeKind::Bookmark,
            title: bookmark.title.clone(),
            path,
            children: Vec::new(),
            url: Some(bookmark.url.clone()),
            bookmark_count: None,
            collapsed: false,
        }
    }

    fn folder_node(folder: &ImportedFolder, collapse_depth: usize) -> BookmarkTreeNode {
        let mut children: Vec<BookmarkTreeNode> = folder
            .children
            .iter()
            .map(|child| folder_node(child, collapse_depth))
            .collect();
        children.extend(
            folder
                .bookmarks
                .iter()
                .enumerate()
                .map(|(i, b)| bookmark_node(b, i)),
        );

        BookmarkTreeNode {
            id: format!("folder:{}", folder.path),
            kind: TreeNodeKind::Folder,
            title: folder.name.clone(),
            path: folder.path.clone(),
            children,
            url: None,
            bookmark_count: Some(folder.total_bookmarks()),
            collapsed: folder.depth >= collapse_depth,
        }
    }

    tree.root_folders
        .iter()
        .map(|f| folder_node(f, collapse_depth))
        .chain(
            tree.root_bookmarks
                .iter()
                .enumerate()
                .map(|(i, b)| bookmark_node(b, i)),
        )
        .collect()
}

/// Number of distinct URLs (trimmed, case-insensitive) that appear more than once
pub fn count_duplicate_urls(tree: &ImportTree) -> usize {
    let mut seen = HashSet::new();
    let mut repeated = HashSet::new();

    for bookmark in tree.bookmarks() {
        let key = normalize_url(&bookmark.url);
        if !seen.insert(key.clone()) {
            repeated.insert(key);
        }
    }
    repeated.len()
}

/// Heuristic size of the tree if exported as a bookmark file
pub fn estimate_size_bytes(tree: &ImportTree) -> usize {
    let bookmark_bytes: usize = tree
        .bookmarks()
        .iter()
        .map(|b| {
            b.title.len()
                + b.url.len()
                + b.description.as_ref().map_or(0, String::len)
                + BOOKMARK_MARKUP_BYTES
        })
        .sum();
    let folder_bytes: usize = tree
        .folders()
        .iter()
        .map(|f| f.name.len() + FOLDER_MARKUP_BYTES)
        .sum();
    bookmark_bytes + folder_bytes
}

/// Human readable size ("512 B", "2.5 KB", "1.1 MB")
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value < KB {
        format!("{} B", bytes)
    } else if value < MB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{:.1} MB", value / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(url: &str, folder: Option<&str>) -> ImportedBookmark {
        let b = ImportedBookmark::new(url.trim(), url);
        match folder {
            Some(path) => b.in_folder(path),
            None => b,
        }
    }

    fn sample_tree() -> ImportTree {
        let mut dev = ImportedFolder::new("Dev", None, 0);
        dev.bookmarks.push(bookmark("https://x.com", Some("Dev")));
        let mut tools = ImportedFolder::new("Tools", Some("Dev"), 1);
        tools.bookmarks.push(bookmark("https://tools.dev", Some("Dev/Tools")));
        let mut deep = ImportedFolder::new("Deep", Some("Dev/Tools"), 2);
        deep.bookmarks.push(bookmark("https://deep.dev", Some("Dev/Tools/Deep")));
        tools.children.push(deep);
        dev.children.push(tools);
        let empty = ImportedFolder::new("Empty", None, 0);

        let mut tree = ImportTree::new("Bookmarks", SourceBrowser::Firefox);
        tree.root_folders = vec![dev, empty];
        tree.root_bookmarks.push(bookmark(" HTTPS://X.COM ", None));
        tree.root_bookmarks.push(bookmark("https://y.com", None));
        tree.recount();
        tree
    }

    #[test]
    fn test_folder_statistics_roll_up() {
        let tree = sample_tree();
        let (root, stats) = folder_statistics(&tree);

        assert_eq!(root.depth, -1);
        assert_eq!(root.total_bookmarks, 5);
        assert_eq!(root.total_subfolders, 4);
        assert_eq!(root.direct_bookmarks, 2);
        assert_eq!(root.direct_subfolders, 2);

        let dev = &stats[0];
        assert_eq!(dev.path.as_deref(), Some("Dev"));
        assert_eq!(dev.direct_bookmarks, 1);
        assert_eq!(dev.total_bookmarks, 3);
        assert_eq!(dev.total_subfolders, 2);
        assert!(!dev.is_empty);

        let empty = stats.iter().find(|s| s.name == "Empty").unwrap();
        assert!(empty.is_empty);
        assert_eq!(empty.depth, 0);
    }

    #[test]
    fn test_duplicate_urls_are_counted_once() {
        let mut tree = ImportTree::new("t", SourceBrowser::Unknown);
        tree.root_bookmarks = vec![
            bookmark("https://x.com", None),
            bookmark("https://X.com", None),
            bookmark("https://y.com", None),
        ];
        tree.recount();
        assert_eq!(count_duplicate_urls(&tree), 1);

        assert_eq!(count_duplicate_urls(&sample_tree()), 1);
    }

    #[test]
    fn test_display_tree_shape() {
        let tree = sample_tree();
        let nodes = build_display_tree(&tree, 2);

        assert_eq!(nodes.len(), 4);
        let dev = &nodes[0];
        assert_eq!(dev.kind, TreeNodeKind::Folder);
        assert_eq!(dev.bookmark_count, Some(3));
        assert!(!dev.collapsed);
        assert_eq!(dev.children[0].title, "Tools");
        assert_eq!(dev.children[1].kind, TreeNodeKind::Bookmark);

        let deep = &dev.children[0].children[0];
        assert_eq!(deep.path, "Dev/Tools/Deep");
        assert!(deep.collapsed);

        assert_eq!(nodes[3].kind, TreeNodeKind::Bookmark);
        assert_eq!(nodes[3].url.as_deref(), Some("https://y.com"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2560), "2.5 KB");
        assert_eq!(format_size(1_153_434), "1.1 MB");
    }

    #[test]
    fn test_analysis_warnings() {
        let analyzer = TreeAnalyzer::with_config(AnalyzerConfig {
            max_depth: 1,
            large_import: 3,
            max_empty_folders: 0,
            ..AnalyzerConfig::default()
        });
        let mut tree = sample_tree();
        tree.skipped_links = 2;

        let analysis = analyzer.analyze(&tree);
        assert_eq!(analysis.max_depth, 2);
        assert_eq!(analysis.empty_folders, 1);
        assert_eq!(analysis.duplicate_urls, 1);
        assert_eq!(analysis.warnings.len(), 4);
        assert!(analysis.statistics_for("Dev/Tools").is_some());
        assert!(analysis.estimated_size_bytes > 0);
    }

    #[test]
    fn test_empty_tree_warns_but_does_not_fail() {
        let tree = ImportTree::new("Nothing", SourceBrowser::Unknown);
        let analysis = TreeAnalyzer::new().analyze(&tree);
        assert_eq!(analysis.warnings, vec!["No bookmarks were found in this file".to_string()]);
        assert!(analysis.root_statistics.is_empty);
        assert_eq!(analysis.estimated_size, "0 B");
    }
}

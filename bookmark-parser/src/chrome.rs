//! Chromium bookmark JSON parser
//!
//! Reads the `Bookmarks` file written by Chrome and Edge. The `bookmark_bar`,
//! `other` and `synced` roots become top-level folders (empty roots are
//! dropped); `folder` nodes become folders and `url` nodes become bookmarks.

use crate::dates::parse_chrome_timestamp;
use crate::detect::guess_browser_json;
use crate::traits::BookmarkFileParser;
use bookmark_import_core::*;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// Chrome/Edge bookmark JSON structure
#[derive(Debug, Clone, Deserialize)]
pub struct ChromeBookmarks {
    pub roots: Option<ChromeBookmarkRoots>,
    /// Written by Chromium itself; exports from other tools usually lack it
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChromeBookmarkRoots {
    pub bookmark_bar: Option<ChromeBookmarkNode>,
    pub other: Option<ChromeBookmarkNode>,
    pub synced: Option<ChromeBookmarkNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChromeBookmarkNode {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    pub url: Option<String>,
    pub date_added: Option<ChromeTimestamp>,
    pub children: Option<Vec<ChromeBookmarkNode>>,
}

/// Chrome writes timestamps as decimal strings; some tools write numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChromeTimestamp {
    Text(String),
    Number(i64),
}

impl ChromeTimestamp {
    fn to_datetime(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ChromeTimestamp::Text(raw) => parse_chrome_timestamp(raw, now),
            ChromeTimestamp::Number(raw) => parse_chrome_timestamp(&raw.to_string(), now),
        }
    }
}

/// Parser for Chromium `Bookmarks` JSON files
#[derive(Debug, Clone, Default)]
pub struct ChromeJsonParser {
    reference_time: Option<DateTime<Utc>>,
}

impl ChromeJsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the "now" used to discard future timestamps
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    fn walk_node(
        &self,
        node: &ChromeBookmarkNode,
        parent_path: Option<&str>,
        depth: usize,
        folders: &mut Vec<ImportedFolder>,
        bookmarks: &mut Vec<ImportedBookmark>,
        taken: &mut HashSet<String>,
        ctx: &mut WalkContext,
    ) {
        match node.node_type.as_str() {
            "url" => match node.url.as_deref().map(str::trim) {
                Some(url) if crate::is_supported_url(url) => {
                    let title = collapse_whitespace(&node.name);
                    bookmarks.push(ImportedBookmark {
                        title: if title.is_empty() { url.to_string() } else { title },
                        url: url.to_string(),
                        added_at: node.date_added.as_ref().and_then(|d| d.to_datetime(ctx.now)),
                        description: None,
                        icon_data_uri: None,
                        tags: Vec::new(),
                        folder_path: parent_path.map(str::to_string),
                    });
                }
                _ => ctx.skipped_links += 1,
            },
            "folder" => {
                let name = claim_sibling_name(&clean_folder_name(&node.name), taken);
                let mut folder = ImportedFolder::new(name, parent_path, depth);
                let mut child_names = HashSet::new();
                let path = folder.path.clone();

                for child in node.children.iter().flatten() {
                    self.walk_node(
                        child,
                        Some(&path),
                        depth + 1,
                        &mut folder.children,
                        &mut folder.bookmarks,
                        &mut child_names,
                        ctx,
                    );
                }
                folders.push(folder);
            }
            other => {
                debug!("Skipping Chrome bookmark node of unknown type {:?}", other);
            }
        }
    }
}

#[derive(Debug)]
struct WalkContext {
    now: DateTime<Utc>,
    skipped_links: usize,
}

impl BookmarkFileParser for ChromeJsonParser {
    fn file_type(&self) -> FileType {
        FileType::Json
    }

    fn parse(&self, content: &str) -> std::result::Result<ImportTree, ParseError> {
        let chrome_bookmarks: ChromeBookmarks =
            serde_json::from_str(content).map_err(|e| ParseError::MalformedJson {
                details: e.to_string(),
            })?;
        let roots = chrome_bookmarks.roots.ok_or(ParseError::MissingRoots)?;

        let source_browser = match guess_browser_json(content) {
            SourceBrowser::Edge => SourceBrowser::Edge,
            _ if chrome_bookmarks.checksum.is_some() => SourceBrowser::Chrome,
            _ => SourceBrowser::Unknown,
        };
        let mut tree = ImportTree::new("Bookmarks", source_browser);
        let mut ctx = WalkContext {
            now: self.reference_time.unwrap_or_else(Utc::now),
            skipped_links: 0,
        };
        let mut taken = HashSet::new();

        let named_roots = [
            (roots.bookmark_bar.as_ref(), "Bookmarks bar"),
            (roots.other.as_ref(), "Other bookmarks"),
            (roots.synced.as_ref(), "Mobile bookmarks"),
        ];

        for (root, fallback_name) in named_roots {
            let Some(root) = root else { continue };
            if root.node_type == "folder" && root.children.as_ref().map_or(true, Vec::is_empty) {
                continue;
            }

            let mut root = root.clone();
            if root.name.trim().is_empty() {
                root.name = fallback_name.to_string();
            }
            self.walk_node(
                &root,
                None,
                0,
                &mut tree.root_folders,
                &mut tree.root_bookmarks,
                &mut taken,
                &mut ctx,
            );
        }

        tree.skipped_links = ctx.skipped_links;
        tree.recount();
        tree.validate()?;

        debug!(
            "Parsed Chrome bookmarks: {} bookmarks in {} folders, {} links skipped",
            tree.total_bookmarks, tree.total_folders, tree.skipped_links
        );
        Ok(tree)
    }
}

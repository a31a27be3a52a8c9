//! Netscape bookmark file parser
//!
//! Walks the definition-list structure depth-first. A `<DT><H3>` entry is a
//! folder whose contents live in a `<DL>` nested in the same `<DT>` or
//! following it as the next sibling; a `<DT><A HREF>` entry is a bookmark,
//! optionally followed by a `<DD>` description.

use crate::dates::parse_unix_seconds;
use crate::detect::guess_browser_html;
use crate::traits::BookmarkFileParser;
use bookmark_import_core::*;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::debug;

/// Parser for Netscape HTML bookmark exports
#[derive(Debug, Clone, Default)]
pub struct NetscapeHtmlParser {
    reference_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct WalkContext {
    now: DateTime<Utc>,
    skipped_links: usize,
    discarded_dates: usize,
}

impl NetscapeHtmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the "now" used to discard future `ADD_DATE` values
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Walk one `<DL>` block, appending its entries to `folders`/`bookmarks`.
    /// Stops with [`ParseError::TooDeep`] before descending past
    /// [`MAX_FOLDER_DEPTH`] levels.
    fn walk_list(
        &self,
        list: ElementRef<'_>,
        parent_path: Option<&str>,
        depth: usize,
        folders: &mut Vec<ImportedFolder>,
        bookmarks: &mut Vec<ImportedBookmark>,
        ctx: &mut WalkContext,
    ) -> std::result::Result<(), ParseError> {
        let mut taken: HashSet<String> = folders.iter().map(|f| f.name.clone()).collect();
        // Folder still waiting for a sibling <DL> with its contents
        let mut open_folder: Option<usize> = None;
        let mut last_bookmark: Option<usize> = None;

        for child in list.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "dt" => {
                    open_folder = None;
                    last_bookmark = None;

                    if let Some(heading) = first_child_element(child, "h3") {
                        if depth >= MAX_FOLDER_DEPTH {
                            return Err(ParseError::TooDeep {
                                limit: MAX_FOLDER_DEPTH,
                            });
                        }
                        let name = claim_sibling_name(&clean_folder_name(&text_of(heading)), &mut taken);
                        let mut folder = ImportedFolder::new(name, parent_path, depth);

                        match first_child_element(child, "dl") {
                            Some(nested) => {
                                let path = folder.path.clone();
                                self.walk_list(
                                    nested,
                                    Some(&path),
                                    depth + 1,
                                    &mut folder.children,
                                    &mut folder.bookmarks,
                                    ctx,
                                )?;
                                folders.push(folder);
                            }
                            None => {
                                folders.push(folder);
                                open_folder = Some(folders.len() - 1);
                            }
                        }
                    } else if let Some(anchor) = first_child_element(child, "a") {
                        if let Some(bookmark) = self.read_anchor(anchor, parent_path, ctx) {
                            bookmarks.push(bookmark);
                            last_bookmark = Some(bookmarks.len() - 1);
                        }
                    }
                }
                "dl" => match open_folder.take() {
                    Some(index) => {
                        let folder = &mut folders[index];
                        let path = folder.path.clone();
                        self.walk_list(
                            child,
                            Some(&path),
                            depth + 1,
                            &mut folder.children,
                            &mut folder.bookmarks,
                            ctx,
                        )?;
                    }
                    None => {
                        self.walk_list(child, parent_path, depth, folders, bookmarks, ctx)?;
                        taken = folders.iter().map(|f| f.name.clone()).collect();
                    }
                },
                "dd" => {
                    if let Some(index) = last_bookmark.take() {
                        let description = collapse_whitespace(&text_of(child));
                        if !description.is_empty() {
                            bookmarks[index].description = Some(description);
                        }
                    }
                }
                "p" => {
                    // Stray <p> wrappers occasionally swallow entries
                    self.walk_list(child, parent_path, depth, folders, bookmarks, ctx)?;
                    taken = folders.iter().map(|f| f.name.clone()).collect();
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_anchor(
        &self,
        anchor: ElementRef<'_>,
        parent_path: Option<&str>,
        ctx: &mut WalkContext,
    ) -> Option<ImportedBookmark> {
        let element = anchor.value();
        let url = element.attr("href").map(str::trim).unwrap_or_default();
        if !crate::is_supported_url(url) {
            ctx.skipped_links += 1;
            return None;
        }

        let added_at = element.attr("add_date").and_then(|raw| {
            let parsed = parse_unix_seconds(raw, ctx.now);
            if parsed.is_none() {
                ctx.discarded_dates += 1;
            }
            parsed
        });

        let title = collapse_whitespace(&text_of(anchor));
        let tags = element
            .attr("tags")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(ImportedBookmark {
            title: if title.is_empty() { url.to_string() } else { title },
            url: url.to_string(),
            added_at,
            description: None,
            icon_data_uri: element
                .attr("icon")
                .filter(|icon| icon.starts_with("data:"))
                .map(str::to_string),
            tags,
            folder_path: parent_path.map(str::to_string),
        })
    }
}

impl BookmarkFileParser for NetscapeHtmlParser {
    fn file_type(&self) -> FileType {
        FileType::Html
    }

    fn parse(&self, content: &str) -> std::result::Result<ImportTree, ParseError> {
        let document = Html::parse_document(content);
        let root = document.root_element();

        let top_list = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "dl")
            .ok_or(ParseError::NoBookmarkList)?;

        let title = ["title", "h1"]
            .iter()
            .find_map(|tag| {
                root.descendants()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == *tag)
                    .map(|e| collapse_whitespace(&text_of(e)))
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| "Bookmarks".to_string());

        let mut tree = ImportTree::new(title, guess_browser_html(content));
        let mut ctx = WalkContext {
            now: self.reference_time.unwrap_or_else(Utc::now),
            skipped_links: 0,
            discarded_dates: 0,
        };

        self.walk_list(
            top_list,
            None,
            0,
            &mut tree.root_folders,
            &mut tree.root_bookmarks,
            &mut ctx,
        )?;

        tree.skipped_links = ctx.skipped_links;
        tree.recount();
        tree.validate()?;

        debug!(
            "Parsed Netscape bookmarks: {} bookmarks in {} folders, {} links skipped, {} dates discarded",
            tree.total_bookmarks, tree.total_folders, ctx.skipped_links, ctx.discarded_dates
        );
        Ok(tree)
    }
}

fn first_child_element<'a>(parent: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == name)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

//! Structural Mapper
//!
//! Reconciles a parsed [`ImportTree`] against a snapshot of the destination
//! collection and produces the ordered creation requests the engine executes.
//!
//! Folder requests are emitted parents first: folders are processed in
//! ascending depth order, so a request whose parent is still pending always
//! refers to a request at an earlier index. Nothing here performs I/O.

use crate::hints::{color_for_folder, dedupe_tags, generate_tags, icon_for_folder};
use bookmark_import_core::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Reconciliation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Drop bookmarks whose URL already exists in the destination
    pub skip_duplicates: bool,
    /// Reuse an existing folder with the same name under the same parent
    pub merge_folders: bool,
    /// When false, every bookmark goes to `default_folder_ref`
    pub preserve_folder_structure: bool,
    /// Append tags derived from the bookmark URL
    pub auto_generate_tags: bool,
    /// Parent for root-level folders and fallback for unresolved bookmarks
    pub default_folder_ref: Option<FolderRef>,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            merge_folders: true,
            preserve_folder_structure: true,
            auto_generate_tags: false,
            default_folder_ref: None,
        }
    }
}

/// Where a folder or bookmark goes in the destination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum FolderTarget {
    /// A folder that already exists
    Existing(FolderRef),
    /// A folder created by an earlier request, keyed by its original path
    Pending(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub icon_hint: String,
    pub color_hint: String,
    /// `None` creates the folder at the destination root
    pub parent: Option<FolderTarget>,
    /// Path of the folder in the import tree
    pub original_path: String,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookmarkRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub folder: Option<FolderTarget>,
    pub original_folder_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKind {
    Folder,
    Bookmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateAction {
    Skip,
    Merge,
    Rename,
}

/// A collision between an imported item and the destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateInfo {
    pub kind: DuplicateKind,
    /// Folder path or bookmark URL in the import
    pub imported_ref: String,
    /// Destination folder id, when the collision is with a known folder
    pub existing_ref: Option<FolderRef>,
    pub action: DuplicateAction,
    /// New name for renamed folders
    pub renamed_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingStatistics {
    pub folders_to_create: usize,
    pub folders_merged: usize,
    pub folders_renamed: usize,
    pub folders_skipped: usize,
    pub bookmarks_to_create: usize,
    pub bookmarks_skipped: usize,
    pub bookmarks_invalid: usize,
    pub tags_generated: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingResult {
    /// Parents before children
    pub folder_requests: Vec<CreateFolderRequest>,
    pub bookmark_requests: Vec<CreateBookmarkRequest>,
    pub duplicates: Vec<DuplicateInfo>,
    #[serde(skip)]
    pub errors: Vec<MappingError>,
    pub statistics: MappingStatistics,
}

impl MappingResult {
    /// Number of bookmarks that were dropped because of a mapping error
    pub fn bookmark_errors(&self) -> usize {
        self.errors.iter().filter(|e| e.affects_bookmark()).count()
    }
}

/// Structural Mapper
pub struct StructuralMapper {
    options: MappingOptions,
}

impl StructuralMapper {
    pub fn new(options: MappingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    /// Map a tree onto the destination described by `snapshot`
    pub fn map(&self, tree: &ImportTree, snapshot: &DestinationSnapshot) -> MappingResult {
        let mut result = MappingResult::default();

        let targets = if self.options.preserve_folder_structure {
            self.map_folders(tree, snapshot, &mut result)
        } else {
            FolderTargets::default()
        };
        self.map_bookmarks(tree, snapshot, &targets, &mut result);

        debug!(
            "Mapped {} folders and {} bookmarks ({} duplicates, {} errors)",
            result.folder_requests.len(),
            result.bookmark_requests.len(),
            result.duplicates.len(),
            result.errors.len()
        );

        result
    }

    fn default_target(&self) -> Option<FolderTarget> {
        self.options
            .default_folder_ref
            .clone()
            .map(FolderTarget::Existing)
    }

    fn map_folders(
        &self,
        tree: &ImportTree,
        snapshot: &DestinationSnapshot,
        result: &mut MappingResult,
    ) -> FolderTargets {
        let mut targets = FolderTargets::default();
        // Lowercased names already used under each parent
        let mut claimed: HashMap<Option<FolderTarget>, HashSet<String>> = HashMap::new();

        let mut folders = tree.folders();
        folders.sort_by_key(|f| f.depth);

        for folder in folders {
            let parent = match folder.parent_path.as_deref() {
                None => self.default_target(),
                Some(parent_path) => match targets.resolved.get(parent_path) {
                    Some(target) => Some(target.clone()),
                    None => {
                        result.errors.push(MappingError::UnresolvedParent {
                            path: folder.path.clone(),
                            parent_path: parent_path.to_string(),
                        });
                        result.statistics.folders_skipped += 1;
                        targets.unresolved.insert(folder.path.clone());
                        continue;
                    }
                },
            };

            let existing = match &parent {
                Some(FolderTarget::Pending(_)) => None,
                Some(FolderTarget::Existing(id)) => find_existing(snapshot, &folder.name, Some(id)),
                None => find_existing(snapshot, &folder.name, None),
            };

            if let (Some(existing), true) = (existing, self.options.merge_folders) {
                debug!("Merging folder {} into existing {}", folder.path, existing.id);
                result.duplicates.push(DuplicateInfo {
                    kind: DuplicateKind::Folder,
                    imported_ref: folder.path.clone(),
                    existing_ref: Some(existing.id.clone()),
                    action: DuplicateAction::Merge,
                    renamed_to: None,
                });
                result.statistics.folders_merged += 1;
                targets
                    .resolved
                    .insert(folder.path.clone(), FolderTarget::Existing(existing.id.clone()));
                continue;
            }

            let taken = claimed.entry(parent.clone()).or_insert_with(|| {
                existing_names_under(snapshot, parent.as_ref())
            });
            let name = claim_unique_name(&folder.name, taken);

            if name != folder.name {
                debug!("Renaming folder {} to {}", folder.path, name);
                result.duplicates.push(DuplicateInfo {
                    kind: DuplicateKind::Folder,
                    imported_ref: folder.path.clone(),
                    existing_ref: existing.map(|e| e.id.clone()),
                    action: DuplicateAction::Rename,
                    renamed_to: Some(name.clone()),
                });
                result.statistics.folders_renamed += 1;
            }

            result.folder_requests.push(CreateFolderRequest {
                icon_hint: icon_for_folder(&folder.name).to_string(),
                color_hint: color_for_folder(&folder.name).to_string(),
                name,
                parent,
                original_path: folder.path.clone(),
                depth: folder.depth,
            });
            result.statistics.folders_to_create += 1;
            targets.resolved.insert(
                folder.path.clone(),
                FolderTarget::Pending(folder.path.clone()),
            );
        }

        targets
    }

    fn map_bookmarks(
        &self,
        tree: &ImportTree,
        snapshot: &DestinationSnapshot,
        targets: &FolderTargets,
        result: &mut MappingResult,
    ) {
        for bookmark in tree.bookmarks() {
            if bookmark.url.trim().is_empty() {
                result.errors.push(MappingError::EmptyUrl {
                    title: bookmark.title.clone(),
                });
                result.statistics.bookmarks_invalid += 1;
                continue;
            }

            let folder = match (&bookmark.folder_path, self.options.preserve_folder_structure) {
                (Some(path), true) => match targets.resolved.get(path) {
                    Some(target) => Some(target.clone()),
                    None if targets.unresolved.contains(path) => self.default_target(),
                    None => {
                        result.errors.push(MappingError::UnknownFolder {
                            title: bookmark.title.clone(),
                            folder_path: path.clone(),
                        });
                        result.statistics.bookmarks_invalid += 1;
                        continue;
                    }
                },
                _ => self.default_target(),
            };

            if self.options.skip_duplicates && snapshot.contains_url(&bookmark.url) {
                result.duplicates.push(DuplicateInfo {
                    kind: DuplicateKind::Bookmark,
                    imported_ref: bookmark.url.clone(),
                    existing_ref: None,
                    action: DuplicateAction::Skip,
                    renamed_to: None,
                });
                result.statistics.bookmarks_skipped += 1;
                continue;
            }

            let mut tags = bookmark.tags.clone();
            if self.options.auto_generate_tags {
                let before = tags.len();
                tags.extend(generate_tags(&bookmark.url));
                dedupe_tags(&mut tags);
                result.statistics.tags_generated += tags.len().saturating_sub(before);
            }

            result.bookmark_requests.push(CreateBookmarkRequest {
                title: bookmark.title.clone(),
                url: bookmark.url.trim().to_string(),
                description: bookmark.description.clone(),
                tags,
                folder,
                original_folder_path: bookmark.folder_path.clone(),
            });
            result.statistics.bookmarks_to_create += 1;
        }
    }
}

impl Default for StructuralMapper {
    fn default() -> Self {
        Self::new(MappingOptions::default())
    }
}

/// Map a tree with the given options
pub fn map_tree(
    tree: &ImportTree,
    snapshot: &DestinationSnapshot,
    options: MappingOptions,
) -> MappingResult {
    StructuralMapper::new(options).map(tree, snapshot)
}

#[derive(Default)]
struct FolderTargets {
    /// Import path to destination target
    resolved: HashMap<String, FolderTarget>,
    /// Paths skipped because their parent could not be resolved
    unresolved: HashSet<String>,
}

fn find_existing<'a>(
    snapshot: &'a DestinationSnapshot,
    name: &str,
    parent: Option<&FolderRef>,
) -> Option<&'a ExistingFolder> {
    let name = name.to_lowercase();
    snapshot
        .folders
        .iter()
        .find(|f| f.parent.as_ref() == parent && f.name.to_lowercase() == name)
}

fn existing_names_under(
    snapshot: &DestinationSnapshot,
    parent: Option<&FolderTarget>,
) -> HashSet<String> {
    let parent_ref = match parent {
        Some(FolderTarget::Pending(_)) => return HashSet::new(),
        Some(FolderTarget::Existing(id)) => Some(id),
        None => None,
    };
    snapshot
        .folders
        .iter()
        .filter(|f| f.parent.as_ref() == parent_ref)
        .map(|f| f.name.to_lowercase())
        .collect()
}

/// `name`, or `name (n)` with the smallest n >= 2 whose lowercase form is free
fn claim_unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_lowercase()) {
        return name.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", name, n);
        if taken.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

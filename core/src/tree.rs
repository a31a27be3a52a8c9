//! Path helpers and structural invariants of an [`ImportTree`]

use crate::errors::ParseError;
use crate::types::{ImportTree, ImportedBookmark, ImportedFolder, PATH_SEPARATOR};
use std::collections::HashSet;

/// Placeholder used when a folder has no usable name
pub const UNTITLED_FOLDER: &str = "Untitled folder";

/// Deepest folder nesting a tree may have; root folders are level 1
pub const MAX_FOLDER_DEPTH: usize = 256;

/// Join a parent path and a folder name
pub fn join_path(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) if !parent.is_empty() => format!("{}{}{}", parent, PATH_SEPARATOR, name),
        _ => name.to_string(),
    }
}

/// Path with the last segment removed, `None` for a root folder
pub fn parent_path_of(path: &str) -> Option<&str> {
    path.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent)
}

/// Depth implied by a path: segment count minus one
pub fn path_depth(path: &str) -> usize {
    path.matches(PATH_SEPARATOR).count()
}

/// Collapse every run of whitespace into a single space and trim the ends
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a folder name so it can be used as one path segment
pub fn clean_folder_name(raw: &str) -> String {
    let name = collapse_whitespace(raw).replace(PATH_SEPARATOR, "-");
    if name.is_empty() {
        UNTITLED_FOLDER.to_string()
    } else {
        name
    }
}

/// Return `name`, or `name (n)` with the smallest n >= 2 not present in `taken`.
/// The returned name is inserted into `taken`.
pub fn claim_sibling_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", name, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

impl ImportTree {
    /// All folders, depth-first pre-order
    pub fn folders(&self) -> Vec<&ImportedFolder> {
        let mut out = Vec::with_capacity(self.total_folders);
        let mut stack: Vec<&ImportedFolder> = self.root_folders.iter().rev().collect();
        while let Some(folder) = stack.pop() {
            out.push(folder);
            stack.extend(folder.children.iter().rev());
        }
        out
    }

    /// Root bookmarks followed by every folder's bookmarks in pre-order
    pub fn bookmarks(&self) -> Vec<&ImportedBookmark> {
        let mut out: Vec<&ImportedBookmark> = self.root_bookmarks.iter().collect();
        for folder in self.folders() {
            out.extend(folder.bookmarks.iter());
        }
        out
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.folders().iter().map(|f| f.depth).max()
    }

    /// Recompute `total_bookmarks` and `total_folders` from the tree contents
    pub fn recount(&mut self) {
        let folders = self.folders();
        let total_folders = folders.len();
        let total_bookmarks =
            self.root_bookmarks.len() + folders.iter().map(|f| f.bookmarks.len()).sum::<usize>();
        self.total_folders = total_folders;
        self.total_bookmarks = total_bookmarks;
    }

    /// Check the structural invariants every downstream stage relies on:
    /// bounded nesting, unique folder paths, `depth`/`parent_path` consistent
    /// with `path`, bookmarks pointing at their containing folder, and
    /// accurate totals.
    pub fn validate(&self) -> Result<(), ParseError> {
        let mut seen = HashSet::new();

        for bookmark in &self.root_bookmarks {
            if let Some(path) = &bookmark.folder_path {
                return Err(ParseError::UnknownFolderPath { path: path.clone() });
            }
        }

        let mut stack: Vec<(&ImportedFolder, Option<&ImportedFolder>, usize)> = self
            .root_folders
            .iter()
            .rev()
            .map(|folder| (folder, None, 1))
            .collect();
        while let Some((folder, parent, level)) = stack.pop() {
            if level > MAX_FOLDER_DEPTH {
                return Err(ParseError::TooDeep {
                    limit: MAX_FOLDER_DEPTH,
                });
            }
            validate_folder(folder, parent, &mut seen)?;
            stack.extend(
                folder
                    .children
                    .iter()
                    .rev()
                    .map(|child| (child, Some(folder), level + 1)),
            );
        }

        let folder_count = seen.len();
        if folder_count != self.total_folders {
            return Err(ParseError::CountMismatch {
                field: "total_folders".to_string(),
                declared: self.total_folders,
                actual: folder_count,
            });
        }

        let bookmark_count = self.bookmarks().len();
        if bookmark_count != self.total_bookmarks {
            return Err(ParseError::CountMismatch {
                field: "total_bookmarks".to_string(),
                declared: self.total_bookmarks,
                actual: bookmark_count,
            });
        }

        Ok(())
    }
}

/// Checks one folder against its parent; children are visited by the caller
fn validate_folder<'a>(
    folder: &'a ImportedFolder,
    parent: Option<&ImportedFolder>,
    seen: &mut HashSet<&'a str>,
) -> Result<(), ParseError> {
    if !seen.insert(folder.path.as_str()) {
        return Err(ParseError::DuplicatePath {
            path: folder.path.clone(),
        });
    }

    let inconsistent = |details: String| ParseError::InconsistentFolder {
        path: folder.path.clone(),
        details,
    };

    if folder.name.is_empty() {
        return Err(inconsistent("empty folder name".to_string()));
    }
    let expected_path = join_path(parent.map(|p| p.path.as_str()), &folder.name);
    if folder.path != expected_path {
        return Err(inconsistent(format!("expected path {}", expected_path)));
    }
    if folder.depth != path_depth(&folder.path) {
        return Err(inconsistent(format!(
            "depth {} does not match path",
            folder.depth
        )));
    }
    if folder.parent_path.as_deref() != parent_path_of(&folder.path) {
        return Err(inconsistent("parent path does not match path".to_string()));
    }

    for bookmark in &folder.bookmarks {
        if bookmark.folder_path.as_deref() != Some(folder.path.as_str()) {
            return Err(ParseError::UnknownFolderPath {
                path: bookmark.folder_path.clone().unwrap_or_default(),
            });
        }
    }
    Ok(())
}

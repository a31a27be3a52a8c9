use thiserror::Error;
use crate::types::FileType;

/// Problems with the raw file, detected before any parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bookmark file is empty: {file_name}")]
    EmptyFile { file_name: String },

    #[error("Bookmark file too large: {size_bytes} bytes > {limit_bytes} bytes")]
    FileTooLarge { size_bytes: usize, limit_bytes: usize },

    #[error("Unrecognized bookmark file format: {file_name}")]
    UnsupportedFormat { file_name: String },
}

/// Malformed content or a tree that violates the structural invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Malformed bookmark JSON: {details}")]
    MalformedJson { details: String },

    #[error("Bookmark JSON has no roots object")]
    MissingRoots,

    #[error("No bookmark list found in HTML document")]
    NoBookmarkList,

    #[error("No parser for {file_type:?} content")]
    UnsupportedFormat { file_type: FileType },

    #[error("Duplicate folder path: {path}")]
    DuplicatePath { path: String },

    #[error("Inconsistent folder {path}: {details}")]
    InconsistentFolder { path: String, details: String },

    #[error("Bookmark references unknown folder path: {path}")]
    UnknownFolderPath { path: String },

    #[error("Folders nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Declared {field} = {declared} but tree contains {actual}")]
    CountMismatch {
        field: String,
        declared: usize,
        actual: usize,
    },
}

/// Reconciliation problem for a single folder or bookmark; the item is skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Parent folder {parent_path} of {path} was not resolved")]
    UnresolvedParent { path: String, parent_path: String },

    #[error("Bookmark \"{title}\" has no URL")]
    EmptyUrl { title: String },

    #[error("Bookmark \"{title}\" references unknown folder {folder_path}")]
    UnknownFolder { title: String, folder_path: String },
}

impl MappingError {
    /// Whether the skipped item is a bookmark (as opposed to a folder)
    pub fn affects_bookmark(&self) -> bool {
        matches!(
            self,
            MappingError::EmptyUrl { .. } | MappingError::UnknownFolder { .. }
        )
    }
}

/// A single destination store call failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Failed to create folder {name}: {reason}")]
    FolderCreationFailed { name: String, reason: String },

    #[error("Failed to create bookmark {url}: {reason}")]
    BookmarkCreationFailed { url: String, reason: String },

    #[error("Failed to enrich metadata for {url}: {reason}")]
    EnrichmentFailed { url: String, reason: String },

    #[error("Bookmark store unavailable: {details}")]
    Unavailable { details: String },
}

/// Main error type of the import pipeline
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Validation error: {source}")]
    Validation {
        #[from]
        source: ValidationError,
    },

    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("Mapping error: {source}")]
    Mapping {
        #[from]
        source: MappingError,
    },

    #[error("Store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("Import cancelled")]
    Cancelled,

    #[error("Configuration error: {details}")]
    Configuration { details: String },

    #[error("IO error: {source}")]
    IO {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    /// Fatal errors abort the import before any mutation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ImportError::Validation { .. }
                | ImportError::Parse { .. }
                | ImportError::Configuration { .. }
                | ImportError::IO { .. }
        )
    }

    /// Single sentence suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ImportError::Validation { source } => match source {
                ValidationError::EmptyFile { .. } => "The selected file is empty.".to_string(),
                ValidationError::FileTooLarge {
                    size_bytes,
                    limit_bytes,
                } => format!(
                    "The file is too large to import ({} MB, the limit is {} MB).",
                    size_bytes / (1024 * 1024),
                    limit_bytes / (1024 * 1024)
                ),
                ValidationError::UnsupportedFormat { .. } => {
                    "This file is not a browser bookmark export (expected HTML or JSON)."
                        .to_string()
                }
            },
            ImportError::Parse { source } => match source {
                ParseError::MalformedJson { .. } | ParseError::MissingRoots => {
                    "The bookmark JSON file is damaged or incomplete.".to_string()
                }
                ParseError::NoBookmarkList => {
                    "No bookmarks were found in this HTML file.".to_string()
                }
                ParseError::TooDeep { limit } => format!(
                    "The bookmark folders are nested too deeply (more than {} levels).",
                    limit
                ),
                other => format!("The bookmark file could not be read: {}.", other),
            },
            ImportError::Mapping { source } => source.to_string(),
            ImportError::Store { source } => source.to_string(),
            ImportError::Cancelled => "The import was cancelled.".to_string(),
            ImportError::Configuration { details } => {
                format!("The import settings are invalid: {}.", details)
            }
            ImportError::IO { source } => format!("The file could not be read: {}.", source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let validation: ImportError = ValidationError::EmptyFile {
            file_name: "bookmarks.html".to_string(),
        }
        .into();
        assert!(validation.is_fatal());

        let store: ImportError = StoreError::Unavailable {
            details: "offline".to_string(),
        }
        .into();
        assert!(!store.is_fatal());
        assert!(!ImportError::Cancelled.is_fatal());
    }

    #[test]
    fn test_user_message_for_oversized_file() {
        let error: ImportError = ValidationError::FileTooLarge {
            size_bytes: 60 * 1024 * 1024,
            limit_bytes: 50 * 1024 * 1024,
        }
        .into();
        assert_eq!(
            error.user_message(),
            "The file is too large to import (60 MB, the limit is 50 MB)."
        );
    }

    #[test]
    fn test_mapping_error_scope() {
        let folder_error = MappingError::UnresolvedParent {
            path: "a/b".to_string(),
            parent_path: "a".to_string(),
        };
        assert!(!folder_error.affects_bookmark());
        assert!(MappingError::EmptyUrl {
            title: "x".to_string()
        }
        .affects_bookmark());
    }
}

//! Bookmark file parser trait

use bookmark_import_core::*;

/// Trait for bookmark export parsers
///
/// Every implementation produces the same canonical [`ImportTree`] so later
/// stages never need to know which format a file came in.
pub trait BookmarkFileParser: Send + Sync {
    /// The file format this parser understands
    fn file_type(&self) -> FileType;

    /// Parse the full file text into an import tree
    fn parse(&self, content: &str) -> std::result::Result<ImportTree, ParseError>;
}

//! Bookmark file parsing
//!
//! This crate turns a raw browser export into the canonical [`ImportTree`].
//!
//! # Features
//! - Format sniffing for Netscape HTML and Chromium JSON exports
//! - Netscape bookmark file parsing (folders, links, descriptions, tags, icons)
//! - Chrome/Edge `Bookmarks` JSON parsing
//! - Uniform output shape regardless of the source format

pub mod traits;
pub mod detect;
pub mod dates;
pub mod html;
pub mod chrome;

pub use traits::*;
pub use detect::{CheckedFile, FormatDetection, FormatDetector, MAX_FILE_SIZE_BYTES};
pub use html::NetscapeHtmlParser;
pub use chrome::ChromeJsonParser;

use bookmark_import_core::*;

/// Get the parser for a detected file type
pub fn parser_for(file_type: FileType) -> Option<Box<dyn BookmarkFileParser>> {
    match file_type {
        FileType::Html => Some(Box::new(NetscapeHtmlParser::new())),
        FileType::Json => Some(Box::new(ChromeJsonParser::new())),
        FileType::Unknown => None,
    }
}

/// Parse file content of an already detected type
pub fn parse_bookmarks(
    content: &str,
    file_type: FileType,
) -> std::result::Result<ImportTree, ParseError> {
    let parser = parser_for(file_type).ok_or(ParseError::UnsupportedFormat { file_type })?;
    parser.parse(content)
}

/// Only web links are imported; everything else is dropped during parsing
pub fn is_supported_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

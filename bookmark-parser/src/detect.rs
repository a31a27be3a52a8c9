//! Format detection for raw bookmark files
//!
//! Detection is pattern based and never fails: unrecognized content is
//! reported as [`FileType::Unknown`] and callers must not try to parse it.

use bookmark_import_core::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest file accepted for import
pub const MAX_FILE_SIZE_BYTES: usize = 50 * 1024 * 1024;

const NETSCAPE_DOCTYPE: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>";
const UTF8_BOM: &str = "\u{feff}";

/// Outcome of sniffing a bookmark file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDetection {
    pub file_type: FileType,
    pub browser_guess: SourceBrowser,
    pub warnings: Vec<String>,
}

/// A validated, decoded bookmark file ready for parsing
#[derive(Debug, Clone)]
pub struct CheckedFile {
    pub content: String,
    pub detection: FormatDetection,
}

/// Sniffs bookmark files
pub struct FormatDetector;

impl FormatDetector {
    /// Classify file content. Pure, never fails.
    pub fn detect(content: &str, file_name: &str) -> FormatDetection {
        let trimmed = content.trim_start_matches(UTF8_BOM).trim_start();
        let mut warnings = Vec::new();

        let file_type = if trimmed.starts_with('{') && trimmed.contains("\"roots\"") {
            FileType::Json
        } else if contains_ignore_ascii_case(trimmed, NETSCAPE_DOCTYPE) {
            FileType::Html
        } else if contains_ignore_ascii_case(trimmed, "<dl") {
            warnings.push(
                "File has no Netscape bookmark doctype; reading it as a generic HTML bookmark list"
                    .to_string(),
            );
            FileType::Html
        } else {
            warnings.push(format!(
                "{} does not look like an HTML or JSON bookmark export",
                display_name(file_name)
            ));
            FileType::Unknown
        };

        let browser_guess = match file_type {
            FileType::Html => guess_browser_html(trimmed),
            FileType::Json => guess_browser_json(trimmed),
            FileType::Unknown => SourceBrowser::Unknown,
        };

        if let Some(warning) = extension_warning(file_name, file_type) {
            warnings.push(warning);
        }

        debug!(
            "Detected {:?} bookmark file from {:?} ({} warnings)",
            file_type,
            browser_guess,
            warnings.len()
        );

        FormatDetection {
            file_type,
            browser_guess,
            warnings,
        }
    }

    /// Reject empty or oversized files, decode the bytes and detect the format.
    ///
    /// Invalid UTF-8 is decoded lossily with a warning; unknown content is a
    /// validation error.
    pub fn check(
        bytes: &[u8],
        file_name: &str,
        max_size_bytes: usize,
    ) -> std::result::Result<CheckedFile, ValidationError> {
        if bytes.len() > max_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size_bytes: bytes.len(),
                limit_bytes: max_size_bytes,
            });
        }

        let (content, lossy) = match std::str::from_utf8(bytes) {
            Ok(text) => (text.to_string(), false),
            Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
        };
        let content = content
            .strip_prefix(UTF8_BOM)
            .map(str::to_string)
            .unwrap_or(content);

        if content.trim().is_empty() {
            return Err(ValidationError::EmptyFile {
                file_name: display_name(file_name).to_string(),
            });
        }

        let mut detection = Self::detect(&content, file_name);
        if detection.file_type == FileType::Unknown {
            return Err(ValidationError::UnsupportedFormat {
                file_name: display_name(file_name).to_string(),
            });
        }
        if lossy {
            detection
                .warnings
                .push("File is not valid UTF-8; unreadable characters were replaced".to_string());
        }

        Ok(CheckedFile { content, detection })
    }
}

/// Best guess of the exporting browser for Netscape HTML content
pub fn guess_browser_html(content: &str) -> SourceBrowser {
    if content.contains("com.apple.ReadingList") {
        SourceBrowser::Safari
    } else if content.contains("LAST_CHARSET")
        || content.contains("ICON_URI")
        || content.contains("Bookmarks Menu")
    {
        SourceBrowser::Firefox
    } else if contains_ignore_ascii_case(content, "Favorites bar") {
        SourceBrowser::Edge
    } else if content.contains("PERSONAL_TOOLBAR_FOLDER") {
        SourceBrowser::Chrome
    } else {
        SourceBrowser::Unknown
    }
}

/// Best guess of the exporting browser for Chromium JSON content
pub fn guess_browser_json(content: &str) -> SourceBrowser {
    if contains_ignore_ascii_case(content, "Favorites bar") {
        SourceBrowser::Edge
    } else if content.contains("\"checksum\"") {
        SourceBrowser::Chrome
    } else {
        SourceBrowser::Unknown
    }
}

fn extension_warning(file_name: &str, file_type: FileType) -> Option<String> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;

    let mismatch = match file_type {
        FileType::Html => extension == "json",
        FileType::Json => extension == "html" || extension == "htm",
        FileType::Unknown => false,
    };

    mismatch.then(|| {
        format!(
            "{} has a .{} extension but contains {:?} bookmarks",
            display_name(file_name),
            extension,
            file_type
        )
    })
}

fn display_name(file_name: &str) -> &str {
    if file_name.is_empty() {
        "File"
    } else {
        file_name
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

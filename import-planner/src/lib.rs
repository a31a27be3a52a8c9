//! Import planning
//!
//! Everything that happens between parsing a bookmark file and writing to
//! the destination collection. Pure, synchronous and free of I/O.
//!
//! # Features
//! - Tree analysis: folder statistics, preview tree, duplicate URL count, warnings
//! - Reconciliation of imported folders against existing ones (merge or rename)
//! - Parent-first ordering of folder creation requests
//! - Icon, color and tag heuristics

pub mod analyzer;
pub mod mapper;
pub mod hints;

pub use analyzer::{
    AnalyzerConfig, BookmarkAnalysis, BookmarkTreeNode, FolderStatistics, TreeAnalyzer,
    TreeNodeKind,
};
pub use mapper::{
    map_tree, CreateBookmarkRequest, CreateFolderRequest, DuplicateAction, DuplicateInfo,
    DuplicateKind, FolderTarget, MappingOptions, MappingResult, MappingStatistics,
    StructuralMapper,
};
pub use hints::{color_for_folder, generate_tags, icon_for_folder};

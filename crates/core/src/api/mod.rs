//! High-level API module for label conversion.
//!
//! # Example
//!
//! ```ignore
//! use pagetree_core::api::{ConvertOptions, convert_page_to_file};
//! use pagetree_core::mapping::Mapping;
//!
//! let mapping = Mapping::load("mapping.json")?;
//! convert_page_to_file("page.txt", "page.jpg", "page.xml", &mapping, &ConvertOptions::default())?;
//! ```

pub mod high_level;

// Re-export for convenience
pub use high_level::{
    ConvertOptions, FolderSummary, PageFailure, PageOutcome, build_page_layout, convert_folder,
    convert_page, convert_page_to_file, list_label_files,
};

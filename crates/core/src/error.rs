//! Error types for the pagetree conversion library.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for label conversion.
///
/// Which variants are fatal depends on where they surface: `Config` aborts a
/// whole run, `ImageRead` and `Io` abort a single page, and the remaining
/// variants are recovered per line or per region.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("mapping config error: {0}")]
    Config(String),

    #[error("label parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("no mapping for class id {0}")]
    UnknownClass(u32),

    #[error("degenerate polygon: {0}")]
    DegeneratePolygon(String),

    #[error("cannot read image {}: {msg}", path.display())]
    ImageRead { path: PathBuf, msg: String },

    #[error("invalid build parameter: {0}")]
    InvalidParams(String),

    #[error("thread pool error: {0}")]
    ThreadPool(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for PageError.
pub type Result<T> = std::result::Result<T, PageError>;

//! Project explorer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the project filesystem explorer.
///
/// Only [`preview`](crate::preview::preview) propagates errors — there is no
/// sensible partial result for "preview one specific file". Directory scans
/// absorb per-entry failures instead.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The requested path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The requested path exists but is not a regular file.
    #[error("not a file: {}", path.display())]
    NotAFile {
        /// The offending path.
        path: PathBuf,
    },

    /// Underlying filesystem failure while reading the file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for project explorer operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

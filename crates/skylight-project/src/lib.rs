//! Skylight project - bounded filesystem views for the file panel.
//!
//! Three small, synchronous services over the user's working directory:
//!
//! - [`scan`]: a depth-bounded, ordered directory tree with hidden and
//!   build/dependency entries excluded.
//! - [`preview`]: a line-truncated read of one file, tagged with a
//!   highlighter language.
//! - [`is_path_safe`]: component-bounded containment checking for callers
//!   that need it.
//!
//! Scans never fail — missing roots come back empty and unreadable entries
//! are absorbed per-entry. Only `preview` surfaces typed errors, because
//! there is no sensible partial result for a single requested file.
//!
//! # Example
//!
//! ```no_run
//! use skylight_project::{preview, scan, DEFAULT_PREVIEW_LINES, DEFAULT_SCAN_DEPTH};
//!
//! let tree = scan("/home/user/project", DEFAULT_SCAN_DEPTH);
//! for node in &tree {
//!     println!("{}", node.name());
//! }
//!
//! let file = preview("/home/user/project/src/main.rs", DEFAULT_PREVIEW_LINES)?;
//! println!("{} ({} lines)", file.language, file.line_count);
//! # Ok::<(), skylight_project::ProjectError>(())
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod preview;
pub mod safety;
pub mod tree;

pub use error::{ProjectError, ProjectResult};
pub use preview::{language_for_extension, preview, FilePreview, DEFAULT_PREVIEW_LINES};
pub use safety::is_path_safe;
pub use tree::{scan, FileTreeNode, DEFAULT_SCAN_DEPTH};

//! Depth-bounded directory scanning.
//!
//! [`scan`] produces the ordered tree the UI's file panel renders: hidden
//! entries and build/dependency directories are excluded, directories sort
//! before files, and recursion stops at a fixed depth. The scan never fails —
//! a missing root yields an empty list and unreadable entries are absorbed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default recursion depth for [`scan`].
pub const DEFAULT_SCAN_DEPTH: usize = 3;

/// Directory names never descended into: build output, dependency caches,
/// VCS internals.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    ".next",
    "__pycache__",
    ".cache",
    ".turbo",
    "coverage",
    ".output",
    "build",
    "target",
];

/// One entry in a directory-scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileTreeNode {
    /// A subdirectory and its (depth-bounded) children.
    Directory {
        /// Entry name.
        name: String,
        /// Absolute path.
        path: PathBuf,
        /// Child nodes; empty at the depth boundary.
        children: Vec<FileTreeNode>,
    },
    /// A regular file.
    File {
        /// Entry name.
        name: String,
        /// Absolute path.
        path: PathBuf,
        /// Size in bytes; omitted when the entry could not be stat-ed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
        /// Extension without the leading dot; omitted when there is none.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extension: Option<String>,
    },
}

impl FileTreeNode {
    /// Entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } | Self::File { name, .. } => name,
        }
    }

    /// Absolute path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
        }
    }

    /// Whether this node is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

/// Whether an entry is excluded before any recursion happens.
///
/// Leading-dot names are hidden — except the `.env` family, which users
/// routinely want visible in a project panel.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.') && !name.starts_with(".env")
}

/// Scan a directory into a depth-bounded, ordered tree.
///
/// A `root` that does not exist (or cannot be read) yields an empty list
/// rather than an error. Directories at the depth boundary are listed with
/// empty children, not omitted. Within each level, subdirectories precede
/// files and each group is sorted by name.
#[must_use]
pub fn scan(root: impl AsRef<Path>, max_depth: usize) -> Vec<FileTreeNode> {
    let root = root.as_ref();
    if !root.exists() {
        debug!(root = %root.display(), "scan root does not exist");
        return Vec::new();
    }
    scan_recursive(root, max_depth)
}

fn scan_recursive(dir: &Path, depth: usize) -> Vec<FileTreeNode> {
    if depth == 0 {
        return Vec::new();
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(dir = %dir.display(), %error, "skipping unreadable directory");
            return Vec::new();
        },
    };

    let mut directories = Vec::new();
    let mut files = Vec::new();

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        let path = entry.path();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .filter(|ext| !ext.is_empty());

        let Ok(file_type) = entry.file_type() else {
            // Entry raced away or is unreadable; keep it visible, size unknown.
            files.push(FileTreeNode::File {
                name,
                path,
                size: None,
                extension,
            });
            continue;
        };

        if file_type.is_dir() {
            if IGNORED_DIRS.contains(&name.as_str()) {
                continue;
            }
            let children = scan_recursive(&path, depth - 1);
            directories.push(FileTreeNode::Directory {
                name,
                path,
                children,
            });
        } else if file_type.is_file() {
            // Stat failures (permissions, races) drop the size, not the entry.
            let size = entry.metadata().ok().map(|metadata| metadata.len());
            files.push(FileTreeNode::File {
                name,
                path,
                size,
                extension,
            });
        }
        // Symlinks and other special entries are not part of the tree.
    }

    directories.sort_by(|a, b| a.name().cmp(b.name()));
    files.sort_by(|a, b| a.name().cmp(b.name()));
    directories.extend(files);
    directories
}

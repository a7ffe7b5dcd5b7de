//! Line-truncated file previews.
//!
//! [`preview`] reads one file, reports its true line count, and hands back
//! only the first `max_lines` of content — the UI renders large files without
//! shipping megabytes into the panel. The language tag drives the client's
//! syntax highlighter.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ProjectError, ProjectResult};

/// Default number of lines returned by [`preview`].
pub const DEFAULT_PREVIEW_LINES: usize = 200;

/// A bounded read of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePreview {
    /// The previewed file.
    pub path: PathBuf,
    /// The first `max_lines` lines, rejoined.
    pub content: String,
    /// Highlighter language derived from the extension.
    pub language: String,
    /// The file's true total line count, not the truncated count.
    pub line_count: usize,
}

/// Map a file extension to a syntax-highlighter language tag.
///
/// Case-insensitive; tolerates a leading dot. Unknown extensions map to
/// `"plaintext"` — this never fails.
#[must_use]
pub fn language_for_extension(extension: &str) -> &'static str {
    let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
    match normalized.as_str() {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "py" => "python",
        "rb" => "ruby",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "swift" => "swift",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "cs" => "csharp",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "html" => "html",
        "xml" => "xml",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "mdx" => "markdown",
        "sql" => "sql",
        "sh" | "bash" | "zsh" => "bash",
        "fish" => "fish",
        "ps1" => "powershell",
        "dockerfile" => "dockerfile",
        "graphql" | "gql" => "graphql",
        "vue" => "vue",
        "svelte" => "svelte",
        "prisma" => "prisma",
        "env" => "dotenv",
        "lua" => "lua",
        "r" => "r",
        "php" => "php",
        "dart" => "dart",
        "zig" => "zig",
        _ => "plaintext",
    }
}

/// Read a line-truncated preview of one file.
///
/// `line_count` is computed from the full content; `content` carries only
/// the first `max_lines` lines.
///
/// # Errors
///
/// - [`ProjectError::NotFound`] when the path does not exist.
/// - [`ProjectError::NotAFile`] when the path is a directory (or other
///   non-regular file).
/// - [`ProjectError::Io`] when the file exists but cannot be read.
pub fn preview(path: impl AsRef<Path>, max_lines: usize) -> ProjectResult<FilePreview> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ProjectError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ProjectError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.split('\n').collect();
    let line_count = lines.len();
    let truncated = lines
        .into_iter()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n");

    let language = path
        .extension()
        .map(|ext| language_for_extension(&ext.to_string_lossy()))
        .unwrap_or("plaintext");

    Ok(FilePreview {
        path: path.to_path_buf(),
        content: truncated,
        language: language.to_string(),
        line_count,
    })
}

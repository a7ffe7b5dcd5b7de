//! MCP configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or saving server configuration.
///
/// Note that an *incomplete* descriptor is never an error — incomplete
/// entries are silently excluded during resolution so a half-edited
/// configuration file keeps the agent runtime startable.
#[derive(Debug, Error)]
pub enum McpError {
    /// The configuration file exists but could not be parsed.
    #[error("invalid server configuration: {0}")]
    Config(String),

    /// The configuration could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for MCP configuration operations.
pub type McpResult<T> = Result<T, McpError>;

//! Skylight MCP - tool-server configuration for the agent runtime.
//!
//! This crate owns the shape of user-authored MCP server descriptors and
//! their normalization into configurations the agent runtime can start:
//!
//! - [`ServerDescriptor`] / [`ServersFile`]: the permissive, user-edited
//!   collection as stored on disk (`mcpServers` keyed by name).
//! - [`ServerConfig`] / [`resolve_transport_config`]: the validated subset,
//!   with per-transport rules applied and incomplete entries silently
//!   excluded.
//!
//! # Example
//!
//! ```
//! use skylight_mcp::{resolve_transport_config, ServerDescriptor, ServersFile};
//!
//! let mut file = ServersFile::default();
//! file.insert(
//!     "filesystem",
//!     ServerDescriptor::stdio("npx").with_args(["-y", "@anthropics/mcp-server-filesystem"]),
//! );
//! file.insert("half-edited", ServerDescriptor::sse(""));
//!
//! let resolved = resolve_transport_config(&file.servers);
//! assert!(resolved.contains_key("filesystem"));
//! // The incomplete entry is dropped, not an error.
//! assert!(!resolved.contains_key("half-edited"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod resolve;

pub use config::{ServerDescriptor, ServersFile, TransportKind};
pub use error::{McpError, McpResult};
pub use resolve::{resolve_transport_config, ServerConfig};

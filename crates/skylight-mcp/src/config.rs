//! Server descriptors and their on-disk collection.
//!
//! A [`ServerDescriptor`] is one user-authored tool-server entry, keyed by a
//! user-chosen name inside a [`ServersFile`]. The on-disk shape is
//! deliberately permissive — every field optional — because the settings UI
//! writes descriptors mid-edit; validation happens at resolution time (see
//! [`crate::resolve`]), not at parse time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{McpError, McpResult};

/// Transport mechanism for an auxiliary tool server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Spawn a local child process and speak over stdin/stdout.
    #[default]
    Stdio,
    /// Server-Sent Events over HTTP.
    Sse,
    /// Plain HTTP.
    Http,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Sse => write!(f, "sse"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// One user-authored tool-server configuration entry.
///
/// All fields are optional on the wire; which ones matter depends on the
/// transport. A descriptor missing its transport's required field is not an
/// error — it is excluded from the resolved configuration set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Transport selection; absent means `stdio`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportKind>,
    /// Executable to spawn (`stdio` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Ordered argument list (`stdio` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment variables for the child process (`stdio` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    /// Endpoint URL (`sse`/`http` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Extra request headers (`sse`/`http` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl ServerDescriptor {
    /// Create a stdio descriptor.
    #[must_use]
    pub fn stdio(command: impl Into<String>) -> Self {
        Self {
            transport: Some(TransportKind::Stdio),
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Create an SSE descriptor.
    #[must_use]
    pub fn sse(url: impl Into<String>) -> Self {
        Self {
            transport: Some(TransportKind::Sse),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Create an HTTP descriptor.
    #[must_use]
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: Some(TransportKind::Http),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Add arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The effective transport, defaulting to `stdio` when unspecified.
    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        self.transport.unwrap_or_default()
    }
}

/// The persisted collection of server descriptors.
///
/// Mirrors the client's `.mcp.json` shape: a single `mcpServers` object
/// keyed by server name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServersFile {
    /// Descriptors keyed by user-chosen server name.
    #[serde(rename = "mcpServers", default)]
    pub servers: BTreeMap<String, ServerDescriptor>,
}

impl ServersFile {
    /// Load descriptors from a file.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Io`] when the file cannot be read and
    /// [`McpError::Config`] when it is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> McpResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| McpError::Config(e.to_string()))
    }

    /// Load descriptors, treating a missing file as the empty default.
    ///
    /// # Errors
    ///
    /// Returns an error only when the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: impl AsRef<Path>) -> McpResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write descriptors to a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> McpResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| McpError::Serialization(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Insert or replace a descriptor.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: ServerDescriptor) {
        self.servers.insert(name.into(), descriptor);
    }

    /// Remove a descriptor by name.
    pub fn remove(&mut self, name: &str) -> Option<ServerDescriptor> {
        self.servers.remove(name)
    }

    /// Get a descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers.get(name)
    }

    /// All configured server names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    /// Number of configured descriptors (valid or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether no descriptors are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

//! Transport configuration resolution.
//!
//! [`resolve_transport_config`] converts a name-keyed collection of
//! [`ServerDescriptor`]s into the subset that is valid and runnable. The
//! skip-on-invalid policy is deliberate product behavior: user-edited
//! configuration is frequently incomplete mid-edit, and dropping the broken
//! entries keeps the agent runtime startable with whatever subset is
//! currently well-formed. Resolution never fails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{ServerDescriptor, TransportKind};

/// A validated, runnable server configuration.
///
/// The variant is keyed by transport so that each carries only its own
/// fields; the "skip if the required field is missing" rule lives in
/// [`ServerConfig::from_descriptor`] rather than in scattered conditionals.
///
/// Wire shape matches what the agent runtime consumes: remote transports
/// carry a `type` tag and `url`; stdio configs are a bare
/// `{ "command", "args"?, "env"? }` object with no tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerConfig {
    /// A network transport (`sse` or `http`).
    Remote {
        /// Which network transport to use; never `stdio`.
        #[serde(rename = "type")]
        transport: TransportKind,
        /// Endpoint URL.
        url: String,
        /// Extra request headers; omitted entirely when empty.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<BTreeMap<String, String>>,
    },
    /// A local child process speaking over stdio.
    Stdio {
        /// Executable to spawn.
        command: String,
        /// Ordered argument list, passed through verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
        /// Environment variables, passed through verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        env: Option<BTreeMap<String, String>>,
    },
}

impl ServerConfig {
    /// Validate a descriptor into a runnable configuration.
    ///
    /// Returns `None` when the descriptor's transport is missing its
    /// required field: `url` for `sse`/`http`, `command` for `stdio`
    /// (including the defaulted/unrecognized case). Empty strings count as
    /// missing. An empty `headers` map is normalized away so it never
    /// appears in output.
    #[must_use]
    pub fn from_descriptor(descriptor: &ServerDescriptor) -> Option<Self> {
        match descriptor.transport_kind() {
            kind @ (TransportKind::Sse | TransportKind::Http) => {
                let url = descriptor.url.as_deref().filter(|url| !url.is_empty())?;
                Some(Self::Remote {
                    transport: kind,
                    url: url.to_string(),
                    headers: descriptor
                        .headers
                        .clone()
                        .filter(|headers| !headers.is_empty()),
                })
            },
            TransportKind::Stdio => {
                let command = descriptor
                    .command
                    .as_deref()
                    .filter(|command| !command.is_empty())?;
                Some(Self::Stdio {
                    command: command.to_string(),
                    args: descriptor.args.clone(),
                    env: descriptor.env.clone(),
                })
            },
        }
    }

    /// The transport this configuration uses.
    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        match self {
            Self::Remote { transport, .. } => *transport,
            Self::Stdio { .. } => TransportKind::Stdio,
        }
    }
}

/// Resolve a descriptor collection into its runnable subset.
///
/// Applied independently per entry: invalid entries are skipped with a
/// debug-level trace and never affect their neighbors. Output keys are
/// always a subset of input keys.
#[must_use]
pub fn resolve_transport_config(
    descriptors: &BTreeMap<String, ServerDescriptor>,
) -> BTreeMap<String, ServerConfig> {
    descriptors
        .iter()
        .filter_map(|(name, descriptor)| match ServerConfig::from_descriptor(descriptor) {
            Some(config) => Some((name.clone(), config)),
            None => {
                debug!(
                    server = %name,
                    transport = %descriptor.transport_kind(),
                    "skipping incomplete server descriptor"
                );
                None
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_one(descriptor: ServerDescriptor) -> Option<ServerConfig> {
        let mut descriptors = BTreeMap::new();
        descriptors.insert("server".to_string(), descriptor);
        resolve_transport_config(&descriptors).remove("server")
    }

    #[test]
    fn test_stdio_passthrough() {
        let config = resolve_one(
            ServerDescriptor::stdio("node")
                .with_args(["./server.js"])
                .with_env("API_KEY", "test123"),
        )
        .unwrap();

        let ServerConfig::Stdio { command, args, env } = config else {
            panic!("expected stdio config");
        };
        assert_eq!(command, "node");
        assert_eq!(args.unwrap(), vec!["./server.js"]);
        assert_eq!(env.unwrap()["API_KEY"], "test123");
    }

    #[test]
    fn test_stdio_without_args_env_stays_bare() {
        let config = resolve_one(ServerDescriptor::stdio("python")).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        let object = json.as_object().unwrap();
        // args/env are not defaulted to empty structures, and stdio carries
        // no type tag on the wire.
        assert_eq!(object.len(), 1);
        assert_eq!(object["command"], "python");
    }

    #[test]
    fn test_missing_transport_defaults_to_stdio() {
        let descriptor = ServerDescriptor {
            command: Some("python".to_string()),
            ..ServerDescriptor::default()
        };
        let config = resolve_one(descriptor).unwrap();
        assert_eq!(config.transport_kind(), TransportKind::Stdio);
    }

    #[test]
    fn test_stdio_missing_command_skipped() {
        assert!(resolve_one(ServerDescriptor::default()).is_none());
        assert!(resolve_one(ServerDescriptor::stdio("")).is_none());
    }

    #[test]
    fn test_sse_requires_url() {
        assert!(resolve_one(ServerDescriptor::sse("")).is_none());

        let descriptor = ServerDescriptor {
            transport: Some(TransportKind::Sse),
            // A leftover command does not rescue a missing url.
            command: Some("node".to_string()),
            ..ServerDescriptor::default()
        };
        assert!(resolve_one(descriptor).is_none());
    }

    #[test]
    fn test_sse_carries_type_and_url() {
        let config = resolve_one(
            ServerDescriptor::sse("http://localhost:8080/sse").with_header("X-Token", "abc"),
        )
        .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "sse");
        assert_eq!(json["url"], "http://localhost:8080/sse");
        assert_eq!(json["headers"]["X-Token"], "abc");
    }

    #[test]
    fn test_http_empty_headers_omitted() {
        let descriptor = ServerDescriptor {
            transport: Some(TransportKind::Http),
            url: Some("https://example.com/mcp".to_string()),
            headers: Some(BTreeMap::new()),
            ..ServerDescriptor::default()
        };
        let config = resolve_one(descriptor).unwrap();

        let ServerConfig::Remote { headers, .. } = &config else {
            panic!("expected remote config");
        };
        assert!(headers.is_none());

        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("headers").is_none());
    }

    #[test]
    fn test_mixed_map_drops_only_invalid_entries() {
        let mut descriptors = BTreeMap::new();
        descriptors.insert("good-stdio".to_string(), ServerDescriptor::stdio("node"));
        descriptors.insert(
            "good-http".to_string(),
            ServerDescriptor::http("https://example.com/mcp"),
        );
        descriptors.insert("bad-stdio".to_string(), ServerDescriptor::default());
        descriptors.insert("bad-sse".to_string(), ServerDescriptor::sse(""));

        let resolved = resolve_transport_config(&descriptors);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.contains_key("good-stdio"));
        assert!(resolved.contains_key("good-http"));
        // Output keys never stray outside the input keys.
        assert!(resolved.keys().all(|name| descriptors.contains_key(name)));
    }

    #[test]
    fn test_remote_config_round_trip() {
        let config = ServerConfig::Remote {
            transport: TransportKind::Http,
            url: "https://example.com/mcp".to_string(),
            headers: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

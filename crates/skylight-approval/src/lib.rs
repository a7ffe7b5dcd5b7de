//! Skylight approval — human-in-the-loop gating for agent tool calls.
//!
//! The agent runtime and the UI live in different request-handling contexts;
//! this crate is the coordination point between them:
//!
//! - [`ApprovalBroker`]: process-wide pending table correlating a tool
//!   authorization request with its eventual [`Decision`], with a fixed
//!   expiry timeout and event-driven cancellation.
//! - [`SessionRegistry`]: per-conversation state — at most one active
//!   streaming run and at most one outstanding approval per conversation.
//!
//! A denial caused by timeout or cancellation is delivered through the same
//! channel as a human "deny"; the agent runtime treats them identically.
//!
//! # Example
//!
//! ```rust,ignore
//! let broker = ApprovalBroker::new();
//! let sessions = SessionRegistry::new();
//!
//! // Chat endpoint: start streaming for a conversation.
//! let run = sessions.begin_run("conv-42");
//!
//! // Agent runtime: gate a tool call on a human decision.
//! let decision = broker
//!     .register("req-1", tool_input, Some(run.cancel.clone()))
//!     .await;
//!
//! // UI decision endpoint:
//! broker.resolve("req-1", Decision::allow());
//! ```
//!
//! Both services are cheap to clone and intended to be held by the process's
//! composition root, injected into every handler that needs them.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod broker;
pub mod decision;
pub mod session;

pub use broker::{ApprovalBroker, PENDING_TIMEOUT};
pub use decision::{Decision, ToolInput};
pub use session::{ActiveRun, SessionRegistry};

//! Per-conversation streaming and approval state.
//!
//! The [`SessionRegistry`] associates a conversation identifier with at most
//! one active streaming run and at most one outstanding approval request.
//! Starting a run hands out a [`CancellationToken`] that the caller wires
//! into [`ApprovalBroker::register`](crate::ApprovalBroker::register), so
//! stopping a run force-denies whatever approval that run is blocked on.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// One in-flight streaming run for a conversation.
#[derive(Debug, Clone)]
pub struct ActiveRun {
    /// Generated identifier for this run.
    pub run_id: Uuid,
    /// Fires when the run is stopped or replaced.
    pub cancel: CancellationToken,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl ActiveRun {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    run: Option<ActiveRun>,
    pending_approval: Option<String>,
}

/// Registry of per-conversation streaming/approval state.
///
/// Cheap to clone; all clones share one map. Each conversation holds at most
/// one [`ActiveRun`] and at most one outstanding approval id — enforcing the
/// client's "one stream, one question at a time" model.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionState>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run for a conversation, replacing any previous one.
    ///
    /// A previous run is cancelled first (its token fires, force-denying any
    /// approval registered against it) and its outstanding approval id is
    /// discarded. Returns the new run; its `cancel` token is the signal to
    /// pass to the broker when registering approvals for this run.
    pub fn begin_run(&self, conversation_id: &str) -> ActiveRun {
        let mut state = self
            .sessions
            .entry(conversation_id.to_string())
            .or_default();
        if let Some(previous) = state.run.take() {
            debug!(
                conversation_id,
                run_id = %previous.run_id,
                "cancelling previous run before starting a new one"
            );
            previous.cancel.cancel();
        }
        state.pending_approval = None;

        let run = ActiveRun::new();
        state.run = Some(run.clone());
        debug!(conversation_id, run_id = %run.run_id, "run started");
        run
    }

    /// Mark a run as finished, clearing the conversation's state.
    ///
    /// Only clears when `run_id` still names the active run — a conversation
    /// that already started a newer run is left untouched.
    pub fn finish_run(&self, conversation_id: &str, run_id: Uuid) {
        if let Some(mut state) = self.sessions.get_mut(conversation_id) {
            if state.run.as_ref().is_some_and(|run| run.run_id == run_id) {
                state.run = None;
                state.pending_approval = None;
                debug!(conversation_id, %run_id, "run finished");
            }
        }
    }

    /// Stop a conversation's active run, firing its cancellation token.
    ///
    /// Returns `false` when the conversation has no active run.
    pub fn stop(&self, conversation_id: &str) -> bool {
        let Some(mut state) = self.sessions.get_mut(conversation_id) else {
            return false;
        };
        let Some(run) = state.run.take() else {
            return false;
        };
        state.pending_approval = None;
        drop(state);

        debug!(conversation_id, run_id = %run.run_id, "run stopped");
        run.cancel.cancel();
        true
    }

    /// Record the conversation's outstanding approval request id.
    ///
    /// Returns the displaced id when one was already outstanding, so the
    /// caller can deny it — a conversation asks at most one question at a
    /// time.
    pub fn set_pending_approval(
        &self,
        conversation_id: &str,
        request_id: impl Into<String>,
    ) -> Option<String> {
        let mut state = self
            .sessions
            .entry(conversation_id.to_string())
            .or_default();
        state.pending_approval.replace(request_id.into())
    }

    /// Take the conversation's outstanding approval request id, if any.
    pub fn take_pending_approval(&self, conversation_id: &str) -> Option<String> {
        self.sessions
            .get_mut(conversation_id)
            .and_then(|mut state| state.pending_approval.take())
    }

    /// The conversation's active run, if any.
    #[must_use]
    pub fn active_run(&self, conversation_id: &str) -> Option<ActiveRun> {
        self.sessions
            .get(conversation_id)
            .and_then(|state| state.run.clone())
    }

    /// Whether the conversation currently has an active run.
    #[must_use]
    pub fn is_running(&self, conversation_id: &str) -> bool {
        self.sessions
            .get(conversation_id)
            .is_some_and(|state| state.run.is_some())
    }

    /// Number of conversations with any recorded state.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop all state for a conversation, cancelling its run if active.
    pub fn remove(&self, conversation_id: &str) {
        if let Some((_, state)) = self.sessions.remove(conversation_id) {
            if let Some(run) = state.run {
                run.cancel.cancel();
            }
        }
    }
}

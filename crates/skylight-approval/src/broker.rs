//! Pending-approval broker.
//!
//! The [`ApprovalBroker`] correlates an agent's "may I run this tool?"
//! request with the eventual human decision, across independent
//! request-handling contexts. An agent run suspends on [`register`] until a
//! UI decision arrives through [`resolve`], the entry exceeds the fixed
//! expiry timeout, or its cancellation signal fires. Each pending entry is
//! completed exactly once; every terminator removes the entry under the same
//! lock that completes it, so racing resolvers observe an absent entry and
//! back off.
//!
//! [`register`]: ApprovalBroker::register
//! [`resolve`]: ApprovalBroker::resolve

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::decision::{Decision, ToolInput};

/// How long a registered request may stay pending before it is force-denied.
///
/// A global constant rather than a per-request knob: five minutes is long
/// enough for a human to read the request and short enough that an abandoned
/// agent run cannot pin memory forever.
pub const PENDING_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One outstanding authorization request.
struct PendingEntry {
    /// Completes the suspended `register` future.
    tx: oneshot::Sender<Decision>,
    /// Original tool input, echoed back on approvals without an explicit edit.
    tool_input: ToolInput,
    /// When the lazy sweep force-denies this entry.
    expires_at: Instant,
    /// Fired on any terminal transition so the cancellation watcher exits.
    done: CancellationToken,
}

impl PendingEntry {
    /// Complete the entry exactly once and release its watcher.
    fn complete(self, decision: Decision) {
        self.done.cancel();
        // The receiver is gone only when the registering run was dropped;
        // the decision has nowhere to go in that case.
        let _ = self.tx.send(decision);
    }
}

struct BrokerInner {
    pending: Mutex<HashMap<String, PendingEntry>>,
}

impl BrokerInner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.pending.lock().unwrap_or_else(|e| {
            warn!("pending table lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Force-deny every entry whose deadline has passed.
    fn sweep(&self) {
        let mut pending = self.lock_pending();
        Self::sweep_locked(&mut pending);
    }

    fn sweep_locked(pending: &mut HashMap<String, PendingEntry>) {
        let now = Instant::now();
        let expired: Vec<String> = pending
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            if let Some(entry) = pending.remove(&id) {
                warn!(request_id = %id, "pending approval expired");
                entry.complete(Decision::denied_timeout());
            }
        }
    }

    /// Remove and force-deny a single entry, if still pending.
    fn force_deny(&self, id: &str, decision: Decision) {
        let entry = self.lock_pending().remove(id);
        if let Some(entry) = entry {
            debug!(request_id = %id, "force-denying pending approval");
            entry.complete(decision);
        }
    }
}

/// Process-wide correlation table for tool-authorization requests.
///
/// Cheap to clone; all clones share one pending table. The broker's own
/// methods are the sole mutation points — callers never see the lock.
///
/// # Example
///
/// ```rust,ignore
/// let broker = ApprovalBroker::new();
///
/// // Agent runtime, before executing a gated tool call:
/// let decision = broker.register("req-1", tool_input, Some(run_token)).await;
///
/// // UI decision endpoint, some time later:
/// broker.resolve("req-1", Decision::allow());
/// ```
#[derive(Clone)]
pub struct ApprovalBroker {
    inner: Arc<BrokerInner>,
}

impl ApprovalBroker {
    /// Create a broker with an empty pending table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a request and suspend until a decision arrives.
    ///
    /// Performs the lazy expiry sweep before inserting. The returned future
    /// completes with the UI decision from [`resolve`](Self::resolve), a
    /// timeout denial from a later sweep, or an abort denial when
    /// `cancel` fires — whichever wins. Callers guarantee `id` uniqueness
    /// among pending entries; when an id is reused anyway, the older waiter
    /// is denied and displaced rather than deduplicated.
    ///
    /// Cancellation is event-driven: a watcher task force-denies the entry
    /// the moment `cancel` fires, with no further broker activity required.
    pub async fn register(
        &self,
        id: impl Into<String>,
        tool_input: ToolInput,
        cancel: Option<CancellationToken>,
    ) -> Decision {
        let id = id.into();
        let (tx, rx) = oneshot::channel();
        let done = CancellationToken::new();

        {
            let mut pending = self.inner.lock_pending();
            BrokerInner::sweep_locked(&mut pending);

            let displaced = pending.insert(
                id.clone(),
                PendingEntry {
                    tx,
                    tool_input,
                    expires_at: Instant::now() + PENDING_TIMEOUT,
                    done: done.clone(),
                },
            );
            if let Some(old) = displaced {
                warn!(request_id = %id, "pending approval id reused, denying older waiter");
                old.complete(Decision::denied_superseded());
            }
        }
        debug!(request_id = %id, "registered pending approval");

        if let Some(cancel) = cancel {
            let inner = Arc::clone(&self.inner);
            let watcher_id = id.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = cancel.cancelled() => {
                        inner.force_deny(&watcher_id, Decision::denied_aborted());
                    },
                    () = done.cancelled() => {},
                }
            });
        }

        match rx.await {
            Ok(decision) => decision,
            // Unreachable through the broker's own paths; kept so a dropped
            // entry surfaces as a normal denial instead of a panic.
            Err(_) => Decision::deny("approval channel closed"),
        }
    }

    /// Deliver a decision for a pending request.
    ///
    /// Returns `false` when `id` is not pending (already resolved, expired,
    /// cancelled, or never registered) — callers must treat that as a no-op,
    /// not a failure. On success, approvals without an explicit
    /// `updated_input` get the originally registered tool input injected
    /// before the suspended run is woken.
    pub fn resolve(&self, id: &str, mut decision: Decision) -> bool {
        let entry = self.inner.lock_pending().remove(id);
        let Some(entry) = entry else {
            debug!(request_id = %id, "resolve on unknown pending approval");
            return false;
        };

        let PendingEntry {
            tx,
            tool_input,
            done,
            ..
        } = entry;
        decision.fill_missing_input(tool_input);
        debug!(request_id = %id, decision = %decision, "resolved pending approval");

        done.cancel();
        let _ = tx.send(decision);
        true
    }

    /// Number of currently pending requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Run the expiry sweep on a fixed interval.
    ///
    /// The lazy sweep in [`register`](Self::register) only runs when new
    /// requests arrive; this supplementary task bounds how long an expired
    /// entry can linger when no further registration ever happens. Outcomes
    /// are identical to the lazy sweep. The task runs until the returned
    /// handle is aborted.
    #[must_use = "dropping the handle detaches the sweeper; abort it to stop"]
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                inner.sweep();
            }
        })
    }

    /// Test hook: mark an entry as already due for expiry.
    #[cfg(test)]
    pub(crate) fn force_expire(&self, id: &str) {
        if let Some(entry) = self.inner.lock_pending().get_mut(id) {
            entry.expires_at = Instant::now();
        }
    }
}

impl Default for ApprovalBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApprovalBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalBroker")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ABORTED_REASON, SUPERSEDED_REASON, TIMEOUT_REASON};
    use serde_json::json;

    fn sample_input() -> ToolInput {
        let mut input = ToolInput::new();
        input.insert("command".to_string(), json!("cargo test"));
        input
    }

    async fn settle() {
        // Let spawned watcher tasks observe their tokens.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // -----------------------------------------------------------------------
    // Register / resolve
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_resolve_completes_registered_request() {
        let broker = ApprovalBroker::new();
        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("req-1", sample_input(), None).await })
        };
        settle().await;

        assert!(broker.resolve("req-1", Decision::allow()));
        let decision = waiter.await.unwrap();
        assert!(decision.is_approved());
        // Approving without an edit echoes the registered input back.
        assert_eq!(decision.updated_input(), Some(&sample_input()));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_preserves_explicit_edit() {
        let broker = ApprovalBroker::new();
        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("req-1", sample_input(), None).await })
        };
        settle().await;

        let mut edited = ToolInput::new();
        edited.insert("command".to_string(), json!("cargo check"));
        assert!(broker.resolve("req-1", Decision::allow_with_input(edited.clone())));
        assert_eq!(waiter.await.unwrap().updated_input(), Some(&edited));
    }

    #[tokio::test]
    async fn test_second_resolve_returns_false() {
        let broker = ApprovalBroker::new();
        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("req-1", sample_input(), None).await })
        };
        settle().await;

        assert!(broker.resolve("req-1", Decision::allow()));
        assert!(!broker.resolve("req-1", Decision::deny("late")));
        assert!(waiter.await.unwrap().is_approved());
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_is_noop() {
        let broker = ApprovalBroker::new();
        assert!(!broker.resolve("never-registered", Decision::allow()));
    }

    #[tokio::test]
    async fn test_concurrent_resolvers_exactly_one_wins() {
        let broker = ApprovalBroker::new();
        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("req-1", sample_input(), None).await })
        };
        settle().await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let broker = broker.clone();
            handles.push(tokio::spawn(async move {
                broker.resolve("req-1", Decision::deny(format!("resolver {i}")))
            }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert!(!waiter.await.unwrap().is_approved());
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_stale_entry_denied_by_next_register_sweep() {
        let broker = ApprovalBroker::new();
        let stale = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("stale", sample_input(), None).await })
        };
        settle().await;
        broker.force_expire("stale");

        // The next registration sweeps the table before inserting.
        let fresh = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("fresh", sample_input(), None).await })
        };
        settle().await;

        let decision = stale.await.unwrap();
        assert_eq!(decision.denial_reason(), Some(TIMEOUT_REASON));
        assert_eq!(broker.pending_count(), 1);

        assert!(broker.resolve("fresh", Decision::allow()));
        assert!(fresh.await.unwrap().is_approved());
    }

    #[tokio::test]
    async fn test_periodic_sweeper_expires_without_broker_traffic() {
        let broker = ApprovalBroker::new();
        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("stale", sample_input(), None).await })
        };
        settle().await;
        broker.force_expire("stale");

        let sweeper = broker.spawn_sweeper(Duration::from_millis(20));
        let decision = waiter.await.unwrap();
        assert!(!decision.is_approved());
        assert_eq!(broker.pending_count(), 0);
        sweeper.abort();
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_cancellation_signal_force_denies() {
        let broker = ApprovalBroker::new();
        let cancel = CancellationToken::new();
        let waiter = {
            let broker = broker.clone();
            let cancel = cancel.clone();
            tokio::spawn(
                async move { broker.register("req-1", sample_input(), Some(cancel)).await },
            )
        };
        settle().await;
        assert_eq!(broker.pending_count(), 1);

        // No resolve, no further register — the watcher alone must clean up.
        cancel.cancel();
        let decision = waiter.await.unwrap();
        assert_eq!(decision.denial_reason(), Some(ABORTED_REASON));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_beats_cancellation() {
        let broker = ApprovalBroker::new();
        let cancel = CancellationToken::new();
        let waiter = {
            let broker = broker.clone();
            let cancel = cancel.clone();
            tokio::spawn(
                async move { broker.register("req-1", sample_input(), Some(cancel)).await },
            )
        };
        settle().await;

        assert!(broker.resolve("req-1", Decision::allow()));
        // Firing the signal afterwards is a harmless no-op.
        cancel.cancel();
        settle().await;
        assert!(waiter.await.unwrap().is_approved());
    }

    // -----------------------------------------------------------------------
    // Id reuse
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_id_reuse_displaces_older_waiter() {
        let broker = ApprovalBroker::new();
        let first = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("dup", sample_input(), None).await })
        };
        settle().await;

        let second = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.register("dup", sample_input(), None).await })
        };
        settle().await;

        let displaced = first.await.unwrap();
        assert_eq!(displaced.denial_reason(), Some(SUPERSEDED_REASON));
        assert_eq!(broker.pending_count(), 1);

        assert!(broker.resolve("dup", Decision::allow()));
        assert!(second.await.unwrap().is_approved());
    }

    // -----------------------------------------------------------------------
    // Debug
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_debug() {
        let broker = ApprovalBroker::new();
        assert!(format!("{broker:?}").contains("ApprovalBroker"));
    }
}

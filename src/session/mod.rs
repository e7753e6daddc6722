//! Session registry: live, cancellable execution contexts of running jobs.
//!
//! One record per in-flight job, keyed by session id. Records are created at
//! submission, mutated only by the cancel operation, and removed when the job
//! reaches a terminal state. Safe under concurrent access from the job's own
//! task and from an external cancel request on another task.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
}

/// Thread-safe registry of active dubbing sessions.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionRecord>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session with the cancellation flag cleared.
    pub fn register(&self, session_id: &str) {
        let record = SessionRecord {
            id: session_id.to_string(),
            cancelled: false,
            started_at: Utc::now(),
        };
        self.sessions.insert(session_id.to_string(), record);
        tracing::info!(session_id = %session_id, "Registered dubbing session");
    }

    /// Request cancellation of a session.
    ///
    /// Returns `true` only on the first `false -> true` transition: an
    /// unknown session and a duplicate cancel are both refused. The DashMap
    /// entry lock makes the check-and-set atomic under concurrent duplicate
    /// calls.
    pub fn cancel(&self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut record) if !record.cancelled => {
                record.cancelled = true;
                tracing::info!(session_id = %session_id, "Session cancellation requested");
                true
            }
            Some(_) => false,
            None => {
                tracing::debug!(session_id = %session_id, "Cancel for unknown session refused");
                false
            }
        }
    }

    /// Current cancellation flag. An unknown session is never treated as
    /// cancelled, it is simply not trackable.
    pub fn is_cancelled(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .map(|record| record.cancelled)
            .unwrap_or(false)
    }

    /// Remove a session record unconditionally.
    pub fn deregister(&self, session_id: &str) {
        if let Some((_, record)) = self.sessions.remove(session_id) {
            tracing::info!(
                session_id = %session_id,
                duration_secs = (Utc::now() - record.started_at).num_seconds(),
                "Deregistered dubbing session"
            );
        }
    }

    pub fn list_active(&self) -> Vec<SessionRecord> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

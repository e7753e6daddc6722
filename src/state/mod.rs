//! Process-wide shared state and the boundary events the pipeline emits.

use crate::retention::RetentionStore;
use crate::session::SessionRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Boundary event broadcast to connected clients (SSE) while a job runs.
///
/// `log` lines are observational only and never consumed programmatically
/// downstream; every job terminates with exactly one of `finished`,
/// `cancelled`, or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Free-text, human-readable status line.
    Log { message: String },
    /// A job registered its session and is about to run.
    SessionStarted { session_id: String },
    /// The pipeline moved to a new stage.
    StepChange {
        session_id: String,
        step: String,
        message: String,
    },
    /// Fine-grained progress within a stage. `current` is non-decreasing
    /// per step within one job.
    Progress {
        session_id: String,
        step: String,
        current: usize,
        total: usize,
        percent: u8,
        message: String,
    },
    /// Terminal: the dubbed video is ready.
    Finished {
        session_id: String,
        output_file: String,
        title: String,
        duration_minutes: f64,
    },
    /// Terminal: the session was cancelled at a checkpoint.
    Cancelled { session_id: String },
    /// Terminal: a stage failed; `message` is the human-readable cause.
    Error { session_id: String, message: String },
}

impl AppEvent {
    pub fn log(message: impl Into<String>) -> Self {
        AppEvent::Log {
            message: message.into(),
        }
    }

    pub fn session_started(session_id: impl Into<String>) -> Self {
        AppEvent::SessionStarted {
            session_id: session_id.into(),
        }
    }

    pub fn step_change(
        session_id: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AppEvent::StepChange {
            session_id: session_id.into(),
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn finished(
        session_id: impl Into<String>,
        output_file: impl Into<String>,
        title: impl Into<String>,
        duration_minutes: f64,
    ) -> Self {
        AppEvent::Finished {
            session_id: session_id.into(),
            output_file: output_file.into(),
            title: title.into(),
            duration_minutes,
        }
    }

    pub fn cancelled(session_id: impl Into<String>) -> Self {
        AppEvent::Cancelled {
            session_id: session_id.into(),
        }
    }

    pub fn error(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        AppEvent::Error {
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// Shared application state: the two cross-job stores and the event bus.
///
/// The registry and retention store are the only cross-job shared mutable
/// state; both hold their locks only for short map operations, never across
/// a collaborator call.
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub retention: Arc<RetentionStore>,
    event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(retention_window_secs: u64) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);

        Arc::new(Self {
            sessions: Arc::new(SessionRegistry::new()),
            retention: Arc::new(RetentionStore::new(retention_window_secs)),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the event sender for use in other components.
    pub fn event_sender(&self) -> broadcast::Sender<AppEvent> {
        self.event_tx.clone()
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: AppEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("No subscribers for event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tagged_type() {
        let event = AppEvent::Progress {
            session_id: "abc123".into(),
            step: "translate".into(),
            current: 3,
            total: 10,
            percent: 30,
            message: "Translating segments".into(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "progress");
        assert_eq!(json["percent"], 30);
        assert_eq!(json["session_id"], "abc123");
    }

    #[test]
    fn broadcast_without_subscribers_does_not_panic() {
        let state = AppState::new(600);
        state.broadcast(AppEvent::log("nobody listening"));
    }

    #[tokio::test]
    async fn subscribers_receive_broadcasts() {
        let state = AppState::new(600);
        let mut rx = state.subscribe();

        state.broadcast(AppEvent::session_started("abc123"));

        match rx.recv().await.unwrap() {
            AppEvent::SessionStarted { session_id } => assert_eq!(session_id, "abc123"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

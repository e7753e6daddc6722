//! Progress reporting with built-in cancellation checkpoints.
//!
//! Every stage reports through here. A report first consults the session
//! registry: once the session is cancelled, the report itself fails with
//! `Cancelled`, which is how a mid-stage loop notices cancellation without
//! polling every inner iteration separately.

use crate::pipeline::error::PipelineError;
use crate::session::SessionRegistry;
use crate::state::AppEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct ProgressReporter {
    sessions: Arc<SessionRegistry>,
    events: broadcast::Sender<AppEvent>,
}

impl ProgressReporter {
    pub fn new(sessions: Arc<SessionRegistry>, events: broadcast::Sender<AppEvent>) -> Self {
        Self { sessions, events }
    }

    /// Poll the cancellation flag for a session.
    pub fn checkpoint(&self, session_id: &str) -> Result<(), PipelineError> {
        if self.sessions.is_cancelled(session_id) {
            tracing::info!(session_id = %session_id, "Cancellation noticed at checkpoint");
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    /// Emit a normalized progress event for `current` of `total` units.
    ///
    /// Fails with `Cancelled` instead of emitting once the session has been
    /// cancelled.
    pub fn report(
        &self,
        session_id: &str,
        step: &str,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.checkpoint(session_id)?;

        let message = message.into();
        let percent = percent(current, total);
        tracing::debug!(
            session_id = %session_id,
            step = step,
            current = current,
            total = total,
            percent = percent,
            "{}", message
        );
        self.emit(AppEvent::Progress {
            session_id: session_id.to_string(),
            step: step.to_string(),
            current,
            total,
            percent,
            message,
        });
        Ok(())
    }

    /// Announce a stage transition, also checked against cancellation.
    pub fn step_change(
        &self,
        session_id: &str,
        step: &str,
        message: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.checkpoint(session_id)?;

        let message = message.into();
        tracing::info!(session_id = %session_id, step = step, "{}", message);
        self.emit(AppEvent::step_change(session_id, step, message));
        Ok(())
    }

    /// Free-text status line for human consumption; never gated.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.emit(AppEvent::log(message));
    }

    fn emit(&self, event: AppEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("No subscribers for progress event");
        }
    }
}

/// `floor(current / total * 100)`, or 0 when `total` is 0.
pub fn percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((current as u64 * 100) / total as u64).min(100) as u8
}

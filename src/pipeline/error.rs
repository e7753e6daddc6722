//! Error taxonomy for the dubbing pipeline.
//!
//! Stage functions translate collaborator failures into these variants; the
//! orchestrator is the only place that converts them into a terminal job
//! outcome. `Cancelled` is not a true error, just the alternate termination
//! path a cancellation checkpoint takes.

use std::fmt;
use thiserror::Error;

/// Recognized reasons a source video cannot be fetched at all.
///
/// These three are detected in the fetcher's failure text and re-surfaced
/// with user-facing wording; everything else becomes a generic
/// [`PipelineError::Fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    Private,
    Removed,
    AgeRestricted,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnavailableReason::Private => "this video is private",
            UnavailableReason::Removed => "this video is not available",
            UnavailableReason::AgeRestricted => "this video requires age verification",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    SourceUnavailable(UnavailableReason),

    #[error("download failed: {0}")]
    Fetch(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("voice synthesis failed: {0}")]
    Synthesis(String),

    #[error("subtitle generation failed: {0}")]
    Subtitles(String),

    #[error("audio/video mux failed: {0}")]
    Mux(String),

    /// The session was cancelled and a checkpoint noticed.
    #[error("job cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_reasons_have_user_facing_text() {
        assert_eq!(
            UnavailableReason::Private.to_string(),
            "this video is private"
        );
        assert_eq!(
            PipelineError::SourceUnavailable(UnavailableReason::AgeRestricted).to_string(),
            "this video requires age verification"
        );
    }

    #[test]
    fn cancelled_is_not_a_failure_kind() {
        assert!(PipelineError::Cancelled.is_cancelled());
        assert!(!PipelineError::Fetch("x".into()).is_cancelled());
    }
}

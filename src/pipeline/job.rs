//! Job and segment data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Quality tier requested for the source download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Best,
    Medium,
    Low,
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(Quality::Best),
            "medium" => Ok(Quality::Medium),
            "low" => Ok(Quality::Low),
            other => Err(format!("unknown quality tier: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl FromStr for VoiceGender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "female" => Ok(VoiceGender::Female),
            "male" => Ok(VoiceGender::Male),
            other => Err(format!("unknown voice gender: {}", other)),
        }
    }
}

/// Execution mode, decided once after Fetch from the measured duration.
///
/// Short jobs use the smaller transcription model and synthesize the voice
/// track in one combined pass; long jobs process per-segment for fine-grained
/// progress and per-unit failure isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Short,
    Long,
}

impl Mode {
    /// Boundary at exactly the threshold resolves to `Long`.
    pub fn for_duration(duration_secs: f64, threshold_min: f64) -> Mode {
        if duration_secs / 60.0 < threshold_min {
            Mode::Short
        } else {
            Mode::Long
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Downloading,
    Transcribing,
    Translating,
    Synthesizing,
    Muxing,
    Completed,
    Cancelled,
    Failed,
}

/// One transcribed speech unit. Ordered by `start`; order is significant for
/// subtitle numbering and voice-track concatenation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Offset in seconds from the start of the media.
    pub start: f64,
    pub end: f64,
    /// Source-language text from transcription.
    pub text: String,
    /// Target-language text, populated by the translate stage. Carries the
    /// sentinel value when translation of this unit failed.
    pub text_fr: Option<String>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            text_fr: None,
        }
    }
}

/// Immutable request parameters for one dubbing job.
#[derive(Debug, Clone, Deserialize)]
pub struct DubRequest {
    pub url: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub voice_gender: VoiceGender,
    #[serde(default)]
    pub use_accelerator: bool,
}

/// One dubbing job. Owns its segment sequence and derived artifact paths;
/// the only cross-job shared state is the session registry and retention
/// store.
#[derive(Debug)]
pub struct Job {
    /// Session key and namespace for output filenames.
    pub id: String,
    pub request: DubRequest,
    /// Decided after Fetch; `None` until then.
    pub mode: Option<Mode>,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub video_path: Option<PathBuf>,
    pub voice_path: Option<PathBuf>,
    pub subtitle_path: Option<PathBuf>,
}

impl Job {
    pub fn new(request: DubRequest) -> Self {
        Self {
            id: mint_job_id(),
            request,
            mode: None,
            state: JobState::Queued,
            created_at: Utc::now(),
            video_path: None,
            voice_path: None,
            subtitle_path: None,
        }
    }
}

/// Opaque job token: the first 8 hex chars of a v4 UUID, short enough to
/// read in filenames while unique enough for a transient namespace.
fn mint_job_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Terminal outcome reported to the submitter. Always exactly one of these;
/// a stage failure never escapes the orchestrator as a fault.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Finished {
        session_id: String,
        /// File name of the final video under the output directory.
        output_file: String,
        title: String,
        duration_minutes: f64,
    },
    Cancelled {
        session_id: String,
    },
    Failed {
        session_id: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_short_below_threshold() {
        assert_eq!(Mode::for_duration(5.0 * 60.0, 30.0), Mode::Short);
        assert_eq!(Mode::for_duration(29.99 * 60.0, 30.0), Mode::Short);
    }

    #[test]
    fn mode_long_at_exact_threshold() {
        assert_eq!(Mode::for_duration(30.0 * 60.0, 30.0), Mode::Long);
    }

    #[test]
    fn mode_long_above_threshold() {
        assert_eq!(Mode::for_duration(90.0 * 60.0, 30.0), Mode::Long);
    }

    #[test]
    fn job_ids_are_short_and_unique() {
        let a = mint_job_id();
        let b = mint_job_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn quality_parses_case_insensitively() {
        assert_eq!("Best".parse::<Quality>().unwrap(), Quality::Best);
        assert!("4k".parse::<Quality>().is_err());
    }
}

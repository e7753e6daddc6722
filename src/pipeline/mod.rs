pub mod error;
pub mod job;
pub mod orchestrator;
pub mod stages;

pub use error::{PipelineError, UnavailableReason};
pub use job::{DubRequest, Job, JobOutcome, JobState, Mode, Quality, Segment, VoiceGender};
pub use orchestrator::Orchestrator;

//! The five ordered pipeline stages.
//!
//! Each stage wraps one collaborator call, checks cancellation before and
//! after execution (and at every sub-unit boundary where the collaborator
//! exposes one), and translates collaborator failures into the common error
//! taxonomy. Transitions are strictly linear; any failure or cancellation
//! aborts the remaining stages.

pub mod fetch;
pub mod mux;
pub mod synthesize;
pub mod transcribe;
pub mod translate;

use crate::config::Config;
use crate::media::Collaborators;
use crate::progress::ProgressReporter;

/// Everything a stage needs besides the job itself.
pub struct StageContext<'a> {
    pub reporter: &'a ProgressReporter,
    pub media: &'a Collaborators,
    pub config: &'a Config,
}

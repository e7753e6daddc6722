//! Translate stage: per-unit translation with per-unit failure tolerance.
//!
//! A failed unit gets the sentinel text and the job continues; only
//! cancellation aborts the stage. Units are processed in their original
//! order and each one is a cancellation checkpoint.

use super::StageContext;
use crate::pipeline::error::PipelineError;
use crate::pipeline::job::{Job, Segment};

pub const STEP: &str = "translate";

/// Sentinel stored in `text_fr` when translation of a unit fails. Never
/// retried.
pub const TRANSLATION_FAILED_SENTINEL: &str = "[Erreur de traduction]";

pub async fn run(
    job: &Job,
    mut segments: Vec<Segment>,
    ctx: &StageContext<'_>,
) -> Result<Vec<Segment>, PipelineError> {
    ctx.reporter
        .step_change(&job.id, STEP, "Translating segments")?;

    let total = segments.len();
    for (i, segment) in segments.iter_mut().enumerate() {
        match ctx.media.translator.translate(&segment.text).await {
            Ok(translated) => segment.text_fr = Some(translated),
            Err(e) => {
                tracing::warn!(
                    session_id = %job.id,
                    unit = i,
                    error = format!("{:#}", e),
                    "Translation failed for one segment, substituting sentinel"
                );
                segment.text_fr = Some(TRANSLATION_FAILED_SENTINEL.to_string());
            }
        }

        ctx.reporter.report(
            &job.id,
            STEP,
            i + 1,
            total,
            format!("Translated {}/{} segments", i + 1, total),
        )?;
    }

    ctx.reporter.log("Translation finished");
    Ok(segments)
}

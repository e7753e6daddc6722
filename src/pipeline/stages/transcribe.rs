//! Transcribe stage: one opaque inference call producing the ordered
//! segment sequence.

use super::StageContext;
use crate::media::ModelTier;
use crate::pipeline::error::PipelineError;
use crate::pipeline::job::{Job, Mode, Segment};
use std::path::Path;

pub const STEP: &str = "transcribe";

pub async fn run(
    job: &Job,
    mode: Mode,
    video: &Path,
    ctx: &StageContext<'_>,
) -> Result<Vec<Segment>, PipelineError> {
    let tier = ModelTier::for_mode(mode);
    ctx.reporter.step_change(
        &job.id,
        STEP,
        format!("Transcribing with the {} model", tier.as_str()),
    )?;

    // A single opaque call: interruptible only at its boundary, not mid-call.
    let segments = ctx
        .media
        .transcriber
        .transcribe(video, tier, &ctx.config.pipeline.source_lang)
        .await
        .map_err(|e| PipelineError::Transcription(format!("{:#}", e)))?;

    validate_order(&segments).map_err(PipelineError::Transcription)?;

    ctx.reporter.log(format!(
        "Transcription finished ({} segments)",
        segments.len()
    ));
    ctx.reporter.checkpoint(&job.id)?;

    Ok(segments)
}

/// Starts must be non-decreasing and every unit must span forward in time.
fn validate_order(segments: &[Segment]) -> Result<(), String> {
    for (i, segment) in segments.iter().enumerate() {
        if segment.start >= segment.end {
            return Err(format!(
                "segment {} has non-positive span ({} >= {})",
                i, segment.start, segment.end
            ));
        }
        if i > 0 && segment.start < segments[i - 1].start {
            return Err(format!("segment {} starts before its predecessor", i));
        }
    }
    Ok(())
}

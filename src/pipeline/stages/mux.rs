//! Mux stage: replace the source audio with the synthesized voice track.

use super::StageContext;
use crate::pipeline::error::PipelineError;
use crate::pipeline::job::Job;
use std::path::{Path, PathBuf};

pub const STEP: &str = "mux";

pub async fn run(
    job: &Job,
    video: &Path,
    voice: &Path,
    ctx: &StageContext<'_>,
) -> Result<PathBuf, PipelineError> {
    ctx.reporter
        .step_change(&job.id, STEP, "Muxing dubbed audio into the video")?;

    let output = ctx
        .config
        .storage
        .output_dir()
        .join(format!("video_traduite_{}.mp4", job.id));

    ctx.media
        .muxer
        .mux(video, voice, &output)
        .await
        .map_err(|e| PipelineError::Mux(format!("{:#}", e)))?;

    ctx.reporter
        .log(format!("Mux finished: {}", output.display()));
    ctx.reporter.checkpoint(&job.id)?;

    Ok(output)
}

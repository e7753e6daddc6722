//! Fetch stage: download the source video and measure its duration.

use super::StageContext;
use crate::media::FetchEvent;
use crate::pipeline::error::{PipelineError, UnavailableReason};
use crate::pipeline::job::Job;
use futures::StreamExt;
use std::path::PathBuf;

pub const STEP: &str = "download";

pub struct Fetched {
    pub video_path: PathBuf,
    pub title: String,
    pub duration_secs: f64,
}

pub async fn run(job: &Job, ctx: &StageContext<'_>) -> Result<Fetched, PipelineError> {
    ctx.reporter
        .step_change(&job.id, STEP, "Fetching source video")?;

    let mut stream = ctx
        .media
        .fetcher
        .fetch(
            &job.id,
            &job.request.url,
            job.request.quality,
            job.request.use_accelerator,
        )
        .await
        .map_err(|e| classify_failure(&format!("{:#}", e)))?;

    let mut completed: Option<(PathBuf, String)> = None;
    // Raw percentages restart per fragment when the downloader splits the
    // transfer (aria2c does this), so only the high-water mark is reported.
    let mut max_percent = 0usize;
    while let Some(event) = stream.next().await {
        match event {
            FetchEvent::Progress { percent, speed } => {
                // Each download chunk callback is a cancellation checkpoint.
                let message = match speed {
                    Some(speed) => format!("Downloading: {:.1}% at {}", percent, speed),
                    None => format!("Downloading: {:.1}%", percent),
                };
                max_percent = max_percent.max((percent.floor() as usize).min(100));
                ctx.reporter
                    .report(&job.id, STEP, max_percent, 100, message)?;
            }
            FetchEvent::Completed { file_path, title } => {
                completed = Some((file_path, title));
            }
            FetchEvent::Failed { message } => return Err(classify_failure(&message)),
        }
    }

    let (video_path, title) = completed
        .ok_or_else(|| PipelineError::Fetch("download ended without completing".to_string()))?;

    ctx.reporter
        .log(format!("Download finished: {}", video_path.display()));

    let duration_secs = ctx
        .media
        .probe
        .duration_secs(&video_path)
        .await
        .map_err(|e| PipelineError::Fetch(format!("duration probe failed: {:#}", e)))?;

    ctx.reporter.checkpoint(&job.id)?;

    Ok(Fetched {
        video_path,
        title,
        duration_secs,
    })
}

/// Map the fetcher's failure text onto the recognized source-unavailability
/// categories; anything unrecognized stays a generic fetch error carrying
/// the original text.
pub fn classify_failure(message: &str) -> PipelineError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("private video") {
        PipelineError::SourceUnavailable(UnavailableReason::Private)
    } else if lower.contains("video unavailable") {
        PipelineError::SourceUnavailable(UnavailableReason::Removed)
    } else if lower.contains("age-restricted") || lower.contains("confirm your age") {
        PipelineError::SourceUnavailable(UnavailableReason::AgeRestricted)
    } else {
        PipelineError::Fetch(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn recognizes_private_video() {
        assert_matches!(
            classify_failure("ERROR: [youtube] abc: Private video. Sign in if you..."),
            PipelineError::SourceUnavailable(UnavailableReason::Private)
        );
    }

    #[test]
    fn recognizes_removed_video() {
        assert_matches!(
            classify_failure("ERROR: [youtube] abc: Video unavailable"),
            PipelineError::SourceUnavailable(UnavailableReason::Removed)
        );
    }

    #[test]
    fn recognizes_age_restriction() {
        assert_matches!(
            classify_failure("Sign in to confirm your age. This video may be inappropriate"),
            PipelineError::SourceUnavailable(UnavailableReason::AgeRestricted)
        );
    }

    #[test]
    fn anything_else_is_generic() {
        assert_matches!(
            classify_failure("HTTP Error 403: Forbidden"),
            PipelineError::Fetch(msg) if msg.contains("403")
        );
    }
}

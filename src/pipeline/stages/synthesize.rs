//! Synthesize-voice stage.
//!
//! Short mode: one combined synthesis pass over the joined translated text.
//! Long mode: one synthesis call per segment into per-job fragment files,
//! skipping failed or empty units, then concatenation into a single track
//! and immediate fragment cleanup.

use super::StageContext;
use crate::media::VoiceProfile;
use crate::pipeline::error::PipelineError;
use crate::pipeline::job::{Job, Mode, Segment};
use std::path::PathBuf;

pub const STEP: &str = "synthesize";

pub async fn run(
    job: &Job,
    mode: Mode,
    segments: &[Segment],
    ctx: &StageContext<'_>,
) -> Result<PathBuf, PipelineError> {
    ctx.reporter
        .step_change(&job.id, STEP, "Generating dubbed voice track")?;

    let voice = VoiceProfile {
        lang: ctx.config.pipeline.target_lang.clone(),
        gender: job.request.voice_gender,
    };
    let output = ctx
        .config
        .storage
        .voices_dir()
        .join(format!("voix_{}.mp3", job.id));

    match mode {
        Mode::Short => synthesize_combined(job, segments, &voice, &output, ctx).await?,
        Mode::Long => synthesize_per_segment(job, segments, &voice, &output, ctx).await?,
    }

    ctx.reporter
        .log(format!("Voice track generated: {}", output.display()));
    ctx.reporter.checkpoint(&job.id)?;

    Ok(output)
}

async fn synthesize_combined(
    job: &Job,
    segments: &[Segment],
    voice: &VoiceProfile,
    output: &PathBuf,
    ctx: &StageContext<'_>,
) -> Result<(), PipelineError> {
    let text = segments
        .iter()
        .filter_map(|s| s.text_fr.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return Err(PipelineError::Synthesis(
            "no translated text to synthesize".to_string(),
        ));
    }

    let audio = ctx
        .media
        .synthesizer
        .synthesize(&text, voice)
        .await
        .map_err(|e| PipelineError::Synthesis(format!("{:#}", e)))?;

    tokio::fs::write(output, &audio)
        .await
        .map_err(|e| PipelineError::Synthesis(format!("failed to write voice track: {}", e)))?;

    ctx.reporter
        .report(&job.id, STEP, 1, 1, "Combined voice track generated")?;
    Ok(())
}

async fn synthesize_per_segment(
    job: &Job,
    segments: &[Segment],
    voice: &VoiceProfile,
    output: &PathBuf,
    ctx: &StageContext<'_>,
) -> Result<(), PipelineError> {
    let fragment_dir = ctx.config.storage.voice_temp_dir().join(&job.id);
    tokio::fs::create_dir_all(&fragment_dir)
        .await
        .map_err(|e| PipelineError::Synthesis(format!("failed to create fragment dir: {}", e)))?;

    let total = segments.len();
    let mut fragments: Vec<PathBuf> = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        let text = segment.text_fr.as_deref().unwrap_or("").trim();
        if text.is_empty() {
            ctx.reporter.report(
                &job.id,
                STEP,
                i + 1,
                total,
                format!("Skipped empty segment {}/{}", i + 1, total),
            )?;
            continue;
        }

        match ctx.media.synthesizer.synthesize(text, voice).await {
            Ok(audio) => {
                let fragment = fragment_dir.join(format!("segment_{}.mp3", i));
                tokio::fs::write(&fragment, &audio).await.map_err(|e| {
                    PipelineError::Synthesis(format!("failed to write fragment: {}", e))
                })?;
                fragments.push(fragment);
            }
            Err(e) => {
                // A single unit's failure is logged and the unit skipped.
                tracing::warn!(
                    session_id = %job.id,
                    unit = i,
                    error = format!("{:#}", e),
                    "Synthesis failed for one segment, skipping"
                );
            }
        }

        ctx.reporter.report(
            &job.id,
            STEP,
            i + 1,
            total,
            format!("Synthesized {}/{} segments", i + 1, total),
        )?;
    }

    if fragments.is_empty() {
        return Err(PipelineError::Synthesis(
            "no segment produced audio".to_string(),
        ));
    }

    ctx.media
        .concatenator
        .concat(&fragments, output)
        .await
        .map_err(|e| PipelineError::Synthesis(format!("{:#}", e)))?;

    // Fragments are intermediate only; drop them right away rather than
    // through the retention window.
    for fragment in &fragments {
        if let Err(e) = tokio::fs::remove_file(fragment).await {
            tracing::warn!(path = %fragment.display(), error = %e, "Failed to remove fragment");
        }
    }
    let _ = tokio::fs::remove_dir(&fragment_dir).await;

    Ok(())
}

//! Whisper CLI transcriber.
//!
//! One opaque inference call per job: the CLI writes a JSON transcript next
//! to nothing we keep, so it goes into a temp dir that drops with the guard.
//! There is no internal progress, which makes this the longest stretch of a
//! job with no cancellation checkpoint.

use super::{ModelTier, Transcriber};
use crate::pipeline::job::Segment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

pub struct WhisperTranscriber {
    bin: String,
}

impl WhisperTranscriber {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }
}

#[derive(Deserialize)]
struct WhisperOutput {
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        file: &Path,
        tier: ModelTier,
        language: &str,
    ) -> Result<Vec<Segment>> {
        let work_dir = tempfile::tempdir().context("Failed to create transcription work dir")?;

        let output = Command::new(&self.bin)
            .arg(file)
            .args(["--model", tier.as_str()])
            .args(["--language", language])
            .args(["--output_format", "json"])
            .arg("--output_dir")
            .arg(work_dir.path())
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.bin))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("whisper exited with {}: {}", output.status, stderr.trim());
        }

        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Media file has no usable name")?;
        let transcript_path = work_dir.path().join(format!("{}.json", stem));

        let raw = tokio::fs::read(&transcript_path)
            .await
            .with_context(|| format!("Whisper produced no transcript at {:?}", transcript_path))?;
        let parsed: WhisperOutput =
            serde_json::from_slice(&raw).context("Unparsable whisper transcript")?;

        Ok(parsed
            .segments
            .into_iter()
            .map(|s| Segment::new(s.start, s.end, s.text.trim()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_json_maps_to_segments() {
        let raw = r#"{"text": " hi there", "segments": [
            {"id": 0, "start": 0.0, "end": 1.2, "text": " Hi "},
            {"id": 1, "start": 1.2, "end": 2.0, "text": " there."}
        ], "language": "en"}"#;

        let parsed: WhisperOutput = serde_json::from_str(raw).unwrap();
        let segments: Vec<Segment> = parsed
            .segments
            .into_iter()
            .map(|s| Segment::new(s.start, s.end, s.text.trim()))
            .collect();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hi");
        assert!((segments[1].end - 2.0).abs() < f64::EPSILON);
        assert!(segments[0].text_fr.is_none());
    }
}

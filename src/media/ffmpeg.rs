//! ffmpeg subprocess wrappers: fragment concatenation and audio replacement.

use super::{Concatenator, Muxer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub struct FfmpegConcatenator {
    bin: String,
}

impl FfmpegConcatenator {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }
}

#[async_trait]
impl Concatenator for FfmpegConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            anyhow::bail!("no audio fragments to concatenate");
        }

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-y");
        for input in inputs {
            cmd.arg("-i").arg(input);
        }
        cmd.arg("-filter_complex")
            .arg(format!("concat=n={}:v=0:a=1", inputs.len()))
            .arg(output)
            .stdin(Stdio::null());

        let result = cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.bin))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!(
                "ffmpeg concat exited with {}: {}",
                result.status,
                last_lines(&stderr, 3)
            );
        }
        Ok(())
    }
}

pub struct FfmpegMuxer {
    bin: String,
}

impl FfmpegMuxer {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        // Copy the video stream untouched, encode the new audio track.
        let result = Command::new(&self.bin)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy"])
            .args(["-c:a", "aac"])
            .args(["-map", "0:v:0"])
            .args(["-map", "1:a:0"])
            .arg("-shortest")
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.bin))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!(
                "ffmpeg mux exited with {}: {}",
                result.status,
                last_lines(&stderr, 3)
            );
        }
        Ok(())
    }
}

/// ffmpeg stderr is long; keep only the tail, where the actual error is.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_lines_keeps_the_tail() {
        let text = "a\nb\n\nc\nd\n";
        assert_eq!(last_lines(text, 2), "c | d");
        assert_eq!(last_lines("only", 3), "only");
    }

    #[tokio::test]
    async fn concat_of_nothing_is_an_error() {
        let concat = FfmpegConcatenator::new("ffmpeg".into());
        let err = concat
            .concat(&[], Path::new("/tmp/out.mp3"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no audio fragments"));
    }
}

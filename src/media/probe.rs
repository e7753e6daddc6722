//! ffprobe duration probe.

use super::DurationProbe;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

pub struct FfprobeDurationProbe {
    bin: String,
}

impl FfprobeDurationProbe {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_secs(&self, file: &Path) -> Result<f64> {
        let output = Command::new(&self.bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(file)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.bin))?;

        let text = String::from_utf8_lossy(&output.stdout);
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("ffprobe returned no duration for {:?}", file);
        }

        text.parse::<f64>()
            .with_context(|| format!("Unparsable ffprobe duration: {}", text))
    }
}

//! yt-dlp subprocess fetcher.
//!
//! Downloads run with `--newline` so each progress line arrives separately;
//! the lines are parsed into [`FetchEvent`]s and forwarded through a channel
//! stream the fetch stage consumes as cancellation checkpoints.

use super::{FetchEvent, FetchStream, Fetcher, SourceInfo};
use crate::pipeline::job::Quality;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub struct YtDlpFetcher {
    bin: String,
    videos_dir: PathBuf,
    progress_re: Regex,
}

impl YtDlpFetcher {
    pub fn new(bin: String, videos_dir: PathBuf) -> Self {
        // yt-dlp progress lines: "[download]  42.7% of 10.00MiB at 1.21MiB/s ..."
        let progress_re =
            Regex::new(r"\[download\]\s+([0-9]+(?:\.[0-9]+)?)%(?:.*?\bat\s+(\S+))?").unwrap();
        Self {
            bin,
            videos_dir,
            progress_re,
        }
    }

    fn format_for(quality: Quality) -> &'static str {
        match quality {
            Quality::Best => "best[ext=mp4]",
            Quality::Medium => "best[ext=mp4][height<=720]",
            Quality::Low => "worst[ext=mp4]",
        }
    }

    fn parse_progress(&self, line: &str) -> Option<FetchEvent> {
        let caps = self.progress_re.captures(line)?;
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let speed = caps.get(2).map(|m| m.as_str().to_string());
        Some(FetchEvent::Progress { percent, speed })
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        job_id: &str,
        url: &str,
        quality: Quality,
        use_accelerator: bool,
    ) -> Result<FetchStream> {
        // Resolve the title up front; unavailable sources fail here with the
        // tool's own message, which the stage classifies.
        let info = self.probe_info(url).await?;
        let title = info.title;

        let output_path = self.videos_dir.join(format!("{}.mp4", job_id));

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-f")
            .arg(Self::format_for(quality))
            .arg("--newline")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg("-o")
            .arg(&output_path)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if use_accelerator {
            cmd.arg("--downloader").arg("aria2c");
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.bin))?;

        let stdout = child.stdout.take().context("yt-dlp stdout unavailable")?;
        let mut stderr = child.stderr.take().context("yt-dlp stderr unavailable")?;

        let (tx, rx) = mpsc::channel::<FetchEvent>(64);
        let progress_re = self.progress_re.clone();

        tokio::spawn(async move {
            let stderr_task = tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            });

            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    // The consumer dropping the stream (cancellation) must
                    // stop the download, not let it run to completion in the
                    // background. Kill the child and drop the partial file.
                    _ = tx.closed() => {
                        if let Err(e) = child.kill().await {
                            tracing::warn!(error = %e, "Failed to kill abandoned yt-dlp");
                        }
                        let _ = stderr_task.await;
                        let _ = tokio::fs::remove_file(&output_path).await;
                        return;
                    }
                    line = lines.next_line() => {
                        let line = match line {
                            Ok(Some(line)) => line,
                            _ => break,
                        };
                        if let Some(caps) = progress_re.captures(&line) {
                            let percent = caps
                                .get(1)
                                .and_then(|m| m.as_str().parse::<f32>().ok())
                                .unwrap_or(0.0);
                            let speed = caps.get(2).map(|m| m.as_str().to_string());
                            let _ = tx.send(FetchEvent::Progress { percent, speed }).await;
                        }
                    }
                }
            }

            let stderr_text = stderr_task.await.unwrap_or_default();
            let event = match child.wait().await {
                Ok(status) if status.success() && output_path.exists() => FetchEvent::Completed {
                    file_path: output_path,
                    title,
                },
                Ok(status) => {
                    let message = if stderr_text.trim().is_empty() {
                        format!("yt-dlp exited with status: {}", status)
                    } else {
                        stderr_text.trim().to_string()
                    };
                    FetchEvent::Failed { message }
                }
                Err(e) => FetchEvent::Failed {
                    message: format!("failed to wait for yt-dlp: {}", e),
                },
            };
            let _ = tx.send(event).await;
        });

        Ok(ReceiverStream::new(rx).boxed())
    }

    async fn probe_info(&self, url: &str) -> Result<SourceInfo> {
        let output = Command::new(&self.bin)
            .arg("--dump-json")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.bin))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{}", stderr.trim());
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .context("yt-dlp returned unparsable metadata")?;

        Ok(SourceInfo {
            title: value["title"].as_str().unwrap_or("untitled").to_string(),
            duration_seconds: value["duration"].as_f64().unwrap_or(0.0),
            thumbnail: value["thumbnail"].as_str().map(String::from),
            channel: value["channel"]
                .as_str()
                .or_else(|| value["uploader"].as_str())
                .map(String::from),
            view_count: value["view_count"].as_u64(),
        })
    }
}

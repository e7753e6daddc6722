//! Availability checks for the external tools the pipeline shells out to.

use crate::config::ToolsConfig;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

/// Resolve each configured tool on PATH and grab its version line.
pub fn check_tools(tools: &ToolsConfig) -> Vec<ToolStatus> {
    [
        ("yt-dlp", tools.ytdlp.as_str()),
        ("ffmpeg", tools.ffmpeg.as_str()),
        ("ffprobe", tools.ffprobe.as_str()),
        ("whisper", tools.whisper.as_str()),
    ]
    .into_iter()
    .map(|(name, bin)| check_tool(name, bin))
    .collect()
}

fn check_tool(name: &str, bin: &str) -> ToolStatus {
    match which::which(bin) {
        Ok(path) => {
            let version = Command::new(&path)
                .arg("--version")
                .output()
                .ok()
                .filter(|out| out.status.success())
                .and_then(|out| {
                    let text = String::from_utf8_lossy(&out.stdout);
                    text.lines().next().map(|l| l.trim().to_string())
                });

            ToolStatus {
                name: name.to_string(),
                available: true,
                path: Some(path),
                version,
            }
        }
        Err(_) => ToolStatus {
            name: name.to_string(),
            available: false,
            path: None,
            version: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_reported_unavailable() {
        let status = check_tool("bogus", "definitely-not-a-real-binary-xyz");
        assert!(!status.available);
        assert!(status.path.is_none());
        assert!(status.version.is_none());
    }
}

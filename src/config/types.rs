use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root under which all per-job artifact directories live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Downloaded source videos.
    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir.join("videos")
    }

    /// Synthesized voice tracks.
    pub fn voices_dir(&self) -> PathBuf {
        self.data_dir.join("voices")
    }

    /// Per-segment voice fragments, namespaced per job underneath.
    pub fn voice_temp_dir(&self) -> PathBuf {
        self.data_dir.join("voices").join("temp")
    }

    /// Generated subtitle files.
    pub fn subtitles_dir(&self) -> PathBuf {
        self.data_dir.join("subtitles")
    }

    /// Final dubbed videos, served for download.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("translated_videos")
    }

    /// Directories holding transient artifacts, for retention seeding.
    pub fn artifact_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.videos_dir(),
            self.voices_dir(),
            self.subtitles_dir(),
            self.output_dir(),
        ]
    }

    /// Create every artifact directory.
    pub fn bootstrap(&self) -> std::io::Result<()> {
        for dir in [
            self.videos_dir(),
            self.voices_dir(),
            self.voice_temp_dir(),
            self.subtitles_dir(),
            self.output_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// How long finished artifacts are kept before deletion.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often the sweeper scans for expired artifacts.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_window_secs() -> u64 {
    600
}
fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Media at or above this duration runs in long mode.
    #[serde(default = "default_threshold_min")]
    pub long_mode_threshold_min: f64,

    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    #[serde(default = "default_target_lang")]
    pub target_lang: String,
}

fn default_threshold_min() -> f64 {
    30.0
}
fn default_source_lang() -> String {
    "en".to_string()
}
fn default_target_lang() -> String {
    "fr".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            long_mode_threshold_min: default_threshold_min(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_whisper")]
    pub whisper: String,
}

fn default_ytdlp() -> String {
    "yt-dlp".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}
fn default_ffprobe() -> String {
    "ffprobe".to_string()
}
fn default_whisper() -> String {
    "whisper".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: default_ytdlp(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            whisper: default_whisper(),
        }
    }
}

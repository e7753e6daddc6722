//! Collaborator contracts consumed by the pipeline.
//!
//! Each external capability (downloader, duration probe, transcription
//! model, translator, speech synthesizer, audio concatenation, muxing) is an
//! opaque trait object: input in, output or failure out. The stages own all
//! error classification and cancellation checks; implementations here report
//! failures as plain `anyhow` errors carrying the underlying tool's text.

pub mod ffmpeg;
pub mod probe;
pub mod tools;
pub mod translate;
pub mod tts;
pub mod whisper;
pub mod ytdlp;

use crate::config::Config;
use crate::pipeline::job::{Mode, Quality, Segment, VoiceGender};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source metadata returned by [`Fetcher::probe_info`] without creating a job.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub title: String,
    pub duration_seconds: f64,
    pub thumbnail: Option<String>,
    pub channel: Option<String>,
    pub view_count: Option<u64>,
}

/// One observation from an in-flight download. The fetch stage consumes
/// these as a stream; each item is a cancellation checkpoint.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Progress {
        percent: f32,
        speed: Option<String>,
    },
    Completed {
        file_path: PathBuf,
        title: String,
    },
    Failed {
        message: String,
    },
}

pub type FetchStream = BoxStream<'static, FetchEvent>;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Start downloading `url` and return the event stream. The first error
    /// (bad URL, unavailable source) may surface here instead of in the
    /// stream.
    async fn fetch(
        &self,
        job_id: &str,
        url: &str,
        quality: Quality,
        use_accelerator: bool,
    ) -> Result<FetchStream>;

    /// Read-only source metadata.
    async fn probe_info(&self, url: &str) -> Result<SourceInfo>;
}

#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_secs(&self, file: &Path) -> Result<f64>;
}

/// Transcription model tier, derived from the job mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Tiny,
    Base,
}

impl ModelTier {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Short => ModelTier::Tiny,
            Mode::Long => ModelTier::Base,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
        }
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe speech into an ordered segment sequence (source text only).
    async fn transcribe(&self, file: &Path, tier: ModelTier, language: &str)
        -> Result<Vec<Segment>>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one unit of text. Per-call failure is tolerated by the
    /// caller and never aborts a job.
    async fn translate(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct VoiceProfile {
    pub lang: String,
    pub gender: VoiceGender,
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize speech audio for `text`. Per-call failure is tolerated in
    /// long mode (the unit is skipped).
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Concatenator: Send + Sync {
    /// Concatenate ordered audio files into a single track.
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

#[async_trait]
pub trait Muxer: Send + Sync {
    /// Replace the audio stream of `video` with `audio`, preserving the
    /// video stream unmodified. Fails loudly on any subprocess error.
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// The bundle of external capabilities one orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub probe: Arc<dyn DurationProbe>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub concatenator: Arc<dyn Concatenator>,
    pub muxer: Arc<dyn Muxer>,
}

impl Collaborators {
    /// Production wiring: subprocess tools plus the HTTP translation and
    /// speech endpoints.
    pub fn production(config: &Config) -> Self {
        let client = reqwest::Client::new();
        Self {
            fetcher: Arc::new(ytdlp::YtDlpFetcher::new(
                config.tools.ytdlp.clone(),
                config.storage.videos_dir(),
            )),
            probe: Arc::new(probe::FfprobeDurationProbe::new(config.tools.ffprobe.clone())),
            transcriber: Arc::new(whisper::WhisperTranscriber::new(
                config.tools.whisper.clone(),
            )),
            translator: Arc::new(translate::HttpTranslator::new(
                client.clone(),
                config.pipeline.source_lang.clone(),
                config.pipeline.target_lang.clone(),
            )),
            synthesizer: Arc::new(tts::HttpSynthesizer::new(client)),
            concatenator: Arc::new(ffmpeg::FfmpegConcatenator::new(config.tools.ffmpeg.clone())),
            muxer: Arc::new(ffmpeg::FfmpegMuxer::new(config.tools.ffmpeg.clone())),
        }
    }
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an [`Orchestrator`] to mock
//! collaborators over a temporary data directory, so full job lifecycles run
//! without any external tool or network access. [`MockBehavior`] steers the
//! mocks (media duration, transcript, injected failures, a fetch gate for
//! cancellation races) and [`CallCounters`] records what actually ran.

#![allow(dead_code)]

use async_trait::async_trait;
use dubforge::config::Config;
use dubforge::media::{
    Collaborators, Concatenator, DurationProbe, FetchEvent, FetchStream, Fetcher, ModelTier,
    Muxer, SourceInfo, Synthesizer, Transcriber, Translator, VoiceProfile,
};
use dubforge::pipeline::{DubRequest, Orchestrator, Segment};
use dubforge::session::SessionRegistry;
use dubforge::state::{AppEvent, AppState};
use futures::stream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::{broadcast, Notify};

pub const TEST_TITLE: &str = "Test Video";

/// Knobs steering the mock collaborators for one test.
pub struct MockBehavior {
    /// Duration reported by the probe after the download completes.
    pub duration_secs: f64,
    /// Transcript returned by the mock transcriber.
    pub segments: Vec<Segment>,
    /// When set, the fetch stream ends with this failure instead of
    /// completing.
    pub fetch_failure: Option<String>,
    /// The fetcher waits on this before emitting any event, letting a test
    /// cancel the session while the download is still pending.
    pub fetch_gate: Option<Arc<Notify>>,
    /// Raw percentages the fetch stream emits before completing. Regressing
    /// sequences imitate per-fragment restarts from accelerated downloads.
    pub fetch_progress: Vec<f32>,
    /// Zero-based translate call indexes that fail.
    pub translate_failures: Vec<usize>,
    /// Cancel every active session after this many translate calls.
    pub cancel_after_translate_calls: Option<usize>,
    /// Zero-based synthesize call indexes that fail.
    pub synth_failures: Vec<usize>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            duration_secs: 300.0,
            segments: vec![
                Segment::new(0.0, 2.5, "Hello everyone"),
                Segment::new(2.5, 5.0, "Welcome to the channel"),
                Segment::new(5.0, 8.0, "Today we build something"),
            ],
            fetch_failure: None,
            fetch_gate: None,
            fetch_progress: vec![25.0, 100.0],
            translate_failures: Vec::new(),
            cancel_after_translate_calls: None,
            synth_failures: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct CallCounters {
    pub fetch: AtomicUsize,
    pub transcribe: AtomicUsize,
    pub translate: AtomicUsize,
    pub synthesize: AtomicUsize,
    pub concat: AtomicUsize,
    pub mux: AtomicUsize,
}

pub struct TestHarness {
    pub config: Arc<Config>,
    pub state: Arc<AppState>,
    pub orchestrator: Arc<Orchestrator>,
    pub calls: Arc<CallCounters>,
    _data_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::default())
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        let data_dir = TempDir::new().expect("failed to create temp data dir");

        let mut config = Config::default();
        config.storage.data_dir = data_dir.path().to_path_buf();
        config.storage.bootstrap().expect("failed to create dirs");
        let config = Arc::new(config);

        let state = AppState::new(config.retention.window_secs);
        let calls = Arc::new(CallCounters::default());
        let behavior = Arc::new(behavior);

        let media = Arc::new(Collaborators {
            fetcher: Arc::new(MockFetcher {
                videos_dir: config.storage.videos_dir(),
                behavior: behavior.clone(),
                calls: calls.clone(),
            }),
            probe: Arc::new(MockProbe {
                behavior: behavior.clone(),
            }),
            transcriber: Arc::new(MockTranscriber {
                behavior: behavior.clone(),
                calls: calls.clone(),
            }),
            translator: Arc::new(MockTranslator {
                behavior: behavior.clone(),
                calls: calls.clone(),
                sessions: state.sessions.clone(),
            }),
            synthesizer: Arc::new(MockSynthesizer {
                behavior: behavior.clone(),
                calls: calls.clone(),
            }),
            concatenator: Arc::new(MockConcatenator {
                calls: calls.clone(),
            }),
            muxer: Arc::new(MockMuxer {
                calls: calls.clone(),
            }),
        });

        let orchestrator = Arc::new(Orchestrator::new(config.clone(), state.clone(), media));

        Self {
            config,
            state,
            orchestrator,
            calls,
            _data_dir: data_dir,
        }
    }

    pub fn request(url: &str) -> DubRequest {
        DubRequest {
            url: url.to_string(),
            quality: Default::default(),
            voice_gender: Default::default(),
            use_accelerator: false,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.state.subscribe()
    }

    pub fn voice_path(&self, session_id: &str) -> PathBuf {
        self.config
            .storage
            .voices_dir()
            .join(format!("voix_{}.mp3", session_id))
    }

    pub fn subtitle_path(&self, session_id: &str) -> PathBuf {
        self.config
            .storage
            .subtitles_dir()
            .join(format!("sous_titres_{}.srt", session_id))
    }

    pub fn output_path(&self, session_id: &str) -> PathBuf {
        self.config
            .storage
            .output_dir()
            .join(format!("video_traduite_{}.mp4", session_id))
    }

    pub fn fragment_dir(&self, session_id: &str) -> PathBuf {
        self.config.storage.voice_temp_dir().join(session_id)
    }
}

struct MockFetcher {
    videos_dir: PathBuf,
    behavior: Arc<MockBehavior>,
    calls: Arc<CallCounters>,
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(
        &self,
        job_id: &str,
        _url: &str,
        _quality: dubforge::pipeline::Quality,
        _use_accelerator: bool,
    ) -> anyhow::Result<FetchStream> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.behavior.fetch_gate {
            gate.notified().await;
        }

        if let Some(message) = &self.behavior.fetch_failure {
            let events = vec![FetchEvent::Failed {
                message: message.clone(),
            }];
            return Ok(Box::pin(stream::iter(events)));
        }

        let file_path = self.videos_dir.join(format!("{}.mp4", job_id));
        tokio::fs::write(&file_path, b"fake video bytes").await?;

        let mut events: Vec<FetchEvent> = self
            .behavior
            .fetch_progress
            .iter()
            .map(|&percent| FetchEvent::Progress {
                percent,
                speed: Some("1.2MiB/s".to_string()),
            })
            .collect();
        events.push(FetchEvent::Completed {
            file_path,
            title: TEST_TITLE.to_string(),
        });
        Ok(Box::pin(stream::iter(events)))
    }

    async fn probe_info(&self, _url: &str) -> anyhow::Result<SourceInfo> {
        Ok(SourceInfo {
            title: TEST_TITLE.to_string(),
            duration_seconds: self.behavior.duration_secs,
            thumbnail: None,
            channel: Some("Test Channel".to_string()),
            view_count: Some(42),
        })
    }
}

struct MockProbe {
    behavior: Arc<MockBehavior>,
}

#[async_trait]
impl DurationProbe for MockProbe {
    async fn duration_secs(&self, _file: &Path) -> anyhow::Result<f64> {
        Ok(self.behavior.duration_secs)
    }
}

struct MockTranscriber {
    behavior: Arc<MockBehavior>,
    calls: Arc<CallCounters>,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _file: &Path,
        _tier: ModelTier,
        _language: &str,
    ) -> anyhow::Result<Vec<Segment>> {
        self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
        Ok(self.behavior.segments.clone())
    }
}

struct MockTranslator {
    behavior: Arc<MockBehavior>,
    calls: Arc<CallCounters>,
    sessions: Arc<SessionRegistry>,
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> anyhow::Result<String> {
        let call = self.calls.translate.fetch_add(1, Ordering::SeqCst);

        if let Some(after) = self.behavior.cancel_after_translate_calls {
            if call + 1 == after {
                for record in self.sessions.list_active() {
                    self.sessions.cancel(&record.id);
                }
            }
        }

        if self.behavior.translate_failures.contains(&call) {
            anyhow::bail!("translation endpoint returned 429");
        }

        Ok(format!("FR: {}", text))
    }
}

struct MockSynthesizer {
    behavior: Arc<MockBehavior>,
    calls: Arc<CallCounters>,
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceProfile) -> anyhow::Result<Vec<u8>> {
        let call = self.calls.synthesize.fetch_add(1, Ordering::SeqCst);
        if self.behavior.synth_failures.contains(&call) {
            anyhow::bail!("speech endpoint returned 503");
        }
        Ok(format!("MP3:{}", text).into_bytes())
    }
}

struct MockConcatenator {
    calls: Arc<CallCounters>,
}

#[async_trait]
impl Concatenator for MockConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> anyhow::Result<()> {
        self.calls.concat.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!inputs.is_empty(), "no inputs to concatenate");

        let mut joined = Vec::new();
        for input in inputs {
            joined.extend(tokio::fs::read(input).await?);
        }
        tokio::fs::write(output, joined).await?;
        Ok(())
    }
}

struct MockMuxer {
    calls: Arc<CallCounters>,
}

#[async_trait]
impl Muxer for MockMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> anyhow::Result<()> {
        self.calls.mux.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(video.exists(), "missing video input");
        anyhow::ensure!(audio.exists(), "missing audio input");
        tokio::fs::write(output, b"muxed output").await?;
        Ok(())
    }
}

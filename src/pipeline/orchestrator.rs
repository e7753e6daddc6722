//! Job orchestrator: drives one dubbing job through the five stages.
//!
//! The orchestrator is the single point that converts stage failures and
//! cancellation into a terminal outcome. A submit call always returns a
//! normal [`JobOutcome`]; nothing escapes as a fault, and the session record
//! is deregistered on every exit path.

use crate::config::Config;
use crate::media::{Collaborators, SourceInfo};
use crate::pipeline::error::PipelineError;
use crate::pipeline::job::{DubRequest, Job, JobOutcome, JobState, Mode};
use crate::pipeline::stages::{self, StageContext};
use crate::progress::ProgressReporter;
use crate::state::{AppEvent, AppState};
use crate::subtitles;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Orchestrator {
    config: Arc<Config>,
    state: Arc<AppState>,
    media: Arc<Collaborators>,
    reporter: ProgressReporter,
}

struct FinishedJob {
    output_path: PathBuf,
    title: String,
    duration_minutes: f64,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, state: Arc<AppState>, media: Arc<Collaborators>) -> Self {
        let reporter = ProgressReporter::new(state.sessions.clone(), state.event_sender());
        Self {
            config,
            state,
            media,
            reporter,
        }
    }

    /// Mint a job and run it on its own task, returning the session id
    /// immediately. The outcome is only observable through the event stream.
    pub fn spawn(self: &Arc<Self>, request: DubRequest) -> String {
        let job = Job::new(request);
        let session_id = job.id.clone();
        let this = self.clone();
        tokio::spawn(async move {
            this.execute(job).await;
        });
        session_id
    }

    /// Run one dubbing job to a terminal state.
    ///
    /// Runs concurrently with other jobs (each job lives on its own task);
    /// the registry and retention store are the only shared state.
    pub async fn submit(&self, request: DubRequest) -> JobOutcome {
        self.execute(Job::new(request)).await
    }

    async fn execute(&self, mut job: Job) -> JobOutcome {
        let session_id = job.id.clone();

        self.state.sessions.register(&session_id);
        self.state
            .broadcast(AppEvent::session_started(session_id.clone()));
        tracing::info!(session_id = %session_id, url = %job.request.url, "Dub job submitted");

        let result = self.run_stages(&mut job).await;

        // Whatever got produced is kept for the retention window, on every
        // terminal path.
        self.schedule_retention(&job);
        self.state.sessions.deregister(&session_id);

        match result {
            Ok(finished) => {
                job.state = JobState::Completed;
                let output_file = finished
                    .output_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                tracing::info!(session_id = %session_id, output = %output_file, "Job finished");
                self.state.broadcast(AppEvent::finished(
                    session_id.clone(),
                    output_file.clone(),
                    finished.title.clone(),
                    finished.duration_minutes,
                ));
                JobOutcome::Finished {
                    session_id,
                    output_file,
                    title: finished.title,
                    duration_minutes: finished.duration_minutes,
                }
            }
            Err(PipelineError::Cancelled) => {
                job.state = JobState::Cancelled;
                tracing::info!(session_id = %session_id, "Job cancelled");
                self.state
                    .broadcast(AppEvent::cancelled(session_id.clone()));
                JobOutcome::Cancelled { session_id }
            }
            Err(e) => {
                job.state = JobState::Failed;
                let message = e.to_string();
                tracing::error!(session_id = %session_id, error = %message, "Job failed");
                self.state
                    .broadcast(AppEvent::error(session_id.clone(), message.clone()));
                JobOutcome::Failed {
                    session_id,
                    message,
                }
            }
        }
    }

    /// Flag a running session for cancellation.
    ///
    /// Does not block and does not stop the job immediately; the running
    /// stage notices at its next checkpoint. Returns whether the request
    /// was accepted (known session, first cancel).
    pub fn request_cancel(&self, session_id: &str) -> bool {
        let accepted = self.state.sessions.cancel(session_id);
        if accepted {
            self.state.broadcast(AppEvent::log(format!(
                "Cancellation requested for session {}",
                session_id
            )));
        }
        accepted
    }

    /// Read-only source metadata; no job is created.
    pub async fn fetch_info(&self, url: &str) -> anyhow::Result<SourceInfo> {
        self.media.fetcher.probe_info(url).await
    }

    async fn run_stages(&self, job: &mut Job) -> Result<FinishedJob, PipelineError> {
        let ctx = StageContext {
            reporter: &self.reporter,
            media: self.media.as_ref(),
            config: self.config.as_ref(),
        };

        job.state = JobState::Downloading;
        let fetched = stages::fetch::run(job, &ctx).await?;
        job.video_path = Some(fetched.video_path.clone());

        let mode = Mode::for_duration(
            fetched.duration_secs,
            self.config.pipeline.long_mode_threshold_min,
        );
        job.mode = Some(mode);
        let duration_minutes = fetched.duration_secs / 60.0;
        self.reporter.log(format!(
            "Mode selected: {:?} ({:.2} min)",
            mode, duration_minutes
        ));

        job.state = JobState::Transcribing;
        let segments = stages::transcribe::run(job, mode, &fetched.video_path, &ctx).await?;

        job.state = JobState::Translating;
        let segments = stages::translate::run(job, segments, &ctx).await?;

        // Side artifact, not a stage: a pure function of the translated
        // segments.
        let srt_path = self
            .config
            .storage
            .subtitles_dir()
            .join(format!("sous_titres_{}.srt", job.id));
        let srt_path = subtitles::write_srt(&segments, &srt_path)
            .map_err(|e| PipelineError::Subtitles(format!("{:#}", e)))?;
        job.subtitle_path = Some(srt_path);

        job.state = JobState::Synthesizing;
        let voice_path = stages::synthesize::run(job, mode, &segments, &ctx).await?;
        job.voice_path = Some(voice_path.clone());

        job.state = JobState::Muxing;
        let output_path =
            stages::mux::run(job, &fetched.video_path, &voice_path, &ctx).await?;

        Ok(FinishedJob {
            output_path,
            title: fetched.title,
            duration_minutes,
        })
    }

    /// Schedule every artifact the job produced, plus any per-segment
    /// fragments a cancelled or failed long job left behind.
    fn schedule_retention(&self, job: &Job) {
        for path in [&job.video_path, &job.voice_path, &job.subtitle_path]
            .into_iter()
            .flatten()
        {
            self.state.retention.schedule_deletion(path);
        }

        let fragment_dir = self.config.storage.voice_temp_dir().join(&job.id);
        if fragment_dir.is_dir() {
            if let Ok(entries) = std::fs::read_dir(&fragment_dir) {
                for entry in entries.flatten() {
                    self.state.retention.schedule_deletion(&entry.path());
                }
            }
        }
    }
}

//! Collaborator-facing recorder.
//!
//! This is the surface a UI drives: `start`, `stop`, `assemble`, plus the
//! status snapshot and recorded-videos list it displays. It owns the capture
//! loop and the assembly pipeline and enforces the ordering between them.

use crate::assembly::{AssembleError, AssemblyPipeline, EncodeOutcome};
use crate::capture::{CaptureLoop, CaptureSession, ScreenGrabber};
use crate::config::RecorderConfig;
use crate::encoder::{EncodeError, EncoderProcess, ProgressSink};
use crate::frames::{Frame, FrameStore, StorageError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Encoder(#[from] EncodeError),

    #[error("Recording in progress — stop it before saving")]
    StillRecording,

    #[error("A video is being saved — wait for it to finish before recording")]
    Saving,
}

/// Snapshot for a status display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderStatus {
    pub recording: bool,
    pub saving: bool,
    pub frames: usize,
    pub elapsed_secs: u64,
    pub output_path: Option<PathBuf>,
}

pub struct Recorder {
    capture: CaptureLoop,
    pipeline: AssemblyPipeline,
    recordings: Mutex<Vec<PathBuf>>,
}

impl Recorder {
    /// Builds a recorder around `grabber` and `encoder`.
    ///
    /// Creates the frames directory up front so a bad location is reported
    /// before the first recording.
    pub fn new(
        config: &RecorderConfig,
        grabber: Arc<dyn ScreenGrabber>,
        encoder: EncoderProcess,
    ) -> Result<Self, RecorderError> {
        let store = Arc::new(FrameStore::new(&config.frames_dir)?);
        store.ensure_ready()?;

        log::info!(
            "[RECORDER] Frames in {}, videos to {}",
            store.dir().display(),
            config.output_dir.display()
        );

        Ok(Self {
            capture: CaptureLoop::new(
                Arc::clone(&store),
                grabber,
                config.capture_interval,
                &config.output_dir,
            ),
            pipeline: AssemblyPipeline::new(store, encoder, &config.manifest_dir),
            recordings: Mutex::new(Vec::new()),
        })
    }

    /// Recorder for the primary monitor, with FFmpeg resolved from config.
    #[cfg(feature = "monitor")]
    pub fn with_primary_monitor(config: &RecorderConfig) -> Result<Self, RecorderError> {
        let encoder = EncoderProcess::locate(config.encoder.clone())?;
        Self::new(config, Arc::new(crate::capture::PrimaryMonitor), encoder)
    }

    /// Arms capture. Idempotent while already recording.
    ///
    /// Arming clears frames left from a previous, unsaved session.
    pub async fn start(&self) -> Result<CaptureSession, RecorderError> {
        if self.pipeline.is_busy() {
            return Err(RecorderError::Saving);
        }
        Ok(self.capture.start().await?)
    }

    /// Disarms capture. Returns `false` if it was not recording.
    pub async fn stop(&self) -> bool {
        self.capture.stop().await
    }

    /// Runs one capture tick now. A no-op returning `None` unless recording.
    pub async fn tick(&self) -> Option<Frame> {
        self.capture.tick().await
    }

    /// Encodes the stopped session into its output file.
    ///
    /// On success the frames are gone, the session is cleared and the output
    /// path is added to [`Recorder::recordings`]. On failure the frames are
    /// kept and the call can be repeated.
    pub async fn assemble(&self, sink: &dyn ProgressSink) -> Result<EncodeOutcome, RecorderError> {
        if self.capture.is_armed().await {
            return Err(RecorderError::StillRecording);
        }
        let Some(session) = self.capture.session().await else {
            return Err(AssembleError::EmptySession.into());
        };

        let outcome = self.pipeline.assemble(&session, sink).await?;

        self.capture.clear_session().await;
        self.recordings_mut().push(outcome.output_path.clone());
        Ok(outcome)
    }

    pub async fn status(&self) -> RecorderStatus {
        RecorderStatus {
            recording: self.capture.is_armed().await,
            saving: self.pipeline.is_busy(),
            frames: self.capture.store().len(),
            elapsed_secs: self.capture.elapsed().await.as_secs(),
            output_path: self.capture.session().await.map(|s| s.output_path),
        }
    }

    /// Time spent recording in the live or most recent session.
    pub async fn elapsed(&self) -> Duration {
        self.capture.elapsed().await
    }

    pub fn frame_count(&self) -> usize {
        self.capture.store().len()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.capture.store().list_ordered()
    }

    /// Output files of every successful assembly, oldest first.
    pub fn recordings(&self) -> Vec<PathBuf> {
        self.recordings_mut().clone()
    }

    /// Stops capture and deletes any frames left on disk.
    pub async fn shutdown(&self) {
        self.capture.stop().await;
        if self.pipeline.is_busy() {
            log::warn!("[RECORDER] Shutting down while a video is being saved — frames kept");
            return;
        }
        self.capture.store().purge_all();
        log::info!("[RECORDER] Shut down");
    }

    fn recordings_mut(&self) -> std::sync::MutexGuard<'_, Vec<PathBuf>> {
        self.recordings.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Assembly pipeline — turns a stopped session's frames into one video.
//!
//! Two rules hold here:
//! - single-flight: a second `assemble` while one is running fails with
//!   [`AssembleError::Busy`] and touches nothing;
//! - frames survive failure: the store is only purged after the encoder
//!   succeeded, so a failed attempt can be retried without re-capturing.

use crate::capture::CaptureSession;
use crate::encoder::{EncodeError, EncoderProcess, ManifestFile, ProgressEvent, ProgressSink};
use crate::frames::{FrameStore, StorageError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("No frames captured to save")]
    EmptySession,

    #[error("Already saving a video — please wait")]
    Busy,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub output_path: PathBuf,
    pub frame_count: usize,
    pub size_bytes: u64,
    pub elapsed: Duration,
}

pub struct AssemblyPipeline {
    store: Arc<FrameStore>,
    encoder: EncoderProcess,
    manifest_dir: PathBuf,
    in_flight: AtomicBool,
}

/// Holds the single-flight flag; releases it on drop.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AssemblyPipeline {
    pub fn new(store: Arc<FrameStore>, encoder: EncoderProcess, manifest_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            encoder,
            manifest_dir: manifest_dir.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while an `assemble` call is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn encoder(&self) -> &EncoderProcess {
        &self.encoder
    }

    /// Encodes every frame in the store into `session.output_path`.
    ///
    /// Steps: announce, write the manifest, run the encoder, then on success
    /// purge the store and announce completion. On failure the store is left
    /// exactly as it was and the encoder's error text is returned verbatim.
    pub async fn assemble(
        &self,
        session: &CaptureSession,
        sink: &dyn ProgressSink,
    ) -> Result<EncodeOutcome, AssembleError> {
        let _flight = FlightGuard::acquire(&self.in_flight).ok_or(AssembleError::Busy)?;

        let frames = self.store.list_ordered();
        if frames.is_empty() {
            return Err(AssembleError::EmptySession);
        }

        let start = Instant::now();
        log::info!(
            "[ASSEMBLY] Encoding {} frames into {}",
            frames.len(),
            session.output_path.display()
        );

        sink.report(ProgressEvent::stage("Preparing to save video..."));
        if let Some(parent) = session.output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        sink.report(ProgressEvent::stage("Creating input file list..."));
        let manifest = ManifestFile::create(&self.manifest_dir, &frames)?;

        let video = match self.encoder.run(manifest, &session.output_path, sink).await {
            Ok(video) => video,
            Err(e) => {
                log::warn!(
                    "[ASSEMBLY] Encode failed — keeping {} frames for retry: {}",
                    frames.len(),
                    e
                );
                return Err(e.into());
            }
        };

        self.store.purge_all();
        sink.report(ProgressEvent::stage("Video creation completed successfully."));

        let outcome = EncodeOutcome {
            output_path: video.path,
            frame_count: frames.len(),
            size_bytes: video.size_bytes,
            elapsed: start.elapsed(),
        };
        log::info!(
            "[ASSEMBLY] Saved {} in {}ms",
            outcome.output_path.display(),
            outcome.elapsed.as_millis()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);

        let first = FlightGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(FlightGuard::acquire(&flag).is_none());

        drop(first);
        assert!(FlightGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn empty_store_fails_without_side_effects() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FrameStore::new(tmp.path().join("frames")).unwrap());
        store.ensure_ready().unwrap();

        let pipeline = AssemblyPipeline::new(
            Arc::clone(&store),
            EncoderProcess::new("/not/used", Default::default()),
            tmp.path(),
        );
        let session = CaptureSession {
            output_path: tmp.path().join("out.mp4"),
            started_at: chrono::Local::now(),
        };

        let events = std::sync::Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| events.lock().unwrap().push(e);
        let result = pipeline.assemble(&session, &sink).await;

        assert!(matches!(result, Err(AssembleError::EmptySession)));
        assert!(events.lock().unwrap().is_empty());
        assert!(!pipeline.is_busy());
        // Only the frames directory exists — no manifest, no output
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}

//! Periodic capture loop.
//!
//! State machine: Disarmed → Armed → Disarmed, driven only by `start` and
//! `stop`. While armed, a spawned ticker task fires every capture period and
//! runs one tick: grab the screen, encode PNG, append to the frame store.
//! Grab and encode are blocking work and run on tokio's blocking pool.
//!
//! A tick never fails the loop. Any grab, encode or write error is logged
//! and the frame is dropped.

use super::encode::{encode_png, FrameEncodeError};
use super::screenshot::{CaptureError, ScreenGrabber};
use crate::frames::{Frame, FrameStore, StorageError};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The frames and output target of one Start..Stop span.
///
/// Frames themselves live in the [`FrameStore`]; the session only carries
/// what was decided at arm time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    pub output_path: PathBuf,
    pub started_at: DateTime<Local>,
}

/// Output file for a session armed at `at`:
/// `<dir>/screen_recording_<YYYYMMDD_HHmmss>.mp4`.
pub fn session_output_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("screen_recording_{}.mp4", at.format("%Y%m%d_%H%M%S")))
}

/// Why a single tick dropped its frame. Logged, never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Grab(#[from] CaptureError),

    #[error(transparent)]
    Encode(#[from] FrameEncodeError),

    #[error(transparent)]
    Write(#[from] StorageError),

    #[error("Capture worker panicked or was cancelled: {0}")]
    Worker(String),
}

/// Shared between the loop handle and its ticker task.
struct TickContext {
    store: Arc<FrameStore>,
    grabber: Arc<dyn ScreenGrabber>,
    armed: AtomicBool,
}

impl TickContext {
    async fn tick(self: &Arc<Self>) -> Option<Frame> {
        if !self.armed.load(Ordering::SeqCst) {
            return None;
        }

        let ctx = Arc::clone(self);
        let result = tokio::task::spawn_blocking(move || ctx.capture_frame())
            .await
            .unwrap_or_else(|e| Err(TickError::Worker(e.to_string())));

        match result {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("[CAPTURE] Frame capture error: {}", e);
                None
            }
        }
    }

    fn capture_frame(&self) -> Result<Frame, TickError> {
        let start = Instant::now();

        let image = self.grabber.grab()?;
        let png_bytes = encode_png(&image)?;
        let frame = self.store.append(&png_bytes)?;

        log::trace!(
            "[CAPTURE] Frame {} ({} bytes) in {}ms",
            frame.sequence,
            png_bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(frame)
    }
}

/// `tokio::time::interval` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

struct Ticker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    armed_at: Instant,
}

#[derive(Default)]
struct LoopState {
    ticker: Option<Ticker>,
    session: Option<CaptureSession>,
    recorded: Duration,
}

pub struct CaptureLoop {
    ctx: Arc<TickContext>,
    period: Duration,
    output_dir: PathBuf,
    state: Mutex<LoopState>,
}

impl CaptureLoop {
    pub fn new(
        store: Arc<FrameStore>,
        grabber: Arc<dyn ScreenGrabber>,
        period: Duration,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ctx: Arc::new(TickContext {
                store,
                grabber,
                armed: AtomicBool::new(false),
            }),
            period: period.max(MIN_PERIOD),
            output_dir: output_dir.into(),
            state: Mutex::new(LoopState::default()),
        }
    }

    /// Arms the loop and starts ticking.
    ///
    /// No-op when already armed: the live session is returned unchanged and
    /// no second ticker is spawned. Otherwise clears any frames left in the
    /// store, zeroes the sequence counter and derives a fresh output path.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> Result<CaptureSession, StorageError> {
        let mut state = self.state.lock().await;

        if state.ticker.is_some() {
            if let Some(session) = &state.session {
                return Ok(session.clone());
            }
        }

        self.ctx.store.ensure_ready()?;
        self.ctx.store.purge_all();

        let started_at = Local::now();
        let session = CaptureSession {
            output_path: session_output_path(&self.output_dir, started_at),
            started_at,
        };

        self.ctx.armed.store(true, Ordering::SeqCst);

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_ticker(Arc::clone(&self.ctx), self.period, shutdown_rx));

        state.ticker = Some(Ticker {
            shutdown,
            handle,
            armed_at: Instant::now(),
        });
        state.session = Some(session.clone());
        state.recorded = Duration::ZERO;

        log::info!(
            "[CAPTURE] Armed — every {}ms into {}, output {}",
            self.period.as_millis(),
            self.ctx.store.dir().display(),
            session.output_path.display()
        );
        Ok(session)
    }

    /// Disarms the loop. Returns `false` when it was not armed.
    ///
    /// Waits for an in-flight tick to finish, so no frame is appended after
    /// this returns. Captured frames stay in the store.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;

        let Some(ticker) = state.ticker.take() else {
            return false;
        };

        self.ctx.armed.store(false, Ordering::SeqCst);
        let _ = ticker.shutdown.send(());
        if let Err(e) = ticker.handle.await {
            log::warn!("[CAPTURE] Ticker task ended abnormally: {}", e);
        }
        state.recorded = ticker.armed_at.elapsed();

        log::info!(
            "[CAPTURE] Disarmed after {}ms — {} frames captured",
            state.recorded.as_millis(),
            self.ctx.store.len()
        );
        true
    }

    /// Runs one capture tick immediately, outside the schedule.
    ///
    /// Same body the ticker runs: a no-op while disarmed, and any failure is
    /// logged and reported as `None`.
    pub async fn tick(&self) -> Option<Frame> {
        self.ctx.tick().await
    }

    pub async fn is_armed(&self) -> bool {
        self.state.lock().await.ticker.is_some()
    }

    /// The live or most recent session, if any.
    pub async fn session(&self) -> Option<CaptureSession> {
        self.state.lock().await.session.clone()
    }

    /// Forgets the current session after it has been assembled.
    pub async fn clear_session(&self) {
        let mut state = self.state.lock().await;
        if state.ticker.is_none() {
            state.session = None;
            state.recorded = Duration::ZERO;
        }
    }

    /// Time spent armed in the live session, or in the last one once stopped.
    pub async fn elapsed(&self) -> Duration {
        let state = self.state.lock().await;
        match &state.ticker {
            Some(ticker) => ticker.armed_at.elapsed(),
            None => state.recorded,
        }
    }

    pub fn store(&self) -> &Arc<FrameStore> {
        &self.ctx.store
    }
}

/// Ticker body. The first tick fires one period after arming.
///
/// Exits on the shutdown signal, or when the sender is dropped along with
/// the loop.
async fn run_ticker(
    ctx: Arc<TickContext>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                ctx.tick().await;
            }
        }
    }
}

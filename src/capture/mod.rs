//! Screen capture domain — public API.
//!
//! This module owns the periodic capture loop and everything it needs:
//! the screen-grab seam, PNG encoding of grabbed images, and the
//! Disarmed/Armed state machine that drives ticks into the frame store.

mod capture_loop;
mod encode;
mod screenshot;

pub use capture_loop::{session_output_path, CaptureLoop, CaptureSession, TickError};
pub use encode::{encode_png, FrameEncodeError};
#[cfg(feature = "monitor")]
pub use screenshot::{capture_primary_monitor, PrimaryMonitor};
pub use screenshot::{CaptureError, ScreenGrabber};

//! Full-screen capture.
//!
//! This is the infrastructure layer — it talks to the OS through `xcap`.
//! Everything above it only sees the [`ScreenGrabber`] trait, so tests and
//! alternative backends can stand in for the real display.

use image::DynamicImage;

/// Source of full-screen images, called once per capture tick from a
/// blocking worker thread.
pub trait ScreenGrabber: Send + Sync + 'static {
    fn grab(&self) -> Result<DynamicImage, CaptureError>;
}

/// Grabs the primary monitor via `xcap`.
#[cfg(feature = "monitor")]
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryMonitor;

#[cfg(feature = "monitor")]
impl ScreenGrabber for PrimaryMonitor {
    fn grab(&self) -> Result<DynamicImage, CaptureError> {
        capture_primary_monitor()
    }
}

/// Captures the primary monitor's screen as a `DynamicImage`.
///
/// Falls back to the first monitor when none reports itself as primary.
#[cfg(feature = "monitor")]
pub fn capture_primary_monitor() -> Result<DynamicImage, CaptureError> {
    use xcap::Monitor;

    let monitors = Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    let primary_index = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);

    let primary = monitors
        .into_iter()
        .nth(primary_index)
        .ok_or(CaptureError::NoPrimaryMonitor)?;

    let image = primary
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    Ok(DynamicImage::ImageRgba8(image))
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}

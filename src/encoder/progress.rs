//! Progress events and the sink they are delivered to.

use serde::Serialize;
use std::fmt;

/// A status update during assembly: either a pipeline stage or one raw line
/// of encoder output. Delivered in order, best-effort, without backpressure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "camelCase")]
pub enum ProgressEvent {
    /// Pipeline stage announcement.
    Stage(String),
    /// A line the encoder printed on stdout.
    Output(String),
    /// A line the encoder printed on stderr (FFmpeg's own diagnostics).
    Diagnostic(String),
}

impl ProgressEvent {
    pub fn stage(message: impl Into<String>) -> Self {
        Self::Stage(message.into())
    }

    /// The text without its stream prefix.
    pub fn text(&self) -> &str {
        match self {
            Self::Stage(text) | Self::Output(text) | Self::Diagnostic(text) => text,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(text) => f.write_str(text),
            Self::Output(line) => write!(f, "Processing: {}", line),
            Self::Diagnostic(line) => write!(f, "FFmpeg: {}", line),
        }
    }
}

/// Receiver of progress events.
///
/// Always invoked from the task that awaits the assembly, never from the
/// encoder's output-reading tasks.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

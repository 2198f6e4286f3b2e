//! External video encoder — public API.
//!
//! Wraps FFmpeg as an opaque subprocess: a manifest of frame paths goes in,
//! one MP4 comes out, and every line the process prints is streamed to a
//! progress sink on the way.

mod args;
mod manifest;
mod process;
mod progress;

pub use args::build_args;
pub use manifest::{render_manifest, ManifestFile};
pub use process::{EncodeError, EncodedVideo, EncoderProcess};
pub use progress::{ProgressEvent, ProgressSink};

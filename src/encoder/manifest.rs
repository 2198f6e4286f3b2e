//! Concat-demuxer input list.
//!
//! One line per frame, in capture order:
//!
//! ```text
//! file '/abs/path/CapturedFrames/Frame_000000.png'
//! ```
//!
//! Backslashes become forward slashes; a literal `'` is written as `'\''`,
//! the demuxer's escape for quotes inside a quoted path.

use crate::frames::{Frame, StorageError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Renders the manifest text for `frames`.
pub fn render_manifest(frames: &[Frame]) -> String {
    let mut text = String::new();
    for frame in frames {
        text.push_str("file ");
        text.push_str(&quote_path(&frame.path));
        text.push('\n');
    }
    text
}

fn quote_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    format!("'{}'", normalized.replace('\'', r"'\''"))
}

/// A manifest written to disk for one assembly attempt.
///
/// Deleted when dropped, whatever the outcome of the attempt. A failed
/// delete is logged and otherwise ignored.
#[derive(Debug)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    /// Writes `ffmpeg_input_<uuid>.txt` into `dir`.
    pub fn create(dir: &Path, frames: &[Frame]) -> Result<Self, StorageError> {
        let path = dir.join(format!("ffmpeg_input_{}.txt", uuid::Uuid::new_v4()));

        fs::write(&path, render_manifest(frames)).map_err(|source| {
            StorageError::WriteManifest {
                path: path.clone(),
                source,
            }
        })?;

        log::debug!(
            "[ENCODER] Wrote input file list {} ({} frames)",
            path.display(),
            frames.len()
        );
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ManifestFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "[ENCODER] Failed to delete temporary file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

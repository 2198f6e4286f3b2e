//! Frame store — sequentially named PNG files in one directory.
//!
//! A single mutex guards the session ledger. `append` holds it for the
//! duration of one file write; `list_ordered` and `purge_all` hold it for
//! the whole read or purge, so a capture tick can never interleave with an
//! assembly enumerating or clearing the session.

use super::naming::{frame_file_name, is_frame_file_name};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One captured still image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position in the session, starting at 0 with no gaps.
    pub sequence: u32,
    /// Absolute path of the PNG file.
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to resolve directory {}: {source}", path.display())]
    Resolve { path: PathBuf, source: io::Error },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write frame {}: {source}", path.display())]
    WriteFrame { path: PathBuf, source: io::Error },

    #[error("Failed to write input file list {}: {source}", path.display())]
    WriteManifest { path: PathBuf, source: io::Error },
}

#[derive(Default)]
struct Ledger {
    next_sequence: u32,
    frames: Vec<Frame>,
}

pub struct FrameStore {
    dir: PathBuf,
    ledger: Mutex<Ledger>,
}

impl FrameStore {
    /// Creates a store rooted at `dir`. Relative paths are resolved against
    /// the current working directory so manifest entries are absolute.
    ///
    /// Does not touch the filesystem; call [`FrameStore::ensure_ready`].
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        let dir = std::path::absolute(dir).map_err(|source| StorageError::Resolve {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            dir,
            ledger: Mutex::new(Ledger::default()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the backing directory if it does not exist yet.
    pub fn ensure_ready(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Writes `image_bytes` as the next frame of the session.
    ///
    /// The sequence number is only consumed when the write succeeds, so a
    /// failed append leaves no gap.
    pub fn append(&self, image_bytes: &[u8]) -> Result<Frame, StorageError> {
        let mut ledger = self.ledger();

        let sequence = ledger.next_sequence;
        let path = self.dir.join(frame_file_name(sequence));

        fs::write(&path, image_bytes).map_err(|source| StorageError::WriteFrame {
            path: path.clone(),
            source,
        })?;

        let frame = Frame { sequence, path };
        ledger.next_sequence += 1;
        ledger.frames.push(frame.clone());
        Ok(frame)
    }

    /// Frames of the current session in capture order. Empty is valid.
    pub fn list_ordered(&self) -> Vec<Frame> {
        self.ledger().frames.clone()
    }

    pub fn len(&self) -> usize {
        self.ledger().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes every file in the frames directory that matches the frame
    /// naming pattern and resets the session ledger.
    ///
    /// Best-effort: a file that cannot be deleted is logged and skipped.
    /// Returns the number of files removed.
    pub fn purge_all(&self) -> usize {
        let mut ledger = self.ledger();
        *ledger = Ledger::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                log::warn!(
                    "[FRAMES] Failed to read frames directory {}: {}",
                    self.dir.display(),
                    e
                );
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_frame_file_name(name) {
                continue;
            }

            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("[FRAMES] Failed to delete frame {}: {}", path.display(), e),
            }
        }

        log::info!("[FRAMES] Purged {} frames from {}", removed, self.dir.display());
        removed
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_store() -> (tempfile::TempDir, FrameStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = FrameStore::new(tmp.path().join("CapturedFrames")).unwrap();
        store.ensure_ready().unwrap();
        (tmp, store)
    }

    #[test]
    fn ensure_ready_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        let store = FrameStore::new(&dir).unwrap();
        assert!(!dir.exists());

        store.ensure_ready().unwrap();
        assert!(dir.is_dir());

        // Second call is a no-op
        store.ensure_ready().unwrap();
    }

    #[test]
    fn ensure_ready_fails_when_path_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("frames");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = FrameStore::new(&blocker).unwrap();
        let result = store.ensure_ready();
        assert!(matches!(result, Err(StorageError::CreateDir { .. })));
    }

    #[test]
    fn relative_directory_is_made_absolute() {
        let store = FrameStore::new("CapturedFrames").unwrap();
        assert!(store.dir().is_absolute());
        assert!(store.dir().ends_with("CapturedFrames"));
    }

    #[test]
    fn append_assigns_gap_free_sequence() {
        let (_tmp, store) = ready_store();

        for expected in 0..3u32 {
            let frame = store.append(b"png").unwrap();
            assert_eq!(frame.sequence, expected);
            assert_eq!(frame.path, store.dir().join(frame_file_name(expected)));
            assert!(frame.path.is_file());
        }

        let listed: Vec<u32> = store.list_ordered().iter().map(|f| f.sequence).collect();
        assert_eq!(listed, vec![0, 1, 2]);
    }

    #[test]
    fn failed_append_does_not_consume_a_sequence_number() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FrameStore::new(tmp.path().join("missing")).unwrap();

        // Directory was never created, so the write fails
        assert!(matches!(store.append(b"png"), Err(StorageError::WriteFrame { .. })));

        store.ensure_ready().unwrap();
        assert_eq!(store.append(b"png").unwrap().sequence, 0);
    }

    #[test]
    fn list_ordered_is_empty_for_fresh_store() {
        let (_tmp, store) = ready_store();
        assert!(store.list_ordered().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_removes_frames_and_resets_counter() {
        let (_tmp, store) = ready_store();
        store.append(b"a").unwrap();
        store.append(b"b").unwrap();

        assert_eq!(store.purge_all(), 2);
        assert!(store.is_empty());
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 0);

        assert_eq!(store.append(b"c").unwrap().sequence, 0);
    }

    #[test]
    fn purge_leaves_unrelated_files_alone() {
        let (_tmp, store) = ready_store();
        store.append(b"a").unwrap();
        let keep = store.dir().join("notes.txt");
        fs::write(&keep, b"keep me").unwrap();

        assert_eq!(store.purge_all(), 1);
        assert!(keep.is_file());
    }

    #[test]
    fn purge_picks_up_leftovers_from_a_previous_run() {
        let (_tmp, store) = ready_store();
        fs::write(store.dir().join("Frame_000123.png"), b"stale").unwrap();

        assert_eq!(store.purge_all(), 1);
    }

    #[test]
    fn purge_of_missing_directory_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FrameStore::new(tmp.path().join("never-created")).unwrap();
        assert_eq!(store.purge_all(), 0);
    }
}

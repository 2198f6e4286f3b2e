//! Disk-backed frame buffer — public API.
//!
//! The store is the only owner of frame metadata. Other components see
//! frames through `append`, `list_ordered` and `purge_all`, never through a
//! shared list.

mod naming;
mod store;

pub use naming::{frame_file_name, is_frame_file_name, FRAME_SEQUENCE_WIDTH};
pub use store::{Frame, FrameStore, StorageError};

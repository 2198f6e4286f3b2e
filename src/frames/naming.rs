//! Frame file naming contract.
//!
//! Frames are named `Frame_<sequence>.png` with the sequence zero-padded to
//! six digits, so a plain lexicographic sort of the directory yields capture
//! order for any session shorter than a million frames.

use regex::Regex;
use std::sync::LazyLock;

/// Minimum number of digits in a frame's sequence number.
pub const FRAME_SEQUENCE_WIDTH: usize = 6;

static FRAME_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Frame_\d{6,}\.png$").unwrap());

/// File name for the frame with the given sequence number.
pub fn frame_file_name(sequence: u32) -> String {
    format!("Frame_{:0width$}.png", sequence, width = FRAME_SEQUENCE_WIDTH)
}

/// True when `name` follows the frame naming pattern.
///
/// Used by the purge pass so unrelated files in the frames directory
/// are never touched.
pub fn is_frame_file_name(name: &str) -> bool {
    FRAME_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_sequence_to_six_digits() {
        assert_eq!(frame_file_name(0), "Frame_000000.png");
        assert_eq!(frame_file_name(42), "Frame_000042.png");
        assert_eq!(frame_file_name(999_999), "Frame_999999.png");
    }

    #[test]
    fn widens_past_six_digits_instead_of_truncating() {
        assert_eq!(frame_file_name(1_000_000), "Frame_1000000.png");
    }

    #[test]
    fn names_sort_in_capture_order() {
        let mut names: Vec<String> = [10, 2, 100, 1, 0].iter().map(|&n| frame_file_name(n)).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "Frame_000000.png",
                "Frame_000001.png",
                "Frame_000002.png",
                "Frame_000010.png",
                "Frame_000100.png",
            ]
        );
    }

    #[test]
    fn recognizes_own_names_only() {
        assert!(is_frame_file_name(&frame_file_name(7)));
        assert!(is_frame_file_name("Frame_1234567.png"));
        assert!(!is_frame_file_name("Frame_12.png"));
        assert!(!is_frame_file_name("Frame_000001.jpg"));
        assert!(!is_frame_file_name("frame_000001.png"));
        assert!(!is_frame_file_name("notes.txt"));
        assert!(!is_frame_file_name("Frame_000001.png.bak"));
    }
}

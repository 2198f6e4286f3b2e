//! Recorder configuration — defaults plus environment overrides.
//!
//! Defaults mirror a desktop install: frames next to the working
//! directory, finished videos in the user's Videos folder, FFmpeg on PATH.
//! `from_env` layers `SCREEN_RECORDER_*` variables on top (a `.env` file is
//! honoured when `run()` loads it through dotenvy).

use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// ~30 captures per second.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_micros(33_333);

#[derive(Debug, Clone, Serialize)]
pub struct RecorderConfig {
    /// Directory holding `Frame_NNNNNN.png` files during a session.
    pub frames_dir: PathBuf,
    /// Directory receiving `screen_recording_<timestamp>.mp4`.
    pub output_dir: PathBuf,
    /// Where the per-attempt input file list is written.
    pub manifest_dir: PathBuf,
    #[serde(with = "millis")]
    pub capture_interval: Duration,
    pub encoder: EncoderConfig,
}

/// FFmpeg invocation settings.
#[derive(Debug, Clone, Serialize)]
pub struct EncoderConfig {
    /// Explicit executable. `None` resolves `ffmpeg` on PATH.
    pub program: Option<PathBuf>,
    pub codec: String,
    pub preset: String,
    /// Constant-quality factor (lower is better).
    pub crf: u8,
    pub frame_rate: u32,
    pub pixel_format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: None,
            codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            frame_rate: 30,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            frames_dir: cwd.join("CapturedFrames"),
            output_dir: default_output_dir(),
            manifest_dir: std::env::temp_dir(),
            capture_interval: DEFAULT_CAPTURE_INTERVAL,
            encoder: EncoderConfig::default(),
        }
    }
}

impl RecorderConfig {
    /// Defaults overridden by `SCREEN_RECORDER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RecorderConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("SCREEN_RECORDER_FRAMES_DIR") {
            config.frames_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SCREEN_RECORDER_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(program) = lookup("SCREEN_RECORDER_FFMPEG") {
            config.encoder.program = Some(PathBuf::from(program));
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SCREEN_RECORDER_INTERVAL_MS") {
            if ms == 0 {
                log::warn!("[CONFIG] SCREEN_RECORDER_INTERVAL_MS must be positive — keeping default");
            } else {
                config.capture_interval = Duration::from_millis(ms);
            }
        }
        if let Some(crf) = parse_var::<u8>(&lookup, "SCREEN_RECORDER_CRF") {
            config.encoder.crf = crf;
        }
        if let Some(fps) = parse_var::<u32>(&lookup, "SCREEN_RECORDER_FPS") {
            config.encoder.frame_rate = fps;
        }

        config
    }
}

/// Platform videos folder, then `~/Videos`, then the working directory.
fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[CONFIG] Ignoring {}={:?} — not a valid number", key, raw);
            None
        }
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_desktop_layout() {
        let config = RecorderConfig::default();
        assert!(config.frames_dir.ends_with("CapturedFrames"));
        assert_eq!(config.capture_interval, DEFAULT_CAPTURE_INTERVAL);
        assert_eq!(config.encoder.codec, "libx264");
        assert_eq!(config.encoder.crf, 23);
        assert_eq!(config.encoder.frame_rate, 30);
        assert_eq!(config.encoder.pixel_format, "yuv420p");
        assert!(config.encoder.program.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = RecorderConfig::from_lookup(lookup_from(&[
            ("SCREEN_RECORDER_FRAMES_DIR", "/tmp/frames"),
            ("SCREEN_RECORDER_OUTPUT_DIR", "/tmp/out"),
            ("SCREEN_RECORDER_FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
            ("SCREEN_RECORDER_INTERVAL_MS", "50"),
            ("SCREEN_RECORDER_CRF", "18"),
            ("SCREEN_RECORDER_FPS", "60"),
        ]));

        assert_eq!(config.frames_dir, PathBuf::from("/tmp/frames"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            config.encoder.program,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.capture_interval, Duration::from_millis(50));
        assert_eq!(config.encoder.crf, 18);
        assert_eq!(config.encoder.frame_rate, 60);
    }

    #[test]
    fn invalid_numbers_keep_defaults() {
        let config = RecorderConfig::from_lookup(lookup_from(&[
            ("SCREEN_RECORDER_INTERVAL_MS", "fast"),
            ("SCREEN_RECORDER_CRF", "-3"),
            ("SCREEN_RECORDER_FPS", "0x1e"),
        ]));

        assert_eq!(config.capture_interval, DEFAULT_CAPTURE_INTERVAL);
        assert_eq!(config.encoder.crf, 23);
        assert_eq!(config.encoder.frame_rate, 30);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config =
            RecorderConfig::from_lookup(lookup_from(&[("SCREEN_RECORDER_INTERVAL_MS", "0")]));
        assert_eq!(config.capture_interval, DEFAULT_CAPTURE_INTERVAL);
    }

    #[test]
    fn serializes_interval_as_millis() {
        let json = serde_json::to_value(RecorderConfig::default()).unwrap();
        assert_eq!(json["capture_interval"], 33);
    }
}

//! FFmpeg argument template.
//!
//! Concat demuxer over the manifest (`-safe 0` because entries are absolute
//! paths), constant-quality H.264 at a fixed output rate, broadly playable
//! pixel format, output path last.

use crate::config::EncoderConfig;
use std::ffi::OsString;
use std::path::Path;

pub fn build_args(settings: &EncoderConfig, manifest: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(19);

    // Overwrite a partial file left behind by a failed attempt so a retry
    // can succeed.
    args.push("-y".into());

    args.extend(["-f", "concat", "-safe", "0", "-i"].map(OsString::from));
    args.push(manifest.as_os_str().to_owned());

    args.extend([
        OsString::from("-c:v"),
        settings.codec.clone().into(),
        "-preset".into(),
        settings.preset.clone().into(),
        "-crf".into(),
        settings.crf.to_string().into(),
        "-r".into(),
        settings.frame_rate.to_string().into(),
        "-pix_fmt".into(),
        settings.pixel_format.clone().into(),
    ]);

    args.push(output.as_os_str().to_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn default_template() {
        let args = build_args(
            &EncoderConfig::default(),
            Path::new("/tmp/list.txt"),
            Path::new("/videos/out.mp4"),
        );

        assert_eq!(
            as_strings(&args),
            vec![
                "-y", "-f", "concat", "-safe", "0", "-i", "/tmp/list.txt", "-c:v", "libx264",
                "-preset", "medium", "-crf", "23", "-r", "30", "-pix_fmt", "yuv420p",
                "/videos/out.mp4",
            ]
        );
    }

    #[test]
    fn custom_settings_flow_through() {
        let settings = EncoderConfig {
            codec: "libx265".to_string(),
            crf: 28,
            frame_rate: 60,
            ..EncoderConfig::default()
        };
        let args = as_strings(&build_args(&settings, Path::new("m.txt"), Path::new("o.mp4")));

        assert_eq!(args[8], "libx265");
        assert_eq!(args[12], "28");
        assert_eq!(args[14], "60");
        assert_eq!(args.last().unwrap(), "o.mp4");
    }

    #[test]
    fn paths_with_spaces_stay_single_arguments() {
        let args = as_strings(&build_args(
            &EncoderConfig::default(),
            Path::new("/tmp/my list.txt"),
            Path::new("/home/me/My Videos/out.mp4"),
        ));
        assert_eq!(args[6], "/tmp/my list.txt");
        assert_eq!(args.last().unwrap(), "/home/me/My Videos/out.mp4");
    }
}

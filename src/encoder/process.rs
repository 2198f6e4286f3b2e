//! FFmpeg subprocess runner.
//!
//! Output handling: stdout and stderr are each drained by a spawned reader
//! task. Readers never call the sink; they push lines into one channel and
//! the task awaiting [`EncoderProcess::run`] delivers them. That keeps sink
//! calls on the caller's context and in arrival order, while the relative
//! order of stdout vs stderr lines stays unspecified.

use super::args::build_args;
use super::manifest::ManifestFile;
use super::progress::{ProgressEvent, ProgressSink};
use crate::config::EncoderConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("FFmpeg executable not found: {} ({reason})", program.display())]
    NotFound { program: PathBuf, reason: String },

    #[error("Failed to launch FFmpeg at {}: {source}", program.display())]
    Launch { program: PathBuf, source: io::Error },

    #[error("Failed waiting for FFmpeg to exit: {0}")]
    Wait(io::Error),

    #[error("FFmpeg failed with {}. Error: {stderr}", describe_exit(exit_code))]
    Failed {
        /// `None` when the process was killed by a signal.
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("FFmpeg exited successfully but {} was not written", path.display())]
    MissingOutput { path: PathBuf },
}

impl EncodeError {
    /// Exit code of a process that ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// The encoder's stderr text, verbatim, for a process that ran and failed.
    pub fn error_text(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// A finished output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct EncoderProcess {
    program: PathBuf,
    settings: EncoderConfig,
}

impl EncoderProcess {
    /// Uses `program` as-is, without checking that it exists.
    pub fn new(program: impl Into<PathBuf>, settings: EncoderConfig) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    /// Resolves the configured executable, or `ffmpeg` on PATH.
    pub fn locate(settings: EncoderConfig) -> Result<Self, EncodeError> {
        let wanted = settings
            .program
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));

        let program = which::which(&wanted).map_err(|e| EncodeError::NotFound {
            program: wanted.clone(),
            reason: e.to_string(),
        })?;

        log::info!("[ENCODER] Using {}", program.display());
        Ok(Self::new(program, settings))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn settings(&self) -> &EncoderConfig {
        &self.settings
    }

    /// Runs one encode of `manifest` into `output`.
    ///
    /// Every non-empty output line reaches `sink` as it arrives. Exit code 0
    /// with the output file present is success; anything else is an error
    /// carrying the accumulated stderr text. The manifest is deleted before
    /// this returns, on every path.
    pub async fn run(
        &self,
        manifest: ManifestFile,
        output: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<EncodedVideo, EncodeError> {
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .args(build_args(&self.settings, manifest.path(), output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // CREATE_NO_WINDOW: don't flash a console on Windows
        #[cfg(windows)]
        {
            command.creation_flags(0x0800_0000);
        }

        sink.report(ProgressEvent::stage("Starting FFmpeg process..."));

        let mut child = command.spawn().map_err(|source| EncodeError::Launch {
            program: self.program.clone(),
            source,
        })?;

        log::info!(
            "[ENCODER] Started {} (pid {:?}) → {}",
            self.program.display(),
            child.id(),
            output.display()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, ProgressEvent::Output, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, ProgressEvent::Diagnostic, tx.clone()));
        }
        drop(tx);

        let mut error_text = String::new();
        while let Some(event) = rx.recv().await {
            if let ProgressEvent::Diagnostic(line) = &event {
                error_text.push_str(line);
                error_text.push('\n');
            }
            sink.report(event);
        }

        let status = child.wait().await.map_err(EncodeError::Wait)?;
        drop(manifest);

        if !status.success() {
            log::warn!(
                "[ENCODER] Failed after {}ms with {}",
                start.elapsed().as_millis(),
                describe_exit(&status.code())
            );
            return Err(EncodeError::Failed {
                exit_code: status.code(),
                stderr: error_text.trim_end().to_string(),
            });
        }

        let size_bytes = std::fs::metadata(output)
            .map_err(|_| EncodeError::MissingOutput {
                path: output.to_path_buf(),
            })?
            .len();

        log::info!(
            "[ENCODER] Wrote {} ({} bytes) in {}ms",
            output.display(),
            size_bytes,
            start.elapsed().as_millis()
        );

        Ok(EncodedVideo {
            path: output.to_path_buf(),
            size_bytes,
        })
    }
}

/// Reads `reader` to EOF, sending each non-empty line wrapped by `wrap`.
///
/// Stops early when the receiving side is gone.
async fn forward_lines<R>(
    reader: R,
    wrap: fn(String) -> ProgressEvent,
    tx: mpsc::UnboundedSender<ProgressEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match read_segment(&mut reader, &mut buf).await {
            Ok(false) => break,
            Ok(true) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(wrap(line.to_string())).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("[ENCODER] Output stream closed with error: {}", e);
                break;
            }
        }
    }
}

/// Reads up to the next `\n` or `\r` into `buf`, without the terminator.
///
/// FFmpeg redraws its status line with bare carriage returns, so both count
/// as line ends. Returns `false` at EOF with nothing read.
async fn read_segment<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!buf.is_empty());
        }

        if let Some(pos) = available.iter().position(|&b| b == b'\n' || b == b'\r') {
            buf.extend_from_slice(&available[..pos]);
            reader.consume(pos + 1);
            return Ok(true);
        }

        let len = available.len();
        buf.extend_from_slice(available);
        reader.consume(len);
    }
}

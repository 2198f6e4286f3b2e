//! Screen recorder — library entry point.
//!
//! Wires together:
//! - Disk-backed frame buffer (frames/)
//! - Periodic screen capture loop (capture/)
//! - FFmpeg subprocess driver (encoder/)
//! - Frame-to-video assembly (assembly.rs)
//! - Collaborator-facing recorder and headless shell (recorder.rs, shell.rs)

pub mod assembly;
pub mod capture;
pub mod config;
pub mod encoder;
pub mod frames;
pub mod recorder;
pub mod shell;

pub use assembly::{AssembleError, AssemblyPipeline, EncodeOutcome};
pub use config::{EncoderConfig, RecorderConfig};
pub use encoder::{EncodeError, ProgressEvent, ProgressSink};
pub use recorder::{Recorder, RecorderError, RecorderStatus};

/// Entry point — called by the binary.
///
/// Loads `.env`, initializes logging, builds a recorder for the primary
/// monitor and hands stdin to the command shell.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = RecorderConfig::from_env();
    log::debug!("Configuration: {}", serde_json::to_string(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let recorder = build_recorder(&config)?;
        log::info!("Screen recorder ready");
        shell::run_shell(&recorder).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[cfg(feature = "monitor")]
fn build_recorder(config: &RecorderConfig) -> Result<Recorder, Box<dyn std::error::Error>> {
    Ok(Recorder::with_primary_monitor(config)?)
}

#[cfg(not(feature = "monitor"))]
fn build_recorder(_config: &RecorderConfig) -> Result<Recorder, Box<dyn std::error::Error>> {
    Err("built without the `monitor` feature — no screen capture backend available".into())
}

//! Headless command shell.
//!
//! Stands in for a window: reads one command per line from stdin and drives
//! the recorder. Progress and results go to stdout, diagnostics to the log.
//!
//! Commands: `start`, `stop`, `save`, `status`, `list`, `quit`.

use crate::encoder::ProgressEvent;
use crate::recorder::Recorder;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Save,
    Status,
    List,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "save" => Some(Self::Save),
            "status" => Some(Self::Status),
            "list" => Some(Self::List),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Reads commands until `quit` or end of input, then shuts the recorder down.
pub async fn run_shell(recorder: &Recorder) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Ready — commands: start, stop, save, status, list, quit");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = Command::parse(&line) else {
            println!("Unknown command: {}", line.trim());
            continue;
        };
        if command == Command::Quit {
            break;
        }
        execute(recorder, command).await;
    }

    recorder.shutdown().await;
    Ok(())
}

async fn execute(recorder: &Recorder, command: Command) {
    match command {
        Command::Start => match recorder.start().await {
            Ok(session) => println!("Recording... → {}", session.output_path.display()),
            Err(e) => println!("Failed to start recording: {}", e),
        },
        Command::Stop => {
            if recorder.stop().await {
                println!("Recording stopped — {} frames", recorder.frame_count());
            } else {
                println!("Not recording");
            }
        }
        Command::Save => {
            let sink = |event: ProgressEvent| println!("  {}", event);
            match recorder.assemble(&sink).await {
                Ok(outcome) => println!(
                    "Video saved successfully: {} ({} frames, {} bytes)",
                    outcome.output_path.display(),
                    outcome.frame_count,
                    outcome.size_bytes
                ),
                Err(e) => println!("Failed to save the recording: {}", e),
            }
        }
        Command::Status => {
            let status = recorder.status().await;
            match serde_json::to_string(&status) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("[RECORDER] Failed to serialize status: {}", e),
            }
        }
        Command::List => {
            let recordings = recorder.recordings();
            if recordings.is_empty() {
                println!("No recordings yet");
            }
            for path in recordings {
                println!("{}", path.display());
            }
        }
        Command::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(Command::parse("start"), Some(Command::Start));
        assert_eq!(Command::parse("  STOP \n"), Some(Command::Stop));
        assert_eq!(Command::parse("Save"), Some(Command::Save));
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(Command::parse("record"), None);
        assert_eq!(Command::parse(""), None);
    }
}

//! Command-line speech engine provider
//!
//! Runs a local engine such as `espeak-ng` as a subprocess. The text is fed on
//! stdin and the WAV stream is read back from stdout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechAudio, SpeechProvider, SpeechRequest};

/// Provider that shells out to a speech engine
pub struct CommandProvider {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandProvider {
    /// Create a new command provider
    ///
    /// Returns an error if the engine executable is not found.
    pub fn new(program: &Path, args: Vec<String>) -> Result<Self> {
        let program = if program.components().count() > 1 || program.is_absolute() {
            if !program.exists() {
                return Err(SpeechError::ProviderUnavailable(format!(
                    "Speech engine not found at specified path: {}",
                    program.display()
                )));
            }
            program.to_path_buf()
        } else {
            which::which(program).map_err(|_| {
                SpeechError::ProviderUnavailable(format!(
                    "Speech engine '{}' not found in PATH",
                    program.display()
                ))
            })?
        };

        Ok(Self { program, args })
    }

    /// Substitute request placeholders into the configured arguments.
    fn render_args(&self, request: &SpeechRequest) -> Vec<String> {
        let voice = request.voice.as_deref().unwrap_or(&request.language);
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{language}", &request.language)
                    .replace("{voice}", voice)
            })
            .collect()
    }
}

#[async_trait]
impl SpeechProvider for CommandProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio> {
        let mut child = Command::new(&self.program)
            .args(self.render_args(&request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::CommandError(format!("Failed to execute: {}", e)))?;

        // Feed stdin while stdout is drained; an engine that streams output
        // as it reads would otherwise block on a full pipe.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            stdin.write_all(request.text.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output =
            output.map_err(|e| SpeechError::CommandError(format!("Failed to wait: {}", e)))?;

        // An engine that exits early closes the pipe; its exit status carries the failure.
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
            log::debug!("{} closed stdin early", self.program.display());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::CommandError(format!(
                "Command failed: {}",
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        Ok(SpeechAudio {
            bytes: output.stdout,
        })
    }

    fn name(&self) -> &'static str {
        "command"
    }

    fn is_available(&self) -> Result<()> {
        // Availability was checked in constructor
        Ok(())
    }
}

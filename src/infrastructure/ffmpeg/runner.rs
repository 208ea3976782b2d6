use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

use super::command::FfmpegCommand;

/// A failed external tool run. `stderr` carries the tool's diagnostics.
#[derive(Debug, Error)]
#[error("{stderr}")]
pub struct ToolFailure {
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ToolFailure {
    fn spawn(bin: &str, err: std::io::Error) -> Self {
        Self {
            exit_code: None,
            stderr: format!("failed to spawn {}: {}", bin, err),
        }
    }
}

/// The external transcoder, as seen by the pipeline.
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn transcode(&self, command: &FfmpegCommand) -> Result<(), ToolFailure>;

    /// Container duration in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, ToolFailure>;
}

#[derive(Debug, Clone)]
pub struct FfmpegCli {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegCli {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

#[async_trait]
impl MediaTool for FfmpegCli {
    async fn transcode(&self, command: &FfmpegCommand) -> Result<(), ToolFailure> {
        let args = command.build_args();
        debug!("FFmpeg command: {} {}", self.ffmpeg_bin, args.join(" "));

        let output = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolFailure::spawn(&self.ffmpeg_bin, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("FFmpeg error: {}", stderr);
            return Err(ToolFailure {
                exit_code: output.status.code(),
                stderr,
            });
        }

        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, ToolFailure> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "quiet",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolFailure::spawn(&self.ffprobe_bin, e))?;

        if !output.status.success() {
            return Err(ToolFailure {
                exit_code: output.status.code(),
                stderr: format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_duration(stdout: &str) -> Result<f64, ToolFailure> {
    stdout.trim().parse::<f64>().map_err(|e| ToolFailure {
        exit_code: Some(0),
        stderr: format!("unreadable duration {:?}: {}", stdout.trim(), e),
    })
}

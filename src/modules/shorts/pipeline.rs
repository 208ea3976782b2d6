//! Transform pipeline.
//!
//! A job's transforms are planned up front as an ordered list of [`Step`]s.
//! Skipped transforms simply never appear in the plan; each planned step
//! reads the previous step's artifact and writes its own.

use std::path::{Path, PathBuf};

use tracing::info;

use super::workspace::{DUCKED_VIDEO, JobWorkspace, SHORTS_VIDEO, SUBTITLE_VIDEO, WATERMARK_VIDEO};
use crate::common::error::{AppError, AppResult, TranscodeStage};
use crate::infrastructure::ffmpeg::command::FfmpegCommand;
use crate::infrastructure::ffmpeg::runner::MediaTool;

pub const ORIGINAL_AUDIO_VOLUME: f32 = 0.3;
pub const OVERLAY_AUDIO_VOLUME: f32 = 1.0;
pub const SHORTS_MAX_SECONDS: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Mix overlay audio over the attenuated original track.
    Duck { audio: PathBuf },
    /// Reframe to vertical 1080x1920, capped at one minute.
    ShortsFormat,
    Watermark { username: String },
    Subtitle { text: String },
}

impl Step {
    pub fn stage(&self) -> TranscodeStage {
        match self {
            Step::Duck { .. } => TranscodeStage::Ducking,
            Step::ShortsFormat => TranscodeStage::ShortsFormat,
            Step::Watermark { .. } => TranscodeStage::Watermark,
            Step::Subtitle { .. } => TranscodeStage::Subtitle,
        }
    }

    pub fn artifact(&self) -> &'static str {
        match self {
            Step::Duck { .. } => DUCKED_VIDEO,
            Step::ShortsFormat => SHORTS_VIDEO,
            Step::Watermark { .. } => WATERMARK_VIDEO,
            Step::Subtitle { .. } => SUBTITLE_VIDEO,
        }
    }

    /// `duration` is the input's length and is only consulted by ducking.
    pub fn command(&self, input: &Path, output: &Path, duration: Option<f64>) -> FfmpegCommand {
        match self {
            Step::Duck { audio } => {
                let cmd = FfmpegCommand::new(input, output)
                    .input(audio)
                    .filter_complex(ducking_filter())
                    .map("0:v")
                    .map("[audio]")
                    .house_video()
                    .house_audio();
                match duration {
                    Some(seconds) => cmd.duration(seconds),
                    None => cmd,
                }
            }
            Step::ShortsFormat => FfmpegCommand::new(input, output)
                .video_filter("scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920")
                .house_video()
                .house_audio()
                .duration(SHORTS_MAX_SECONDS),
            Step::Watermark { username } => FfmpegCommand::new(input, output)
                .video_filter(format!(
                    "drawtext=text='{}':fontsize=24:fontcolor=white:x=10:y=10:box=1:boxcolor=black@0.5:boxborderw=5",
                    watermark_text(username)
                ))
                .copy_audio()
                .house_video(),
            Step::Subtitle { text } => FfmpegCommand::new(input, output)
                .video_filter(format!(
                    "drawtext=text='{}':fontsize=32:fontcolor=white:x=(w-text_w)/2:y=h-text_h-20:box=1:boxcolor=black@0.7:boxborderw=5",
                    escape_drawtext(text)
                ))
                .copy_audio()
                .house_video(),
        }
    }
}

pub fn ducking_filter() -> String {
    format!(
        "[0:a]volume={}[lowered];[1:a]volume={:.1}[overlay];[lowered][overlay]amix=inputs=2:duration=first[audio]",
        ORIGINAL_AUDIO_VOLUME, OVERLAY_AUDIO_VOLUME
    )
}

pub fn watermark_text(username: &str) -> String {
    format!("Sumber: @{}", username)
}

/// Escapes characters that terminate a drawtext value.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\'', "\\'").replace(':', "\\:")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Fixed order: ducking, shorts format, watermark, subtitle.
    pub fn plan(
        audio: Option<&Path>,
        shorts_format: bool,
        username: Option<&str>,
        subtitle: Option<&str>,
    ) -> Self {
        let mut steps = Vec::new();

        if let Some(audio) = audio {
            steps.push(Step::Duck {
                audio: audio.to_path_buf(),
            });
        }
        if shorts_format {
            steps.push(Step::ShortsFormat);
        }
        if let Some(username) = username {
            steps.push(Step::Watermark {
                username: username.to_string(),
            });
        }
        if let Some(text) = subtitle {
            steps.push(Step::Subtitle {
                text: text.to_string(),
            });
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Runs every planned step and returns the last artifact, or `input`
    /// untouched when nothing was planned.
    pub async fn run(
        &self,
        tool: &dyn MediaTool,
        workspace: &JobWorkspace,
        input: PathBuf,
    ) -> AppResult<PathBuf> {
        let mut current = input;

        for step in &self.steps {
            let stage = step.stage();
            let output = workspace.path(step.artifact());
            info!(job_id = %workspace.id(), "Running transform: {}", stage);

            let duration = match step {
                Step::Duck { .. } => Some(
                    tool.probe_duration(&current)
                        .await
                        .map_err(|e| AppError::transcode(stage, format!("Failed to get video duration: {}", e)))?,
                ),
                _ => None,
            };

            let command = step.command(&current, &output, duration);
            tool.transcode(&command)
                .await
                .map_err(|e| AppError::transcode(stage, e.stderr))?;

            current = output;
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ffmpeg::runner::ToolFailure;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Copies the first input to the output and records each invocation.
    #[derive(Default)]
    struct RecordingTool {
        calls: Mutex<Vec<Vec<String>>>,
        fail_on: Option<&'static str>,
        unreadable: bool,
    }

    #[async_trait]
    impl MediaTool for RecordingTool {
        async fn transcode(&self, command: &FfmpegCommand) -> Result<(), ToolFailure> {
            let args = command.build_args();
            self.calls.lock().unwrap().push(args.clone());

            if let Some(marker) = self.fail_on {
                if args.iter().any(|a| a.contains(marker)) {
                    return Err(ToolFailure {
                        exit_code: Some(1),
                        stderr: format!("{} exploded", marker),
                    });
                }
            }

            tokio::fs::copy(&args[2], command.output()).await.unwrap();
            Ok(())
        }

        async fn probe_duration(&self, _path: &Path) -> Result<f64, ToolFailure> {
            if self.unreadable {
                return Err(ToolFailure {
                    exit_code: Some(1),
                    stderr: "moov atom not found".to_string(),
                });
            }
            Ok(9.5)
        }
    }

    async fn workspace() -> (tempfile::TempDir, JobWorkspace) {
        let base = tempfile::tempdir().unwrap();
        let ws = JobWorkspace::create(base.path(), Uuid::new_v4()).await.unwrap();
        tokio::fs::write(ws.input_video(), b"video").await.unwrap();
        (base, ws)
    }

    #[test]
    fn plan_keeps_fixed_order() {
        let plan = Pipeline::plan(Some(Path::new("/a.mp3")), true, Some("alice"), Some("Hi"));
        let stages: Vec<_> = plan.steps().iter().map(Step::stage).collect();
        assert_eq!(
            stages,
            vec![
                TranscodeStage::Ducking,
                TranscodeStage::ShortsFormat,
                TranscodeStage::Watermark,
                TranscodeStage::Subtitle
            ]
        );
    }

    #[test]
    fn plan_skips_absent_inputs() {
        let plan = Pipeline::plan(None, false, Some("alice"), Some("Hello"));
        assert_eq!(
            plan.steps(),
            &[
                Step::Watermark {
                    username: "alice".to_string()
                },
                Step::Subtitle {
                    text: "Hello".to_string()
                }
            ]
        );
        assert!(Pipeline::plan(None, false, None, None).steps().is_empty());
    }

    #[test]
    fn subtitle_escapes_quotes_and_colons() {
        assert_eq!(escape_drawtext("it's 5:00"), "it\\'s 5\\:00");
    }

    #[test]
    fn ducking_caps_duration_and_mixes_volumes() {
        let step = Step::Duck {
            audio: PathBuf::from("/w/input_audio.mp3"),
        };
        let args = step
            .command(Path::new("/w/input_video.mp4"), Path::new("/w/ducked_video.mp4"), Some(9.5))
            .build_args();

        assert!(args.contains(&ducking_filter()));
        assert!(ducking_filter().contains("volume=0.3"));
        assert!(ducking_filter().contains("volume=1.0"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "9.500"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
    }

    #[test]
    fn overlays_copy_audio() {
        let step = Step::Watermark {
            username: "alice".to_string(),
        };
        let args = step
            .command(Path::new("in.mp4"), Path::new("out.mp4"), None)
            .build_args();

        assert!(args.iter().any(|a| a.contains("text='Sumber: @alice'")));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "copy"));
    }

    #[tokio::test]
    async fn empty_plan_returns_input_unchanged() {
        let (_base, ws) = workspace().await;
        let tool = RecordingTool::default();

        let out = Pipeline::plan(None, false, None, None)
            .run(&tool, &ws, ws.input_video())
            .await
            .unwrap();

        assert_eq!(out, ws.input_video());
        assert!(tool.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn each_step_feeds_the_next() {
        let (_base, ws) = workspace().await;
        let tool = RecordingTool::default();

        let out = Pipeline::plan(None, false, Some("alice"), Some("Hello"))
            .run(&tool, &ws, ws.input_video())
            .await
            .unwrap();

        let calls = tool.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1][2], ws.path(WATERMARK_VIDEO).to_string_lossy());
        assert_eq!(out, ws.path(SUBTITLE_VIDEO));
        assert!(!ws.path(DUCKED_VIDEO).exists());
    }

    #[tokio::test]
    async fn failing_stage_reports_its_kind_and_stops() {
        let (_base, ws) = workspace().await;
        let tool = RecordingTool {
            fail_on: Some("Sumber"),
            ..RecordingTool::default()
        };

        let err = Pipeline::plan(None, false, Some("alice"), Some("Hello"))
            .run(&tool, &ws, ws.input_video())
            .await
            .unwrap_err();

        match err {
            AppError::Transcode { stage, stderr } => {
                assert_eq!(stage, TranscodeStage::Watermark);
                assert!(stderr.contains("exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(tool.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duration_probe_failure_is_reported_as_ducking() {
        let (_base, ws) = workspace().await;
        let tool = RecordingTool {
            unreadable: true,
            ..RecordingTool::default()
        };

        let err = Pipeline::plan(Some(&ws.input_audio()), false, None, None)
            .run(&tool, &ws, ws.input_video())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Transcode {
                stage: TranscodeStage::Ducking,
                ..
            }
        ));
        assert!(err.to_string().starts_with("Failed to apply audio ducking: Failed to get video duration"));
        assert!(tool.calls.lock().unwrap().is_empty());
    }
}

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::acquisition::acquire;
use super::dto::{Job, RunResponse};
use super::pipeline::Pipeline;
use super::upload::UploadSession;
use super::workspace::JobWorkspace;
use crate::common::error::{AppError, AppResult};
use crate::infrastructure::ffmpeg::runner::MediaTool;
use crate::state::AppState;

pub struct ShortsService;

impl ShortsService {
    /// Processes one job end to end. The workspace is removed whatever the
    /// outcome.
    pub async fn run(state: &AppState, job: Job, workspace: JobWorkspace) -> AppResult<RunResponse> {
        let result = Self::process(state, job, &workspace).await;
        workspace.cleanup().await;
        result
    }

    async fn process(state: &AppState, job: Job, workspace: &JobWorkspace) -> AppResult<RunResponse> {
        info!(job_id = %job.id, "Processing short: {}", job.metadata.title);

        let media = acquire(job.video, job.audio, workspace, &state.downloader).await?;
        validate_video(state.media.as_ref(), &media.video).await?;

        let pipeline = Pipeline::plan(
            media.audio.as_deref(),
            job.shorts_format,
            job.username.as_deref(),
            job.subtitle_text.as_deref(),
        );
        let processed = pipeline.run(state.media.as_ref(), workspace, media.video).await?;
        let final_output = finalize(processed, workspace.final_output()).await?;

        let mut session = UploadSession::new(
            job.id,
            state.host.as_ref(),
            final_output,
            job.metadata,
            &state.retry_policy,
        );
        let video_id = session.run().await?;

        if let Some(playlist_id) = job.playlist_id.as_deref() {
            match state.host.add_to_playlist(playlist_id, &video_id).await {
                Ok(item_id) => {
                    info!(job_id = %job.id, "Added {} to playlist {} as {}", video_id, playlist_id, item_id)
                }
                Err(e) => {
                    // The upload itself went through; keep the id in the logs.
                    warn!(job_id = %job.id, video_id = %video_id, "Could not add video to playlist {}: {}", playlist_id, e);
                    return Err(e);
                }
            }
        }

        Ok(RunResponse::new(video_id))
    }
}

/// Rejects inputs the transcoder cannot read before any transform runs.
async fn validate_video(tool: &dyn MediaTool, path: &Path) -> AppResult<()> {
    match tool.probe_duration(path).await {
        Ok(duration) if duration > 0.0 => Ok(()),
        Ok(duration) => Err(AppError::client_input(format!(
            "Invalid video file: duration is {}",
            duration
        ))),
        Err(e) => Err(AppError::client_input(format!("Invalid video file: {}", e))),
    }
}

async fn finalize(processed: PathBuf, final_output: PathBuf) -> AppResult<PathBuf> {
    if processed != final_output {
        tokio::fs::rename(&processed, &final_output).await?;
    }
    Ok(final_output)
}

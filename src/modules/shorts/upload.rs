//! Resumable upload state machine.
//!
//! ```text
//! Preparing -> Uploading -> Completed
//!                        \-> Failed
//! ```
//!
//! Chunk failures draw from a [`RetryBudget`] scoped to the session. A retry
//! only asks the transfer for its next chunk again; metadata is not rebuilt
//! and the transfer keeps its own cursor. A session runs at most once.

use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::common::error::{AppError, AppResult, UploadError};
use crate::common::retry::{RetryBudget, RetryDecision, RetryPolicy};
use crate::infrastructure::youtube::host::{ChunkOutcome, VideoHost, VideoMetadata};

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Preparing,
    Uploading { progress: f64 },
    Completed { video_id: String },
    Failed { reason: String },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Completed { .. } | UploadState::Failed { .. })
    }
}

pub struct UploadSession<'a> {
    job_id: Uuid,
    host: &'a dyn VideoHost,
    source: PathBuf,
    metadata: VideoMetadata,
    budget: RetryBudget,
    state: UploadState,
    attempts: u32,
    progress: Option<watch::Sender<f64>>,
}

impl<'a> UploadSession<'a> {
    pub fn new(
        job_id: Uuid,
        host: &'a dyn VideoHost,
        source: PathBuf,
        metadata: VideoMetadata,
        policy: &RetryPolicy,
    ) -> Self {
        Self {
            job_id,
            host,
            source,
            metadata,
            budget: policy.budget(),
            state: UploadState::Preparing,
            attempts: 0,
            progress: None,
        }
    }

    /// Publishes upload progress (`0.0..=1.0`) as chunks are acknowledged.
    pub fn with_progress(mut self, progress: watch::Sender<f64>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Chunk-send calls made so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Drives the session to a terminal state and returns the video id.
    pub async fn run(&mut self) -> AppResult<String> {
        if self.state != UploadState::Preparing {
            return Err(AppError::internal("upload session has already run"));
        }

        info!(job_id = %self.job_id, "Starting YouTube upload for video: {}", self.metadata.title);

        match tokio::fs::try_exists(&self.source).await {
            Ok(true) => {}
            _ => return Err(self.fail(UploadError::SourceMissing(self.source.clone()).into())),
        }

        let mut transfer = match self.host.begin_upload(&self.source, &self.metadata).await {
            Ok(transfer) => transfer,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = UploadState::Uploading { progress: 0.0 };
        info!(job_id = %self.job_id, "Uploading video to YouTube...");

        loop {
            self.attempts += 1;

            match transfer.next_chunk().await {
                Ok(ChunkOutcome::Progress(fraction)) => self.report_progress(fraction),
                Ok(ChunkOutcome::Complete(body)) => return self.complete(&body),
                Err(e) => match self.budget.record_failure() {
                    RetryDecision::Retry { retry, delay } => {
                        warn!(job_id = %self.job_id, attempt = self.attempts, "Upload error (retry {}): {}", retry, e);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    RetryDecision::Exhausted { attempts } => {
                        let err = UploadError::RetriesExhausted {
                            attempts,
                            last_error: e.to_string(),
                        };
                        return Err(self.fail(err.into()));
                    }
                },
            }
        }
    }

    fn report_progress(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.state = UploadState::Uploading { progress: fraction };
        info!(
            job_id = %self.job_id,
            progress = (fraction * 100.0) as u32,
            "Upload progress: {}%",
            (fraction * 100.0) as u32
        );
        if let Some(tx) = &self.progress {
            tx.send_replace(fraction);
        }
    }

    fn complete(&mut self, body: &Value) -> AppResult<String> {
        match body.get("id").and_then(Value::as_str) {
            Some(video_id) => {
                info!(job_id = %self.job_id, "Video uploaded successfully. Video ID: {}", video_id);
                if let Some(tx) = &self.progress {
                    tx.send_replace(1.0);
                }
                self.state = UploadState::Completed {
                    video_id: video_id.to_string(),
                };
                Ok(video_id.to_string())
            }
            None => Err(self.fail(UploadError::MissingIdentifier.into())),
        }
    }

    fn fail(&mut self, err: AppError) -> AppError {
        error!(job_id = %self.job_id, "Error uploading video to YouTube: {}", err);
        self.state = UploadState::Failed {
            reason: err.to_string(),
        };
        err
    }
}

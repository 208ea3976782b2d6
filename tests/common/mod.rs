//! Shared fixtures: an app wired to fake transcoder and video host.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Response;
use serde_json::{Value, json};
use shorts_publisher::app::create_app;
use shorts_publisher::common::error::{AppError, AppResult};
use shorts_publisher::config::settings::AppConfig;
use shorts_publisher::infrastructure::download::http::Downloader;
use shorts_publisher::infrastructure::ffmpeg::command::FfmpegCommand;
use shorts_publisher::infrastructure::ffmpeg::runner::{MediaTool, ToolFailure};
use shorts_publisher::infrastructure::youtube::host::{
    ChunkOutcome, PlaylistDraft, ResumableTransfer, TransferError, VideoHost, VideoMetadata,
};
use shorts_publisher::state::AppState;
use tempfile::TempDir;

/// Copies the first input to the output, as a no-op transcode would.
#[derive(Default)]
pub struct FakeTranscoder {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub fail_on: Option<&'static str>,
}

impl FakeTranscoder {
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|args| args.last().map(PathBuf::from))
            .collect()
    }
}

#[async_trait]
impl MediaTool for FakeTranscoder {
    async fn transcode(&self, command: &FfmpegCommand) -> Result<(), ToolFailure> {
        let args = command.build_args();
        self.calls.lock().unwrap().push(args.clone());

        if let Some(marker) = self.fail_on {
            if args.iter().any(|a| a.contains(marker)) {
                return Err(ToolFailure {
                    exit_code: Some(1),
                    stderr: "Error initializing filter 'drawtext'".to_string(),
                });
            }
        }

        tokio::fs::copy(&args[2], command.output())
            .await
            .map_err(|e| ToolFailure {
                exit_code: None,
                stderr: e.to_string(),
            })?;
        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, ToolFailure> {
        let len = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(ToolFailure {
                exit_code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        Ok(12.0)
    }
}

/// Completes every upload in a single chunk with a fixed id.
pub struct FakeHost {
    pub video_id: String,
    pub uploads: Mutex<Vec<(VideoMetadata, Vec<u8>)>>,
    pub playlist_items: Mutex<Vec<(String, String)>>,
}

impl FakeHost {
    pub fn new(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            uploads: Mutex::new(Vec::new()),
            playlist_items: Mutex::new(Vec::new()),
        }
    }
}

struct SingleChunk(Value);

#[async_trait]
impl ResumableTransfer for SingleChunk {
    async fn next_chunk(&mut self) -> Result<ChunkOutcome, TransferError> {
        Ok(ChunkOutcome::Complete(self.0.clone()))
    }
}

#[async_trait]
impl VideoHost for FakeHost {
    async fn begin_upload(
        &self,
        source: &Path,
        metadata: &VideoMetadata,
    ) -> AppResult<Box<dyn ResumableTransfer>> {
        let bytes = tokio::fs::read(source).await?;
        self.uploads.lock().unwrap().push((metadata.clone(), bytes));
        Ok(Box::new(SingleChunk(json!({ "id": self.video_id }))))
    }

    async fn create_playlist(&self, _draft: &PlaylistDraft) -> AppResult<String> {
        Ok("PL123".to_string())
    }

    async fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> AppResult<String> {
        self.playlist_items
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), video_id.to_string()));
        Ok("PLI1".to_string())
    }

    async fn video_info(&self, video_id: &str) -> AppResult<Value> {
        if video_id == self.video_id {
            Ok(json!({ "id": video_id, "snippet": { "title": "Clip" } }))
        } else {
            Err(AppError::NotFound("Video not found".to_string()))
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub transcoder: Arc<FakeTranscoder>,
    pub host: Arc<FakeHost>,
    pub work_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_transcoder(FakeTranscoder::default())
    }

    pub fn with_transcoder(transcoder: FakeTranscoder) -> Self {
        let work_dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(transcoder);
        let host = Arc::new(FakeHost::new("vid123"));

        let state = AppState::new(
            test_config(work_dir.path()),
            Downloader::new(std::time::Duration::from_secs(5)).unwrap(),
            transcoder.clone(),
            host.clone(),
        );

        Self {
            router: create_app(state),
            transcoder,
            host,
            work_dir,
        }
    }

    /// Job directories left behind under the work dir.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).unwrap().count()
    }
}

pub fn test_config(work_dir: &Path) -> AppConfig {
    AppConfig {
        server_port: 0,
        work_dir: work_dir.to_path_buf(),
        ffmpeg_bin: "ffmpeg".to_string(),
        ffprobe_bin: "ffprobe".to_string(),
        youtube_client_id: "client".to_string(),
        youtube_client_secret: "secret".to_string(),
        youtube_refresh_token: "refresh".to_string(),
        youtube_token_url: "http://127.0.0.1:9/token".to_string(),
        youtube_upload_url: "http://127.0.0.1:9/upload".to_string(),
        youtube_api_url: "http://127.0.0.1:9/api".to_string(),
        upload_chunk_size: 256 * 1024,
        upload_max_retries: 3,
        upload_retry_backoff_ms: 0,
        download_timeout_secs: 5,
        upload_http_timeout_secs: 5,
        max_body_bytes: 16 * 1024 * 1024,
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

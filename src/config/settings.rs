use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::common::retry::RetryPolicy;
use crate::config::env::{self, EnvKey};

/// The resumable protocol requires every non-final chunk to be a multiple of this.
pub const CHUNK_ALIGNMENT: usize = 256 * 1024;

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3";
pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub work_dir: PathBuf,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub youtube_client_id: String,
    pub youtube_client_secret: String,
    pub youtube_refresh_token: String,
    pub youtube_token_url: String,
    pub youtube_upload_url: String,
    pub youtube_api_url: String,
    pub upload_chunk_size: usize,
    pub upload_max_retries: u32,
    pub upload_retry_backoff_ms: u64,
    pub download_timeout_secs: u64,
    pub upload_http_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let default_work_dir = std::env::temp_dir().join("shorts-publisher");

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 5000),
            work_dir: env::get(EnvKey::WorkDir)
                .map(PathBuf::from)
                .unwrap_or(default_work_dir),
            ffmpeg_bin: env::get_or(EnvKey::FfmpegBin, "ffmpeg"),
            ffprobe_bin: env::get_or(EnvKey::FfprobeBin, "ffprobe"),
            youtube_client_id: required(EnvKey::YoutubeClientId)?,
            youtube_client_secret: required(EnvKey::YoutubeClientSecret)?,
            youtube_refresh_token: required(EnvKey::YoutubeRefreshToken)?,
            youtube_token_url: env::get_or(EnvKey::YoutubeTokenUrl, DEFAULT_TOKEN_URL),
            youtube_upload_url: env::get_or(EnvKey::YoutubeUploadUrl, DEFAULT_UPLOAD_URL),
            youtube_api_url: env::get_or(EnvKey::YoutubeApiUrl, DEFAULT_API_URL),
            upload_chunk_size: align_chunk_size(env::get_parsed(
                EnvKey::UploadChunkSize,
                8 * 1024 * 1024,
            )),
            upload_max_retries: env::get_parsed(EnvKey::UploadMaxRetries, 3),
            upload_retry_backoff_ms: env::get_parsed(EnvKey::UploadRetryBackoffMs, 0),
            download_timeout_secs: env::get_parsed(EnvKey::DownloadTimeoutSecs, 30),
            upload_http_timeout_secs: env::get_parsed(EnvKey::UploadHttpTimeoutSecs, 60),
            max_body_bytes: env::get_parsed(EnvKey::MaxBodyBytes, 512 * 1024 * 1024),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.upload_max_retries)
            .with_backoff(Duration::from_millis(self.upload_retry_backoff_ms))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Connect and per-read limit for YouTube API calls.
    pub fn upload_http_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_http_timeout_secs)
    }
}

fn required(key: EnvKey) -> Result<String> {
    let name = key.as_str();
    env::get(key).with_context(|| format!("missing required environment variable {}", name))
}

/// Rounds down to the protocol alignment, never below one aligned block.
pub fn align_chunk_size(size: usize) -> usize {
    (size / CHUNK_ALIGNMENT).max(1) * CHUNK_ALIGNMENT
}

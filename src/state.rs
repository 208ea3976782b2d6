use std::sync::Arc;

use anyhow::{Context, Result};

use crate::common::retry::RetryPolicy;
use crate::config::settings::AppConfig;
use crate::infrastructure::download::http::Downloader;
use crate::infrastructure::ffmpeg::runner::{FfmpegCli, MediaTool};
use crate::infrastructure::youtube::auth::RefreshTokenProvider;
use crate::infrastructure::youtube::client::{YoutubeClient, youtube_http_client};
use crate::infrastructure::youtube::host::VideoHost;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub downloader: Downloader,
    pub media: Arc<dyn MediaTool>,
    pub host: Arc<dyn VideoHost>,
    pub retry_policy: RetryPolicy,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        downloader: Downloader,
        media: Arc<dyn MediaTool>,
        host: Arc<dyn VideoHost>,
    ) -> Self {
        let retry_policy = config.retry_policy();
        Self {
            config,
            downloader,
            media,
            host,
            retry_policy,
        }
    }

    /// Wires the production adapters: the ffmpeg CLI and the YouTube API.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let downloader = Downloader::new(config.download_timeout())?;

        let media = Arc::new(FfmpegCli::new(&config.ffmpeg_bin, &config.ffprobe_bin));

        let http = youtube_http_client(config.upload_http_timeout())
            .context("Failed to build YouTube HTTP client")?;

        let tokens = Arc::new(RefreshTokenProvider::new(
            http.clone(),
            &config.youtube_token_url,
            &config.youtube_client_id,
            &config.youtube_client_secret,
            &config.youtube_refresh_token,
        ));

        let host = Arc::new(YoutubeClient::new(
            http,
            tokens,
            &config.youtube_upload_url,
            &config.youtube_api_url,
            config.upload_chunk_size,
        ));

        Ok(Self::new(config, downloader, media, host))
    }
}

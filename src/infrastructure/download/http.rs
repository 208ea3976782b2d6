use std::io;
use std::path::Path;
use std::time::Duration;

use futures_util::TryStreamExt;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufReader},
};
use tokio_util::io::StreamReader;
use tracing::{error, info};

use crate::common::error::{AppError, AppResult};

/// Buffer size used when streaming a response body to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// `timeout` bounds connecting and each read, not the whole transfer.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetches `url` and streams the body into `dest`, returning bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> AppResult<u64> {
        info!("Downloading file from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("Error downloading file: {}", e);
                AppError::download(url, e)
            })?;

        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = BufReader::with_capacity(DOWNLOAD_CHUNK_SIZE, StreamReader::new(stream));
        let mut file = File::create(dest).await?;

        let written = match tokio::io::copy_buf(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                error!("Error downloading file: {}", e);
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(AppError::download(url, e));
            }
        };
        file.flush().await?;

        info!("File downloaded successfully to {} ({} bytes)", dest.display(), written);
        Ok(written)
    }
}

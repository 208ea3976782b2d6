use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde_json::{Value, json};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use super::auth::TokenProvider;
use super::host::{
    ChunkOutcome, PlaylistDraft, ResumableTransfer, TransferError, VideoHost, VideoMetadata,
};
use crate::common::error::{AppError, AppResult, UploadError};

/// HTTP 308 is "Resume Incomplete" in the resumable upload protocol.
const RESUME_INCOMPLETE: u16 = 308;

/// HTTP client for the YouTube API. Redirects stay off so 308 reaches the
/// transfer; `timeout` bounds connecting and each read so a stalled peer
/// surfaces as a retryable network error.
pub fn youtube_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    upload_url: String,
    api_url: String,
    chunk_size: usize,
}

impl YoutubeClient {
    /// `http` must not follow redirects, or 308 responses are swallowed.
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        upload_url: impl Into<String>,
        api_url: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            http,
            tokens,
            upload_url: upload_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            chunk_size: chunk_size.max(1),
        }
    }

    async fn api_post(&self, path_and_query: &str, body: Value) -> AppResult<Value> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(format!("{}/{}", self.api_url, path_and_query))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("YouTube API request failed: {}", e)))?;

        read_api_json(response).await
    }
}

async fn read_api_json(response: reqwest::Response) -> AppResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UploadError::Rejected(format!("YouTube API returned {}: {}", status, body)).into());
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AppError::internal(format!("malformed YouTube API response: {}", e)))
}

fn response_id(body: &Value) -> Option<String> {
    body.get("id").and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl VideoHost for YoutubeClient {
    async fn begin_upload(
        &self,
        source: &Path,
        metadata: &VideoMetadata,
    ) -> AppResult<Box<dyn ResumableTransfer>> {
        // Authenticate up front so credential failures are fatal, not retried.
        self.tokens.access_token().await?;

        let total = tokio::fs::metadata(source).await?.len();
        let content_type = mime_guess::from_path(source)
            .first_raw()
            .unwrap_or("video/mp4")
            .to_string();

        info!(
            "Prepared resumable upload of {} ({} bytes, {})",
            source.display(),
            total,
            content_type
        );

        Ok(Box::new(HttpResumableTransfer {
            http: self.http.clone(),
            tokens: self.tokens.clone(),
            init_url: format!(
                "{}/videos?uploadType=resumable&part=snippet,status",
                self.upload_url
            ),
            resource: metadata.to_resource(),
            source: source.to_path_buf(),
            content_type,
            total,
            chunk_size: self.chunk_size,
            file: None,
            session_uri: None,
            cursor: 0,
            needs_resync: false,
        }))
    }

    async fn create_playlist(&self, draft: &PlaylistDraft) -> AppResult<String> {
        info!("Creating YouTube playlist: {}", draft.title);
        let body = json!({
            "snippet": { "title": draft.title, "description": draft.description },
            "status": { "privacyStatus": draft.privacy_status.as_str() }
        });

        let response = self.api_post("playlists?part=snippet,status", body).await?;
        response_id(&response)
            .ok_or_else(|| UploadError::Rejected("Playlist creation failed".to_string()).into())
    }

    async fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> AppResult<String> {
        info!("Adding video {} to playlist {}", video_id, playlist_id);
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id }
            }
        });

        let response = self.api_post("playlistItems?part=snippet", body).await?;
        response_id(&response).ok_or_else(|| {
            UploadError::Rejected("Failed to add video to playlist".to_string()).into()
        })
    }

    async fn video_info(&self, video_id: &str) -> AppResult<Value> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(format!("{}/videos", self.api_url))
            .query(&[("part", "snippet,status,statistics"), ("id", video_id)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("YouTube API request failed: {}", e)))?;

        let body = read_api_json(response).await?;
        body.get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .cloned()
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }
}

/// Resumable upload over HTTP. The session is opened lazily on the first
/// chunk call; after any failure the cursor is re-read from the server
/// before the next chunk is sent.
pub struct HttpResumableTransfer {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    init_url: String,
    resource: Value,
    source: PathBuf,
    content_type: String,
    total: u64,
    chunk_size: usize,
    file: Option<File>,
    session_uri: Option<String>,
    cursor: u64,
    needs_resync: bool,
}

impl HttpResumableTransfer {
    async fn bearer(&self) -> Result<String, TransferError> {
        self.tokens
            .access_token()
            .await
            .map_err(|e| TransferError::Credentials(e.to_string()))
    }

    async fn open_session(&mut self) -> Result<String, TransferError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(&self.init_url)
            .bearer_auth(token)
            .header("X-Upload-Content-Type", &self.content_type)
            .header("X-Upload-Content-Length", self.total)
            .json(&self.resource)
            .send()
            .await
            .map_err(network)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let uri = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TransferError::Protocol("no Location header on session".to_string()))?;

        debug!("Opened resumable session {}", uri);
        Ok(uri)
    }

    /// Asks the server how many bytes it holds.
    async fn resync(&mut self, uri: &str) -> Result<Option<ChunkOutcome>, TransferError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .put(uri)
            .bearer_auth(token)
            .header(header::CONTENT_RANGE, format!("bytes */{}", self.total))
            .body(Vec::new())
            .send()
            .await
            .map_err(network)?;

        match response.status() {
            s if s.as_u16() == RESUME_INCOMPLETE => {
                self.cursor = committed_bytes(response.headers());
                debug!("Resuming upload at byte {}", self.cursor);
                Ok(None)
            }
            s if s.is_success() => finish(response).await.map(Some),
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                // Session expired; open a fresh one from byte zero.
                self.session_uri = None;
                self.cursor = 0;
                Err(TransferError::Protocol("upload session expired".to_string()))
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, TransferError> {
        if self.file.is_none() {
            let file = File::open(&self.source)
                .await
                .map_err(|e| TransferError::Io(e.to_string()))?;
            self.file = Some(file);
        }
        let cursor = self.cursor;
        let chunk_size = self.chunk_size as u64;
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| TransferError::Io("source not open".to_string()))?;

        file.seek(SeekFrom::Start(cursor))
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
        let mut buf = Vec::with_capacity(chunk_size as usize);
        file.take(chunk_size)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;

        Ok(buf)
    }

    async fn send_chunk(&mut self, uri: &str) -> Result<ChunkOutcome, TransferError> {
        let chunk = self.read_chunk().await?;
        let range = if chunk.is_empty() {
            format!("bytes */{}", self.total)
        } else {
            let end = self.cursor + chunk.len() as u64 - 1;
            format!("bytes {}-{}/{}", self.cursor, end, self.total)
        };
        debug!("Sending chunk {}", range);

        let token = self.bearer().await?;
        let response = self
            .http
            .put(uri)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, &self.content_type)
            .header(header::CONTENT_RANGE, range)
            .body(chunk)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if status.as_u16() == RESUME_INCOMPLETE {
            self.cursor = committed_bytes(response.headers());
            return Ok(ChunkOutcome::Progress(self.fraction()));
        }
        if status.is_success() {
            return finish(response).await;
        }
        Err(status_error(response).await)
    }

    fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.cursor as f64 / self.total as f64
        }
    }

    async fn step(&mut self) -> Result<ChunkOutcome, TransferError> {
        let uri = match self.session_uri.clone() {
            Some(uri) => uri,
            None => {
                let uri = self.open_session().await?;
                self.session_uri = Some(uri.clone());
                self.cursor = 0;
                self.needs_resync = false;
                uri
            }
        };

        if self.needs_resync {
            if let Some(done) = self.resync(&uri).await? {
                self.needs_resync = false;
                return Ok(done);
            }
            self.needs_resync = false;
        }

        self.send_chunk(&uri).await
    }
}

#[async_trait]
impl ResumableTransfer for HttpResumableTransfer {
    async fn next_chunk(&mut self) -> Result<ChunkOutcome, TransferError> {
        let result = self.step().await;
        if let Err(e) = &result {
            warn!("Chunk transfer failed: {}", e);
            if self.session_uri.is_some() {
                self.needs_resync = true;
            }
        }
        result
    }
}

fn network(err: reqwest::Error) -> TransferError {
    TransferError::Network(err.to_string())
}

async fn status_error(response: reqwest::Response) -> TransferError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TransferError::Status { status, body }
}

async fn finish(response: reqwest::Response) -> Result<ChunkOutcome, TransferError> {
    response
        .json::<Value>()
        .await
        .map(ChunkOutcome::Complete)
        .map_err(|e| TransferError::Protocol(format!("unreadable completion body: {}", e)))
}

/// Parses `Range: bytes=0-N` into the next offset `N + 1`; no header means
/// the server holds nothing yet.
fn committed_bytes(headers: &header::HeaderMap) -> u64 {
    headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().strip_prefix("bytes="))
        .and_then(|v| v.split('-').nth(1))
        .and_then(|end| end.trim().parse::<u64>().ok())
        .map(|end| end + 1)
        .unwrap_or(0)
}

//! Input acquisition: turns whichever form the media arrived in into a
//! file inside the job workspace.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::info;
use url::Url;

use super::workspace::JobWorkspace;
use crate::common::error::{AppError, AppResult};
use crate::infrastructure::download::http::Downloader;

/// How a `POST /run` body is encoded, judged from its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    RawVideo,
    RawAudio,
    Json,
    Form,
    Multipart,
    Empty,
}

impl PayloadShape {
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(mime) = content_type.and_then(|ct| ct.parse::<mime::Mime>().ok()) else {
            return PayloadShape::Empty;
        };

        let (ty, sub) = (mime.type_(), mime.subtype());
        if ty == mime::VIDEO {
            PayloadShape::RawVideo
        } else if ty == mime::AUDIO {
            PayloadShape::RawAudio
        } else if ty == mime::APPLICATION && (sub == mime::JSON || mime.suffix() == Some(mime::JSON)) {
            PayloadShape::Json
        } else if ty == mime::APPLICATION && sub == mime::WWW_FORM_URLENCODED {
            PayloadShape::Form
        } else if ty == mime::MULTIPART && sub == mime::FORM_DATA {
            PayloadShape::Multipart
        } else {
            PayloadShape::Empty
        }
    }
}

/// Media bytes gathered while reading the request, before selection.
#[derive(Debug, Default)]
pub struct JobInputs {
    pub raw_video: Option<Bytes>,
    pub raw_audio: Option<Bytes>,
    pub stored_video: Option<PathBuf>,
    pub stored_audio: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// Request body written verbatim.
    Body(Bytes),
    /// Remote file fetched over HTTP.
    Url(String),
    /// Multipart file already persisted.
    Stored(PathBuf),
}

impl MediaSource {
    /// Raw body wins over a URL, which wins over an uploaded file.
    pub fn select(body: Option<Bytes>, url: Option<String>, stored: Option<PathBuf>) -> Option<Self> {
        body.map(MediaSource::Body)
            .or_else(|| url.map(MediaSource::Url))
            .or_else(|| stored.map(MediaSource::Stored))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            MediaSource::Body(_) => "raw body",
            MediaSource::Url(_) => "url",
            MediaSource::Stored(_) => "multipart upload",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredMedia {
    pub video: PathBuf,
    pub audio: Option<PathBuf>,
}

/// Materializes the mandatory video and the optional audio.
pub async fn acquire(
    video: Option<MediaSource>,
    audio: Option<MediaSource>,
    workspace: &JobWorkspace,
    downloader: &Downloader,
) -> AppResult<AcquiredMedia> {
    let video = video.ok_or_else(|| AppError::client_input("No valid video input provided"))?;
    info!("Acquiring video from {}", video.describe());
    let video = materialize(video, &workspace.input_video(), downloader).await?;

    let audio = match audio {
        Some(source) => {
            info!("Acquiring audio from {}", source.describe());
            Some(materialize(source, &workspace.input_audio(), downloader).await?)
        }
        None => None,
    };

    Ok(AcquiredMedia { video, audio })
}

pub async fn materialize(
    source: MediaSource,
    dest: &Path,
    downloader: &Downloader,
) -> AppResult<PathBuf> {
    match source {
        MediaSource::Body(bytes) => {
            tokio::fs::write(dest, &bytes).await?;
        }
        MediaSource::Url(raw) => {
            let url = parse_media_url(&raw)?;
            downloader.download(url.as_str(), dest).await?;
        }
        MediaSource::Stored(path) => {
            if path != dest {
                tokio::fs::rename(&path, dest).await?;
            }
        }
    }

    Ok(dest.to_path_buf())
}

fn parse_media_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::client_input(format!("Invalid media URL {:?}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::client_input(format!(
            "Unsupported URL scheme {:?} in {:?}",
            other, raw
        ))),
    }
}

use std::fmt;
use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub type AppResult<T> = Result<T, AppError>;

/// External transcoder stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeStage {
    Ducking,
    ShortsFormat,
    Watermark,
    Subtitle,
}

impl fmt::Display for TranscodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TranscodeStage::Ducking => "apply audio ducking",
            TranscodeStage::ShortsFormat => "convert video format",
            TranscodeStage::Watermark => "add watermark",
            TranscodeStage::Subtitle => "add subtitle",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Video file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Upload failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Upload completed without identifier")]
    MissingIdentifier,

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    ClientInput(String),

    #[error("Failed to download file from {url}: {message}")]
    Download { url: String, message: String },

    #[error("Failed to {stage}: {stderr}")]
    Transcode {
        stage: TranscodeStage,
        stderr: String,
    },

    #[error("Failed to authenticate with YouTube API: {0}")]
    Authentication(String),

    #[error("Failed to upload video to YouTube: {0}")]
    Upload(#[from] UploadError),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn client_input(msg: impl Into<String>) -> Self {
        Self::ClientInput(msg.into())
    }

    pub fn download(url: impl Into<String>, msg: impl fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            message: msg.to_string(),
        }
    }

    pub fn transcode(stage: TranscodeStage, stderr: impl Into<String>) -> Self {
        Self::Transcode {
            stage,
            stderr: stderr.into(),
        }
    }

    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Stable machine-readable category, surfaced as `kind` in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ClientInput(_) => "client_input",
            AppError::Download { .. } => "download",
            AppError::Transcode { .. } => "transcode",
            AppError::Authentication(_) => "authentication",
            AppError::Upload(_) => "upload",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ClientInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Download { .. } | AppError::Authentication(_) | AppError::Upload(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Transcode { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub kind: String,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            kind: self.kind().to_string(),
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

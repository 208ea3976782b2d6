use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppResult;

/// People & Blogs.
pub const DEFAULT_CATEGORY_ID: &str = "22";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Private => "private",
        }
    }
}

impl std::str::FromStr for PrivacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(PrivacyStatus::Public),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            "private" => Ok(PrivacyStatus::Private),
            other => Err(format!("unknown privacy status {:?}", other)),
        }
    }
}

/// Resource metadata sent when a video upload is initiated.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct VideoMetadata {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
    pub made_for_kids: bool,
}

impl VideoMetadata {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
        privacy_status: PrivacyStatus,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags,
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            privacy_status,
            made_for_kids: false,
        }
    }

    /// The `snippet` + `status` body of a videos.insert call.
    pub fn to_resource(&self) -> Value {
        json!({
            "snippet": {
                "title": self.title,
                "description": self.description,
                "tags": self.tags,
                "categoryId": self.category_id,
            },
            "status": {
                "privacyStatus": self.privacy_status.as_str(),
                "selfDeclaredMadeForKids": self.made_for_kids,
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaylistDraft {
    #[validate(length(min = 1, max = 150, message = "title must be 1-150 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub privacy_status: PrivacyStatus,
}

/// Result of one "send next chunk" call.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// Fraction of bytes acknowledged so far, `0.0..=1.0`.
    Progress(f64),
    /// The transfer finished; the server's resource body.
    Complete(Value),
}

/// A failed chunk send. Every variant is retryable from the session's view.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransferError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("local read failed: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// One resumable transfer. The chunk cursor lives inside the implementation.
#[async_trait]
pub trait ResumableTransfer: Send {
    async fn next_chunk(&mut self) -> Result<ChunkOutcome, TransferError>;
}

/// Remote video-hosting API.
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Authenticates and prepares a transfer of `source`. Authentication
    /// failures surface here; transfer failures surface from the chunk calls.
    async fn begin_upload(
        &self,
        source: &Path,
        metadata: &VideoMetadata,
    ) -> AppResult<Box<dyn ResumableTransfer>>;

    async fn create_playlist(&self, draft: &PlaylistDraft) -> AppResult<String>;

    /// Returns the playlist item id.
    async fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> AppResult<String>;

    async fn video_info(&self, video_id: &str) -> AppResult<Value>;
}

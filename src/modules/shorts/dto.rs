use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::acquisition::{JobInputs, MediaSource};
use crate::common::error::{AppError, AppResult};
use crate::infrastructure::youtube::host::{PrivacyStatus, VideoMetadata};

pub const DEFAULT_TITLE: &str = "YouTube Short";

/// Tags arrive either as one comma-separated string or as a JSON array.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TagList {
    Csv(String),
    List(Vec<String>),
}

impl TagList {
    pub fn into_tags(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            TagList::Csv(s) => s.split(',').map(str::to_string).collect(),
            TagList::List(list) => list,
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Text fields of a `POST /run` request, in any of the accepted encodings.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct RunForm {
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    /// Watermark identity; rendered as `Sumber: @{username}`.
    pub username: Option<String>,
    pub subtitle_text: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<TagList>,
    pub privacy_status: Option<PrivacyStatus>,
    /// Playlist the published video is added to.
    pub playlist_id: Option<String>,
    /// Reframe to 1080x1920 and cap at 60 seconds before overlays.
    pub shorts_format: Option<bool>,
}

impl RunForm {
    /// Applies one multipart text field.
    pub fn set_field(&mut self, name: &str, value: String) -> AppResult<()> {
        match name {
            "video_url" => self.video_url = Some(value),
            "audio_url" => self.audio_url = Some(value),
            "username" => self.username = Some(value),
            "subtitle_text" => self.subtitle_text = Some(value),
            "title" => self.title = Some(value),
            "description" => self.description = Some(value),
            "tags" => self.tags = Some(TagList::Csv(value)),
            "playlist_id" => self.playlist_id = Some(value),
            "privacy_status" => {
                self.privacy_status = Some(value.parse().map_err(AppError::client_input)?)
            }
            "shorts_format" => {
                let flag = match value.trim().to_ascii_lowercase().as_str() {
                    "" | "0" | "false" | "no" | "off" => false,
                    "1" | "true" | "yes" | "on" => true,
                    other => {
                        return Err(AppError::client_input(format!(
                            "shorts_format must be a boolean, got {:?}",
                            other
                        )));
                    }
                };
                self.shorts_format = Some(flag);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn into_job(self, id: Uuid, inputs: JobInputs) -> AppResult<Job> {
        let video = MediaSource::select(
            inputs.raw_video,
            non_empty(self.video_url),
            inputs.stored_video,
        );
        let audio = MediaSource::select(
            inputs.raw_audio,
            non_empty(self.audio_url),
            inputs.stored_audio,
        );

        let metadata = VideoMetadata::new(
            non_empty(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            self.description.unwrap_or_default(),
            self.tags.map(TagList::into_tags).unwrap_or_default(),
            self.privacy_status.unwrap_or_default(),
        );
        metadata
            .validate()
            .map_err(|e| AppError::client_input(e.to_string()))?;

        Ok(Job {
            id,
            video,
            audio,
            username: non_empty(self.username),
            subtitle_text: non_empty(self.subtitle_text),
            metadata,
            playlist_id: non_empty(self.playlist_id),
            shorts_format: self.shorts_format.unwrap_or(false),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One request's unit of work.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub video: Option<MediaSource>,
    pub audio: Option<MediaSource>,
    pub username: Option<String>,
    pub subtitle_text: Option<String>,
    pub metadata: VideoMetadata,
    pub playlist_id: Option<String>,
    pub shorts_format: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RunResponse {
    pub video_id: String,
    pub video_url: String,
}

impl RunResponse {
    pub fn new(video_id: String) -> Self {
        Self {
            video_url: format!("https://www.youtube.com/watch?v={}", video_id),
            video_id,
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

pub use crate::infrastructure::youtube::host::PlaylistDraft;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddPlaylistItemRequest {
    #[validate(length(min = 1, message = "video_id is required"))]
    pub video_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaylistCreated {
    pub playlist_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaylistItemAdded {
    pub playlist_id: String,
    pub video_id: String,
    pub playlist_item_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoInfo {
    pub video_id: String,
    /// Raw `snippet`, `status` and `statistics` parts of the video resource.
    #[schema(value_type = Object)]
    pub video: Value,
}

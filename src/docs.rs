use utoipa::OpenApi;

use crate::common::error::ErrorBody;
use crate::common::response::NotFoundBody;
use crate::infrastructure::youtube::host::{PlaylistDraft, PrivacyStatus};
use crate::modules::channel::dto::{AddPlaylistItemRequest, PlaylistCreated, PlaylistItemAdded, VideoInfo};
use crate::modules::shorts::dto::{RunForm, RunResponse, TagList};
use crate::routes::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::modules::shorts::handler::run,
        crate::modules::channel::handler::create_playlist,
        crate::modules::channel::handler::add_playlist_item,
        crate::modules::channel::handler::get_video,
    ),
    components(
        schemas(
            HealthResponse, ErrorBody, NotFoundBody,
            RunForm, RunResponse, TagList, PrivacyStatus,
            PlaylistDraft, AddPlaylistItemRequest, PlaylistCreated, PlaylistItemAdded, VideoInfo,
        )
    ),
    tags(
        (name = "Shorts", description = "Video processing and publishing"),
        (name = "Channel", description = "Playlist and video lookups"),
        (name = "Health", description = "Service status")
    )
)]
pub struct ApiDoc;

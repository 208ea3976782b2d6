use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::dto::{AddPlaylistItemRequest, PlaylistCreated, PlaylistDraft, PlaylistItemAdded, VideoInfo};
use super::service::ChannelService;
use crate::common::error::{AppError, AppResult, ErrorBody};
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::state::AppState;

/// Create a playlist on the channel
#[utoipa::path(
    post,
    path = "/playlists",
    request_body = PlaylistDraft,
    responses(
        (status = 201, description = "Playlist created", body = ApiResponse<PlaylistCreated>),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 502, description = "YouTube rejected the request", body = ErrorBody)
    ),
    tag = "Channel"
)]
pub async fn create_playlist(
    State(state): State<AppState>,
    payload: Result<Json<PlaylistDraft>, JsonRejection>,
) -> AppResult<ApiSuccess<ApiResponse<PlaylistCreated>>> {
    let Json(payload) = payload.map_err(|e| AppError::client_input(e.body_text()))?;
    let created = ChannelService::create_playlist(&state, payload).await?;
    Ok(ApiSuccess(
        ApiResponse::success(created, "Playlist created successfully"),
        StatusCode::CREATED,
    ))
}

/// Add a video to a playlist
#[utoipa::path(
    post,
    path = "/playlists/{playlist_id}/items",
    params(
        ("playlist_id" = String, Path, description = "Playlist ID")
    ),
    request_body = AddPlaylistItemRequest,
    responses(
        (status = 201, description = "Video added", body = ApiResponse<PlaylistItemAdded>),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 502, description = "YouTube rejected the request", body = ErrorBody)
    ),
    tag = "Channel"
)]
pub async fn add_playlist_item(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    payload: Result<Json<AddPlaylistItemRequest>, JsonRejection>,
) -> AppResult<ApiSuccess<ApiResponse<PlaylistItemAdded>>> {
    let Json(payload) = payload.map_err(|e| AppError::client_input(e.body_text()))?;
    let added = ChannelService::add_item(&state, playlist_id, payload).await?;
    Ok(ApiSuccess(
        ApiResponse::success(added, "Video added to playlist successfully"),
        StatusCode::CREATED,
    ))
}

/// Get video details
#[utoipa::path(
    get,
    path = "/videos/{video_id}",
    params(
        ("video_id" = String, Path, description = "YouTube video ID")
    ),
    responses(
        (status = 200, description = "Video details", body = ApiResponse<VideoInfo>),
        (status = 404, description = "Video not found", body = ErrorBody)
    ),
    tag = "Channel"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiSuccess<ApiResponse<VideoInfo>>> {
    let info = ChannelService::video_info(&state, video_id).await?;
    Ok(ApiSuccess(
        ApiResponse::success(info, "Video retrieved successfully"),
        StatusCode::OK,
    ))
}

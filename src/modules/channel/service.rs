use tracing::info;
use validator::Validate;

use super::dto::{AddPlaylistItemRequest, PlaylistCreated, PlaylistDraft, PlaylistItemAdded, VideoInfo};
use crate::common::error::{AppError, AppResult};
use crate::state::AppState;

pub struct ChannelService;

impl ChannelService {
    pub async fn create_playlist(state: &AppState, draft: PlaylistDraft) -> AppResult<PlaylistCreated> {
        draft
            .validate()
            .map_err(|e| AppError::client_input(e.to_string()))?;

        let playlist_id = state.host.create_playlist(&draft).await?;
        info!("Playlist created: {}", playlist_id);

        Ok(PlaylistCreated { playlist_id })
    }

    pub async fn add_item(
        state: &AppState,
        playlist_id: String,
        req: AddPlaylistItemRequest,
    ) -> AppResult<PlaylistItemAdded> {
        req.validate()
            .map_err(|e| AppError::client_input(e.to_string()))?;

        let playlist_item_id = state.host.add_to_playlist(&playlist_id, &req.video_id).await?;

        Ok(PlaylistItemAdded {
            playlist_id,
            video_id: req.video_id,
            playlist_item_id,
        })
    }

    pub async fn video_info(state: &AppState, video_id: String) -> AppResult<VideoInfo> {
        let video = state.host.video_info(&video_id).await?;
        Ok(VideoInfo { video_id, video })
    }
}

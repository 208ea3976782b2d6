use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/playlists", post(handler::create_playlist))
        .route("/playlists/{playlist_id}/items", post(handler::add_playlist_item))
        .route("/videos/{video_id}", get(handler::get_video))
}

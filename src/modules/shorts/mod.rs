use axum::Router;
use axum::routing::post;

use crate::state::AppState;

pub mod acquisition;
pub mod dto;
pub mod handler;
pub mod pipeline;
pub mod service;
pub mod upload;
pub mod workspace;

pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(handler::run))
}

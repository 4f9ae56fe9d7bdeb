pub mod dto;
pub mod handlers;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::comment_routes()
}

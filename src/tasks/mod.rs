pub mod dto;
pub mod feed;
pub mod handlers;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::dashboard_routes())
        .merge(handlers::public_routes())
}

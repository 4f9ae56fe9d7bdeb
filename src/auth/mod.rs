use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod header;
pub mod jwt;
pub mod provider;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::header_routes())
}

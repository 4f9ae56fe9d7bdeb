use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CommentView, CreateCommentRequest};
use super::services;
use crate::{auth::extractors::AuthSession, state::AppState};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/task/:id/comments", post(create_comment))
        .route("/task/:id/comments/:comment_id", delete(delete_comment))
}

/// POST /task/:id/comments { comment }
#[instrument(skip(state, body))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Path(task_id): Path<Uuid>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), (StatusCode, String)> {
    let comment = services::add_comment(&state, &user, task_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentView::new(comment, Some(user.email.as_str()))),
    ))
}

/// DELETE /task/:id/comments/:comment_id
#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_comment(&state, &user, task_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

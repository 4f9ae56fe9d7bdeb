use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::StreamExt;
use tracing::{error, instrument};
use uuid::Uuid;

use super::dto::{CreateTaskRequest, DashboardView, ShareResponse, TaskDetail, TaskPage, TaskView};
use super::services;
use crate::{
    auth::extractors::{AuthSession, CurrentSession},
    comments::dto::CommentView,
    state::AppState,
};

// --- routers ---

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/stream", get(dashboard_stream))
        .route("/dashboard/tasks", post(create_task))
        .route("/dashboard/tasks/:id", delete(delete_task))
        .route("/dashboard/tasks/:id/share", get(share_task))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/task/:id", get(task_page))
}

// --- handlers ---

/// GET /dashboard: the owner's tasks, or back home when signed out.
#[instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>, current: CurrentSession) -> Response {
    let Some(user) = current.into_session() else {
        return Redirect::to("/").into_response();
    };
    match services::list_tasks(&state, &user).await {
        Ok(tasks) => {
            let tasks = tasks
                .into_iter()
                .map(|t| TaskView::new(t, |id| state.config.share_url(id)))
                .collect();
            Json(DashboardView { user, tasks }).into_response()
        }
        Err(e) => <(StatusCode, String)>::from(e).into_response(),
    }
}

/// GET /dashboard/stream: SSE, one `tasks` event per full snapshot. The
/// stream closes when the session's token expires or its owner signs out.
#[instrument(skip_all)]
pub async fn dashboard_stream(State(state): State<AppState>, current: CurrentSession) -> Response {
    let Some((user, expires_at)) = current.into_parts() else {
        return Redirect::to("/").into_response();
    };
    let config = state.config.clone();
    let owner = user.email.clone();
    let events = services::subscribe_tasks_until(&state, &user, expires_at).map(
        move |snapshot| -> Result<Event, Infallible> {
            let event = match snapshot {
                Ok(tasks) => {
                    let views: Vec<TaskView> = tasks
                        .into_iter()
                        .map(|t| TaskView::new(t, |id| config.share_url(id)))
                        .collect();
                    Event::default().event("tasks").json_data(views)
                }
                Err(e) => {
                    error!(error = %e, %owner, "task snapshot failed");
                    Ok(Event::default().event("error").data("snapshot unavailable"))
                }
            };
            Ok(event.unwrap_or_else(|e| {
                error!(error = %e, "encode snapshot failed");
                Event::default().event("error").data("snapshot unavailable")
            }))
        },
    );

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

/// POST /dashboard/tasks { task, public }
#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, HeaderMap, Json<TaskView>), (StatusCode, String)> {
    let task = services::create_task(&state, &user, body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/task/{}", task.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    let view = TaskView::new(task, |id| state.config.share_url(id));
    Ok((StatusCode::CREATED, headers, Json(view)))
}

/// DELETE /dashboard/tasks/:id
#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_task(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /dashboard/tasks/:id/share
#[instrument(skip(state))]
pub async fn share_task(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareResponse>, (StatusCode, String)> {
    let url = services::share_url(&state, &user, id).await?;
    Ok(Json(ShareResponse { url }))
}

/// GET /task/:id: missing and private tasks both send the visitor home.
#[instrument(skip(state, current))]
pub async fn task_page(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Response {
    let Some((task, comments)) = services::load_public_task(&state, &id).await else {
        return Redirect::to("/").into_response();
    };

    let viewer = current.into_session();
    let viewer_email = viewer.as_ref().map(|v| v.email.as_str());
    let comments = comments
        .into_iter()
        .map(|c| CommentView::new(c, viewer_email))
        .collect();
    let can_comment = viewer.as_ref().is_some_and(|v| v.display_name().is_some());

    Json(TaskPage {
        item: TaskDetail::from(task),
        comments,
        viewer,
        can_comment,
    })
    .into_response()
}

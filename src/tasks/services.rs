use std::time::Duration;

use futures_util::{Stream, StreamExt};
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::CreateTaskRequest;
use super::feed::TaskSubscription;
use super::repo_types::{NewTask, Task};
use crate::auth::dto::Session;
use crate::comments::repo_types::Comment;
use crate::error::ServiceError;
use crate::state::AppState;

pub async fn list_tasks(state: &AppState, owner: &Session) -> Result<Vec<Task>, ServiceError> {
    state.store.list_tasks_by_owner(&owner.email).await.map_err(|e| {
        error!(error = %e, owner = %owner.email, "list tasks failed");
        ServiceError::Store(e)
    })
}

pub fn subscribe_tasks(state: &AppState, owner: &Session) -> TaskSubscription {
    state.feed.subscribe(state.store.clone(), owner.email.clone())
}

/// Snapshot stream for a session that stops valid at `expires_at`. The stream
/// ends then, or earlier when the owner signs out.
pub fn subscribe_tasks_until(
    state: &AppState,
    owner: &Session,
    expires_at: OffsetDateTime,
) -> impl Stream<Item = anyhow::Result<Vec<Task>>> + Send {
    let remaining =
        Duration::try_from(expires_at - OffsetDateTime::now_utc()).unwrap_or(Duration::ZERO);
    subscribe_tasks(state, owner)
        .into_stream()
        .take_until(tokio::time::sleep(remaining))
}

pub async fn create_task(
    state: &AppState,
    owner: &Session,
    req: CreateTaskRequest,
) -> Result<Task, ServiceError> {
    if req.task.is_empty() {
        return Err(ServiceError::Invalid("task is required"));
    }

    let task = state
        .store
        .insert_task(NewTask {
            task: req.task,
            public: req.public,
            user: owner.email.clone(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, owner = %owner.email, "create task failed");
            ServiceError::Store(e)
        })?;

    state.feed.publish(&task.user);
    info!(task_id = %task.id, owner = %task.user, public = task.public, "task created");
    Ok(task)
}

/// Loads a task for its owner. Foreign tasks look exactly like missing ones.
pub async fn owned_task(state: &AppState, owner: &Session, id: Uuid) -> Result<Task, ServiceError> {
    match state.store.get_task(id).await {
        Ok(Some(task)) if task.is_owned_by(&owner.email) => Ok(task),
        Ok(_) => Err(ServiceError::NotFound),
        Err(e) => {
            error!(error = %e, %id, "get task failed");
            Err(ServiceError::Store(e))
        }
    }
}

/// Only the owner may delete. Deleting an already-gone task succeeds.
pub async fn delete_task(state: &AppState, owner: &Session, id: Uuid) -> Result<(), ServiceError> {
    let task = match state.store.get_task(id).await {
        Ok(Some(task)) => task,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(error = %e, %id, "get task failed");
            return Err(ServiceError::Store(e));
        }
    };
    if !task.is_owned_by(&owner.email) {
        warn!(%id, requester = %owner.email, "refusing to delete another user's task");
        return Err(ServiceError::Forbidden);
    }

    state.store.delete_task(id).await.map_err(|e| {
        error!(error = %e, %id, "delete task failed");
        ServiceError::Store(e)
    })?;

    state.feed.publish(&task.user);
    info!(task_id = %id, owner = %task.user, "task deleted");
    Ok(())
}

pub async fn share_url(state: &AppState, owner: &Session, id: Uuid) -> Result<String, ServiceError> {
    let task = owned_task(state, owner, id).await?;
    if !task.public {
        return Err(ServiceError::Conflict("only public tasks can be shared"));
    }
    Ok(state.config.share_url(task.id))
}

/// The task behind `/task/{id}` with its comments, or `None` when it is
/// missing, private, or cannot be read. All three redirect the same way.
pub async fn load_public_task(state: &AppState, raw_id: &str) -> Option<(Task, Vec<Comment>)> {
    let id = Uuid::parse_str(raw_id).ok()?;
    let task = match state.store.get_task(id).await {
        Ok(Some(task)) if task.public => task,
        Ok(_) => return None,
        Err(e) => {
            error!(error = %e, %id, "get task failed");
            return None;
        }
    };
    let comments = match state.store.list_comments_by_task(id).await {
        Ok(comments) => comments,
        Err(e) => {
            error!(error = %e, %id, "list comments failed");
            return None;
        }
    };
    Some((task, comments))
}

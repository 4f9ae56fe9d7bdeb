use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::CreateCommentRequest;
use super::repo_types::{Comment, NewComment};
use crate::auth::dto::Session;
use crate::error::ServiceError;
use crate::state::AppState;

/// Adds a comment to a public task. The author needs both an email and a display name.
pub async fn add_comment(
    state: &AppState,
    author: &Session,
    task_id: Uuid,
    req: CreateCommentRequest,
) -> Result<Comment, ServiceError> {
    if req.comment.is_empty() {
        return Err(ServiceError::Invalid("comment is required"));
    }
    let Some(name) = author.display_name() else {
        return Err(ServiceError::Invalid("a display name is required to comment"));
    };

    match state.store.get_task(task_id).await {
        Ok(Some(task)) if task.public => {}
        Ok(_) => return Err(ServiceError::NotFound),
        Err(e) => {
            error!(error = %e, %task_id, "get task failed");
            return Err(ServiceError::Store(e));
        }
    }

    let comment = state
        .store
        .insert_comment(NewComment {
            comment: req.comment,
            task_id,
            user: author.email.clone(),
            name: name.to_string(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, %task_id, author = %author.email, "create comment failed");
            ServiceError::Store(e)
        })?;

    info!(comment_id = %comment.id, %task_id, author = %comment.user, "comment created");
    Ok(comment)
}

/// Only the author may delete. Deleting an already-gone comment succeeds.
pub async fn delete_comment(
    state: &AppState,
    requester: &Session,
    task_id: Uuid,
    comment_id: Uuid,
) -> Result<(), ServiceError> {
    let comment = match state.store.get_comment(comment_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(error = %e, %comment_id, "get comment failed");
            return Err(ServiceError::Store(e));
        }
    };
    if comment.task_id != task_id {
        return Err(ServiceError::NotFound);
    }
    if !comment.is_authored_by(&requester.email) {
        warn!(%comment_id, requester = %requester.email, "refusing to delete another user's comment");
        return Err(ServiceError::Forbidden);
    }

    state.store.delete_comment(comment_id).await.map_err(|e| {
        error!(error = %e, %comment_id, "delete comment failed");
        ServiceError::Store(e)
    })?;

    info!(%comment_id, %task_id, "comment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::repo_types::{NewTask, Task};

    fn session(email: &str, name: Option<&str>) -> Session {
        Session {
            email: email.into(),
            name: name.map(Into::into),
        }
    }

    async fn task(state: &AppState, public: bool) -> Task {
        state
            .store
            .insert_task(NewTask {
                task: "Read the docs".into(),
                public,
                user: "a@x.com".into(),
            })
            .await
            .unwrap()
    }

    fn say(text: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            comment: text.into(),
        }
    }

    #[tokio::test]
    async fn comment_on_public_task_is_written_for_author() {
        let state = AppState::fake();
        let task = task(&state, true).await;
        let bea = session("b@y.com", Some("Bea"));

        let comment = add_comment(&state, &bea, task.id, say("Got it")).await.unwrap();
        assert_eq!(comment.user, "b@y.com");
        assert_eq!(comment.name, "Bea");
        assert_eq!(comment.task_id, task.id);
        assert_eq!(state.store.list_comments_by_task(task.id).await.unwrap(), vec![comment]);
    }

    #[tokio::test]
    async fn rejects_empty_text_missing_name_and_private_task() {
        let state = AppState::fake();
        let public = task(&state, true).await;
        let private = task(&state, false).await;

        let err = add_comment(&state, &session("b@y.com", Some("Bea")), public.id, say(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        let err = add_comment(&state, &session("b@y.com", None), public.id, say("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        let err = add_comment(&state, &session("b@y.com", Some("Bea")), private.id, say("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        assert!(state.store.list_comments_by_task(public.id).await.unwrap().is_empty());
        assert!(state.store.list_comments_by_task(private.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_author_deletes_and_repeat_is_noop() {
        let state = AppState::fake();
        let task = task(&state, true).await;
        let bea = session("b@y.com", Some("Bea"));
        let keep = add_comment(&state, &bea, task.id, say("keep")).await.unwrap();
        let gone = add_comment(&state, &bea, task.id, say("gone")).await.unwrap();

        let err = delete_comment(&state, &session("a@x.com", Some("Ana")), task.id, gone.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        delete_comment(&state, &bea, task.id, gone.id).await.unwrap();
        delete_comment(&state, &bea, task.id, gone.id).await.unwrap();
        assert_eq!(state.store.list_comments_by_task(task.id).await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn delete_scoped_to_task_in_path() {
        let state = AppState::fake();
        let task_a = task(&state, true).await;
        let task_b = task(&state, true).await;
        let bea = session("b@y.com", Some("Bea"));
        let comment = add_comment(&state, &bea, task_a.id, say("hi")).await.unwrap();

        let err = delete_comment(&state, &bea, task_b.id, comment.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }
}

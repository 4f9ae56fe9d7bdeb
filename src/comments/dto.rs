use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Comment;

/// Request body for `POST /task/:id/comments`.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(rename = "taskId")]
    pub task_id: Uuid,
    pub user: String,
    pub name: String,
    /// Whether the viewer may delete it, i.e. wrote it.
    pub can_delete: bool,
}

impl CommentView {
    pub fn new(c: Comment, viewer_email: Option<&str>) -> Self {
        let can_delete = viewer_email.is_some_and(|email| c.is_authored_by(email));
        Self {
            id: c.id,
            comment: c.comment,
            created: c.created,
            task_id: c.task_id,
            user: c.user,
            name: c.name,
            can_delete,
        }
    }
}

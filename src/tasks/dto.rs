use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::Task;
use crate::auth::dto::Session;
use crate::comments::dto::CommentView;

/// Request body for `POST /dashboard/tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub task: String,
    #[serde(default)]
    pub public: bool,
}

/// One row of the dashboard list.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub task: String,
    pub public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
}

impl TaskView {
    pub fn new(task: Task, share_url: impl FnOnce(Uuid) -> String) -> Self {
        let share_url = task.public.then(|| share_url(task.id));
        Self {
            id: task.id,
            task: task.task,
            public: task.public,
            created: task.created,
            user: task.user,
            share_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: Session,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub url: String,
}

/// The task as shown on its public page.
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub id: Uuid,
    pub task: String,
    pub created: String,
    pub user: String,
    pub public: bool,
}

impl From<Task> for TaskDetail {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            task: t.task,
            created: display_date(t.created),
            user: t.user,
            public: t.public,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub item: TaskDetail,
    pub comments: Vec<CommentView>,
    pub viewer: Option<Session>,
    pub can_comment: bool,
}

/// Calendar date in the pt-BR short form, e.g. `05/03/2025`.
pub fn display_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| at.date().to_string())
}

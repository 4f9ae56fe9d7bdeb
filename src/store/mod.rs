//! Document store seam. Handlers and services only ever see `Arc<dyn DocumentStore>`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::comments::repo_types::{Comment, NewComment};
use crate::tasks::repo_types::{NewTask, Task};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a task; the store assigns `id` and `created`.
    async fn insert_task(&self, new: NewTask) -> anyhow::Result<Task>;
    async fn get_task(&self, id: Uuid) -> anyhow::Result<Option<Task>>;
    /// All tasks of `owner`, newest first.
    async fn list_tasks_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Task>>;
    /// Deleting an unknown id is not an error.
    async fn delete_task(&self, id: Uuid) -> anyhow::Result<()>;

    async fn insert_comment(&self, new: NewComment) -> anyhow::Result<Comment>;
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    /// Comments referencing `task_id`, oldest first.
    async fn list_comments_by_task(&self, task_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<()>;
}

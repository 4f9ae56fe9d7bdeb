use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::DocumentStore;
use crate::comments::repo_types::{Comment, NewComment};
use crate::tasks::repo_types::{NewTask, Task};

/// In-process store. Keeps insertion order, which is the order comments are read back in.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<Task>>,
    comments: RwLock<Vec<Comment>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert/delete fail, to exercise write-failure paths.
    #[cfg(test)]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("memory store is rejecting writes");
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_task(&self, new: NewTask) -> anyhow::Result<Task> {
        self.check_writable()?;
        let task = Task {
            id: Uuid::new_v4(),
            task: new.task,
            public: new.public,
            created: OffsetDateTime::now_utc(),
            user: new.user,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Task>> {
        // Reverse first so equal timestamps still come out newest-inserted first.
        let mut rows: Vec<Task> = self
            .tasks
            .read()
            .await
            .iter()
            .rev()
            .filter(|t| t.user == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(rows)
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<()> {
        self.check_writable()?;
        self.tasks.write().await.retain(|t| t.id != id);
        Ok(())
    }

    async fn insert_comment(&self, new: NewComment) -> anyhow::Result<Comment> {
        self.check_writable()?;
        let comment = Comment {
            id: Uuid::new_v4(),
            comment: new.comment,
            created: OffsetDateTime::now_utc(),
            task_id: new.task_id,
            user: new.user,
            name: new.name,
        };
        self.comments.write().await.push(comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.comments.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments_by_task(&self, task_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<()> {
        self.check_writable()?;
        self.comments.write().await.retain(|c| c.id != id);
        Ok(())
    }
}

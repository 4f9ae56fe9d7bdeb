use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::DocumentStore;
use crate::comments::repo_types::{Comment, NewComment};
use crate::tasks::repo_types::{NewTask, Task};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert_task(&self, new: NewTask) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, task, public, user_email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task, public, created, user_email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.task)
        .bind(new.public)
        .bind(&new.user)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task, public, created, user_email
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get task")?;
        Ok(task)
    }

    async fn list_tasks_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task, public, created, user_email
            FROM tasks
            WHERE user_email = $1
            ORDER BY created DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list tasks by owner")?;
        Ok(rows)
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete task")?;
        Ok(())
    }

    async fn insert_comment(&self, new: NewComment) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, comment, task_id, user_email, name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, comment, created, task_id, user_email, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.comment)
        .bind(new.task_id)
        .bind(&new.user)
        .bind(&new.name)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, comment, created, task_id, user_email, name
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get comment")?;
        Ok(comment)
    }

    async fn list_comments_by_task(&self, task_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, comment, created, task_id, user_email, name
            FROM comments
            WHERE task_id = $1
            ORDER BY created ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.db)
        .await
        .context("list comments by task")?;
        Ok(rows)
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(())
    }
}

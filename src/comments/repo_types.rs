use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Comment document in the `comments` collection.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub comment: String,
    pub created: OffsetDateTime,
    pub task_id: Uuid,
    #[sqlx(rename = "user_email")]
    pub user: String, // author email
    pub name: String, // author display name
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub comment: String,
    pub task_id: Uuid,
    pub user: String,
    pub name: String,
}

impl Comment {
    pub fn is_authored_by(&self, email: &str) -> bool {
        self.user == email
    }
}

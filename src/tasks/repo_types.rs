use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Task document in the `tasks` collection.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub task: String,
    pub public: bool,
    pub created: OffsetDateTime,
    #[sqlx(rename = "user_email")]
    pub user: String, // owner email
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub task: String,
    pub public: bool,
    pub user: String,
}

impl Task {
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.user == email
    }
}

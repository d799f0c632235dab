use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user group. `kind` is the registry key of the configuration that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub created_at: NaiveDateTime,
}

impl Group {
    /// Create a new Group owned by `creator_id`
    pub fn new(kind: String, name: String, description: Option<String>, creator_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            description,
            creator_id,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }
}

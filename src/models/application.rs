use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A pending, user-initiated request to join a group.
///
/// At most one exists per (group, user); applying again refreshes `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserGroupApplication {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub created_at: NaiveDateTime,
}

impl UserGroupApplication {
    pub fn new(group_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invitation sent to an e-mail address; consumed when redeemed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EmailInvitation {
    pub id: Uuid,
    pub group_id: Uuid,
    pub issuer_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub created_at: NaiveDateTime,
}

impl EmailInvitation {
    pub fn new(group_id: Uuid, issuer_id: Uuid, email: String, secret_key: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            issuer_id,
            email,
            secret_key,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Invitation addressed by an admin to an existing user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserGroupInvitation {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub issuer_id: Uuid,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub created_at: NaiveDateTime,
}

impl UserGroupInvitation {
    pub fn new(group_id: Uuid, user_id: Uuid, issuer_id: Uuid, secret_key: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            issuer_id,
            secret_key,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

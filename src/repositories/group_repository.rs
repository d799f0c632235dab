use crate::models::{Group, MemberRole};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for group data access
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new GroupRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new group and its creator as the first admin, in one transaction
    pub async fn create(
        &self,
        kind: &str,
        name: &str,
        description: Option<&str>,
        creator_id: Uuid,
    ) -> SqlxResult<Group> {
        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO user_groups (kind, name, description, creator_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, kind, name, description, creator_id, created_at
            "#,
        )
        .bind(kind)
        .bind(name)
        .bind(description)
        .bind(creator_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(group.id)
        .bind(creator_id)
        .bind(MemberRole::Admin.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(group)
    }

    /// Find a group by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<Group>> {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT id, kind, name, description, creator_id, created_at
            FROM user_groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find all groups of one kind, newest first
    pub async fn find_by_kind(&self, kind: &str) -> SqlxResult<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT id, kind, name, description, creator_id, created_at
            FROM user_groups
            WHERE kind = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
    }

    /// Update the editable fields of a group
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> SqlxResult<Group> {
        sqlx::query_as::<_, Group>(
            r#"
            UPDATE user_groups
            SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, kind, name, description, creator_id, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
    }

    /// Delete a group (cascades to members, applications and invitations)
    pub async fn delete(&self, id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM user_groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

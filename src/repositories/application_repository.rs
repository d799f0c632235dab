use crate::models::{MemberRole, UserGroupApplication};
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for join applications
pub struct ApplicationRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct UpsertedApplication {
    id: Uuid,
    group_id: Uuid,
    user_id: Uuid,
    created_at: NaiveDateTime,
    inserted: bool,
}

impl ApplicationRepository {
    /// Create a new ApplicationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the application, or refresh `created_at` on the existing one.
    /// The flag is true when a new row was inserted.
    pub async fn upsert(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> SqlxResult<(UserGroupApplication, bool)> {
        // xmax is 0 only for a freshly inserted tuple
        let row = sqlx::query_as::<_, UpsertedApplication>(
            r#"
            INSERT INTO group_applications (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, user_id) DO UPDATE
            SET created_at = NOW() AT TIME ZONE 'utc'
            RETURNING id, group_id, user_id, created_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let application = UserGroupApplication {
            id: row.id,
            group_id: row.group_id,
            user_id: row.user_id,
            created_at: row.created_at,
        };
        Ok((application, row.inserted))
    }

    /// Find an application by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<UserGroupApplication>> {
        sqlx::query_as::<_, UserGroupApplication>(
            r#"
            SELECT id, group_id, user_id, created_at
            FROM group_applications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Pending applications for a group, oldest first
    pub async fn find_by_group(&self, group_id: Uuid) -> SqlxResult<Vec<UserGroupApplication>> {
        sqlx::query_as::<_, UserGroupApplication>(
            r#"
            SELECT id, group_id, user_id, created_at
            FROM group_applications
            WHERE group_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Add the applicant as a member and drop the application, in one transaction.
    /// Returns None if the application no longer exists.
    pub async fn approve(&self, id: Uuid) -> SqlxResult<Option<UserGroupApplication>> {
        let mut tx = self.pool.begin().await?;

        let application = sqlx::query_as::<_, UserGroupApplication>(
            r#"
            DELETE FROM group_applications
            WHERE id = $1
            RETURNING id, group_id, user_id, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(application) = application else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(application.group_id)
        .bind(application.user_id)
        .bind(MemberRole::Member.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(application))
    }

    /// Delete an application
    pub async fn delete(&self, id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM group_applications
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

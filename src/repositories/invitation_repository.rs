use crate::models::{EmailInvitation, MemberRole, UserGroupInvitation};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for e-mail and user invitations
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Create a new InvitationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new e-mail invitation
    pub async fn create_email(
        &self,
        group_id: Uuid,
        issuer_id: Uuid,
        email: &str,
        secret_key: &str,
    ) -> SqlxResult<EmailInvitation> {
        sqlx::query_as::<_, EmailInvitation>(
            r#"
            INSERT INTO email_invitations (group_id, issuer_id, email, secret_key)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, issuer_id, email, secret_key, created_at
            "#,
        )
        .bind(group_id)
        .bind(issuer_id)
        .bind(email)
        .bind(secret_key)
        .fetch_one(&self.pool)
        .await
    }

    /// All e-mail invitations of a group matching a secret key
    pub async fn find_email_by_key(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> SqlxResult<Vec<EmailInvitation>> {
        sqlx::query_as::<_, EmailInvitation>(
            r#"
            SELECT id, group_id, issuer_id, email, secret_key, created_at
            FROM email_invitations
            WHERE group_id = $1 AND secret_key = $2
            "#,
        )
        .bind(group_id)
        .bind(secret_key)
        .fetch_all(&self.pool)
        .await
    }

    /// Consume an e-mail invitation and grant membership, in one transaction.
    /// Returns false if the invitation was already consumed.
    pub async fn redeem_email(&self, id: Uuid, user_id: Uuid) -> SqlxResult<bool> {
        let mut tx = self.pool.begin().await?;

        let group_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            DELETE FROM email_invitations
            WHERE id = $1
            RETURNING group_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(group_id) = group_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        insert_member(&mut tx, group_id, user_id).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Delete every e-mail invitation of a group matching a secret key
    pub async fn delete_email_by_key(&self, group_id: Uuid, secret_key: &str) -> SqlxResult<u64> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM email_invitations
            WHERE group_id = $1 AND secret_key = $2
            "#,
        )
        .bind(group_id)
        .bind(secret_key)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    /// Insert a new invitation addressed to an existing user
    pub async fn create_user_invitation(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        issuer_id: Uuid,
        secret_key: &str,
    ) -> SqlxResult<UserGroupInvitation> {
        sqlx::query_as::<_, UserGroupInvitation>(
            r#"
            INSERT INTO user_invitations (group_id, user_id, issuer_id, secret_key)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, user_id, issuer_id, secret_key, created_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(issuer_id)
        .bind(secret_key)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a user invitation of a group by its secret key
    pub async fn find_user_invitation(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> SqlxResult<Option<UserGroupInvitation>> {
        sqlx::query_as::<_, UserGroupInvitation>(
            r#"
            SELECT id, group_id, user_id, issuer_id, secret_key, created_at
            FROM user_invitations
            WHERE group_id = $1 AND secret_key = $2
            "#,
        )
        .bind(group_id)
        .bind(secret_key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Consume a user invitation and make the invitee a member, in one transaction
    pub async fn accept_user_invitation(&self, id: Uuid) -> SqlxResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            DELETE FROM user_invitations
            WHERE id = $1
            RETURNING group_id, user_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((group_id, user_id)) = row else {
            tx.rollback().await?;
            return Ok(false);
        };

        insert_member(&mut tx, group_id, user_id).await?;

        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_member(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    group_id: Uuid,
    user_id: Uuid,
) -> SqlxResult<()> {
    sqlx::query(
        r#"
        INSERT INTO group_members (group_id, user_id, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .bind(MemberRole::Member.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

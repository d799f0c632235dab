use crate::models::{Member, MemberRole, User};
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for group member data access
pub struct GroupMemberRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct MemberRow {
    id: Uuid,
    username: String,
    email: String,
    date_joined: NaiveDateTime,
    role: String,
    joined_at: NaiveDateTime,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            user: User {
                id: row.id,
                username: row.username,
                email: row.email,
                date_joined: row.date_joined,
            },
            role: MemberRole::from(row.role),
            joined_at: row.joined_at,
        }
    }
}

impl GroupMemberRepository {
    /// Create a new GroupMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a plain member; an existing membership (admin or not) is left untouched.
    /// Returns true when a row was inserted.
    pub async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(MemberRole::Member.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Make a user admin, adding the membership if it does not exist yet
    pub async fn grant_admin(&self, group_id: Uuid, user_id: Uuid) -> SqlxResult<()> {
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, user_id) DO UPDATE
            SET role = EXCLUDED.role
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(MemberRole::Admin.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Downgrade an admin to a plain member. Returns false if the user was not an admin.
    pub async fn revoke_admin(&self, group_id: Uuid, user_id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE group_members
            SET role = $3
            WHERE group_id = $1 AND user_id = $2 AND role = $4
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(MemberRole::Member.as_str())
        .bind(MemberRole::Admin.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Remove a member from a group; admin rights go with the row
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Find all members of a group together with their user rows
    pub async fn find_by_group(&self, group_id: Uuid) -> SqlxResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT u.id, u.username, u.email, u.date_joined, m.role, m.joined_at
            FROM group_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.group_id = $1
            ORDER BY u.date_joined DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }

    /// Get the role of a member in a group
    pub async fn find_role(&self, group_id: Uuid, user_id: Uuid) -> SqlxResult<Option<MemberRole>> {
        let role: Option<String> = sqlx::query_scalar(
            r#"
            SELECT role
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role.and_then(|r| MemberRole::parse(&r).ok()))
    }

    /// Find the ids of all admins of a group
    pub async fn find_admin_ids(&self, group_id: Uuid) -> SqlxResult<Vec<Uuid>> {
        sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM group_members
            WHERE group_id = $1 AND role = $2
            ORDER BY joined_at ASC
            "#,
        )
        .bind(group_id)
        .bind(MemberRole::Admin.as_str())
        .fetch_all(&self.pool)
        .await
    }

    /// Remove the user unless they are the group's only admin, in one transaction.
    /// The group row is locked so concurrent leaves of the same group run one after another.
    /// Returns false, changing nothing, for the sole admin.
    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> SqlxResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM user_groups WHERE id = $1 FOR UPDATE")
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?;

        let admins: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM group_members
            WHERE group_id = $1 AND role = $2
            "#,
        )
        .bind(group_id)
        .bind(MemberRole::Admin.as_str())
        .fetch_all(&mut *tx)
        .await?;

        if admins == [user_id] {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

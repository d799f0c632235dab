//! Storage abstraction for the group services.
//!
//! `PgStore` backs production deployments through the sqlx repositories;
//! `MemoryStore` keeps everything in-process for development and tests.
//! Operations that touch two tables (creating a group with its first admin,
//! approving an application, redeeming an invitation) are single calls so
//! each backend can make them atomic.

use crate::error::RepositoryError;
use crate::models::{
    EmailInvitation, Group, Member, MemberRole, User, UserGroupApplication, UserGroupInvitation,
};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, RepositoryError>;

/// Fields accepted when creating or editing a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFields {
    pub name: String,
    pub description: Option<String>,
}

/// The storage trait the group services depend on.
#[async_trait]
pub trait GroupStore: Send + Sync {
    // ───────────────────────────── Users ─────────────────────────────

    async fn create_user(&self, username: &str, email: &str) -> StoreResult<User>;

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    // ───────────────────────────── Groups ────────────────────────────

    /// Create a group; the creator becomes its first admin member.
    async fn create_group(&self, kind: &str, fields: &GroupFields, creator_id: Uuid)
        -> StoreResult<Group>;

    async fn find_group(&self, group_id: Uuid) -> StoreResult<Option<Group>>;

    /// All groups of one kind, newest first.
    async fn list_groups(&self, kind: &str) -> StoreResult<Vec<Group>>;

    async fn update_group(&self, group_id: Uuid, fields: &GroupFields) -> StoreResult<Group>;

    /// Delete a group with its memberships, applications and invitations.
    async fn delete_group(&self, group_id: Uuid) -> StoreResult<bool>;

    // ───────────────────────────── Membership ────────────────────────

    async fn find_role(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<Option<MemberRole>>;

    async fn list_members(&self, group_id: Uuid) -> StoreResult<Vec<Member>>;

    async fn admin_ids(&self, group_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Add a plain member. Never downgrades an existing admin.
    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Give admin rights, adding the membership when missing.
    async fn grant_admin(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Take admin rights away; the user stays a member.
    async fn revoke_admin(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Remove membership and admin rights together.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Self-removal that never leaves a group without an admin. Returns false,
    /// changing nothing, when the user is the group's only admin.
    async fn leave_group(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // ───────────────────────────── Applications ──────────────────────

    async fn find_application(&self, application_id: Uuid)
        -> StoreResult<Option<UserGroupApplication>>;

    async fn list_applications(&self, group_id: Uuid) -> StoreResult<Vec<UserGroupApplication>>;

    /// Create the (group, user) application or refresh its timestamp.
    /// The flag is true when a new application was created.
    async fn upsert_application(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<(UserGroupApplication, bool)>;

    /// Grant membership to the applicant and delete the application.
    async fn approve_application(&self, application_id: Uuid)
        -> StoreResult<Option<UserGroupApplication>>;

    async fn delete_application(&self, application_id: Uuid) -> StoreResult<bool>;

    // ───────────────────────────── Invitations ───────────────────────

    async fn create_email_invitation(
        &self,
        group_id: Uuid,
        issuer_id: Uuid,
        email: &str,
        secret_key: &str,
    ) -> StoreResult<EmailInvitation>;

    async fn find_email_invitations(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<Vec<EmailInvitation>>;

    /// Delete the invitation and grant membership to `user_id`.
    async fn redeem_email_invitation(&self, invitation_id: Uuid, user_id: Uuid)
        -> StoreResult<bool>;

    async fn delete_email_invitations(&self, group_id: Uuid, secret_key: &str)
        -> StoreResult<u64>;

    async fn create_user_invitation(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        issuer_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<UserGroupInvitation>;

    async fn find_user_invitation(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<Option<UserGroupInvitation>>;

    /// Delete the invitation and make its addressee a member.
    async fn accept_user_invitation(&self, invitation_id: Uuid) -> StoreResult<bool>;
}

use super::{GroupFields, GroupStore, StoreResult};
use crate::models::{
    EmailInvitation, Group, Member, MemberRole, User, UserGroupApplication, UserGroupInvitation,
};
use crate::repositories::*;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Postgres-backed store composed from the table repositories
#[derive(Clone)]
pub struct PgStore {
    pub user_repo: Arc<UserRepository>,
    pub group_repo: Arc<GroupRepository>,
    pub member_repo: Arc<GroupMemberRepository>,
    pub application_repo: Arc<ApplicationRepository>,
    pub invitation_repo: Arc<InvitationRepository>,
}

impl PgStore {
    /// Create a new PgStore with initialized repositories
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            group_repo: Arc::new(GroupRepository::new(pool.clone())),
            member_repo: Arc::new(GroupMemberRepository::new(pool.clone())),
            application_repo: Arc::new(ApplicationRepository::new(pool.clone())),
            invitation_repo: Arc::new(InvitationRepository::new(pool)),
        }
    }
}

#[async_trait]
impl GroupStore for PgStore {
    async fn create_user(&self, username: &str, email: &str) -> StoreResult<User> {
        Ok(self.user_repo.create(username, email).await?)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.user_repo.find_by_id(user_id).await?)
    }

    async fn create_group(
        &self,
        kind: &str,
        fields: &GroupFields,
        creator_id: Uuid,
    ) -> StoreResult<Group> {
        Ok(self
            .group_repo
            .create(kind, &fields.name, fields.description.as_deref(), creator_id)
            .await?)
    }

    async fn find_group(&self, group_id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.group_repo.find_by_id(group_id).await?)
    }

    async fn list_groups(&self, kind: &str) -> StoreResult<Vec<Group>> {
        Ok(self.group_repo.find_by_kind(kind).await?)
    }

    async fn update_group(&self, group_id: Uuid, fields: &GroupFields) -> StoreResult<Group> {
        Ok(self
            .group_repo
            .update(group_id, &fields.name, fields.description.as_deref())
            .await?)
    }

    async fn delete_group(&self, group_id: Uuid) -> StoreResult<bool> {
        Ok(self.group_repo.delete(group_id).await?)
    }

    async fn find_role(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<Option<MemberRole>> {
        Ok(self.member_repo.find_role(group_id, user_id).await?)
    }

    async fn list_members(&self, group_id: Uuid) -> StoreResult<Vec<Member>> {
        Ok(self.member_repo.find_by_group(group_id).await?)
    }

    async fn admin_ids(&self, group_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self.member_repo.find_admin_ids(group_id).await?)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.member_repo.add_member(group_id, user_id).await?)
    }

    async fn grant_admin(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        Ok(self.member_repo.grant_admin(group_id, user_id).await?)
    }

    async fn revoke_admin(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.member_repo.revoke_admin(group_id, user_id).await?)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.member_repo.remove_member(group_id, user_id).await?)
    }

    async fn leave_group(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.member_repo.leave(group_id, user_id).await?)
    }

    async fn find_application(
        &self,
        application_id: Uuid,
    ) -> StoreResult<Option<UserGroupApplication>> {
        Ok(self.application_repo.find_by_id(application_id).await?)
    }

    async fn list_applications(&self, group_id: Uuid) -> StoreResult<Vec<UserGroupApplication>> {
        Ok(self.application_repo.find_by_group(group_id).await?)
    }

    async fn upsert_application(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<(UserGroupApplication, bool)> {
        Ok(self.application_repo.upsert(group_id, user_id).await?)
    }

    async fn approve_application(
        &self,
        application_id: Uuid,
    ) -> StoreResult<Option<UserGroupApplication>> {
        Ok(self.application_repo.approve(application_id).await?)
    }

    async fn delete_application(&self, application_id: Uuid) -> StoreResult<bool> {
        Ok(self.application_repo.delete(application_id).await?)
    }

    async fn create_email_invitation(
        &self,
        group_id: Uuid,
        issuer_id: Uuid,
        email: &str,
        secret_key: &str,
    ) -> StoreResult<EmailInvitation> {
        Ok(self
            .invitation_repo
            .create_email(group_id, issuer_id, email, secret_key)
            .await?)
    }

    async fn find_email_invitations(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<Vec<EmailInvitation>> {
        Ok(self.invitation_repo.find_email_by_key(group_id, secret_key).await?)
    }

    async fn redeem_email_invitation(
        &self,
        invitation_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<bool> {
        Ok(self.invitation_repo.redeem_email(invitation_id, user_id).await?)
    }

    async fn delete_email_invitations(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<u64> {
        Ok(self.invitation_repo.delete_email_by_key(group_id, secret_key).await?)
    }

    async fn create_user_invitation(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        issuer_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<UserGroupInvitation> {
        Ok(self
            .invitation_repo
            .create_user_invitation(group_id, user_id, issuer_id, secret_key)
            .await?)
    }

    async fn find_user_invitation(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<Option<UserGroupInvitation>> {
        Ok(self.invitation_repo.find_user_invitation(group_id, secret_key).await?)
    }

    async fn accept_user_invitation(&self, invitation_id: Uuid) -> StoreResult<bool> {
        Ok(self.invitation_repo.accept_user_invitation(invitation_id).await?)
    }
}

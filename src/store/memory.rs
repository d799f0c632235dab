use super::{GroupFields, GroupStore, StoreResult};
use crate::error::RepositoryError;
use crate::models::{
    EmailInvitation, Group, GroupMember, Member, MemberRole, User, UserGroupApplication,
    UserGroupInvitation,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    members: HashMap<(Uuid, Uuid), GroupMember>,
    applications: HashMap<Uuid, UserGroupApplication>,
    email_invitations: Vec<EmailInvitation>,
    user_invitations: HashMap<Uuid, UserGroupInvitation>,
}

impl Tables {
    fn ensure_refs(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        if !self.groups.contains_key(&group_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "group {} does not exist",
                group_id
            )));
        }
        if !self.users.contains_key(&user_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "user {} does not exist",
                user_id
            )));
        }
        Ok(())
    }

    fn insert_member(&mut self, group_id: Uuid, user_id: Uuid, role: MemberRole) -> bool {
        if self.members.contains_key(&(group_id, user_id)) {
            return false;
        }
        self.members
            .insert((group_id, user_id), GroupMember::new(group_id, user_id, role));
        true
    }
}

/// In-process store.
///
/// Everything lives behind one lock, so every trait call is atomic. Secret
/// keys are not required to be unique here.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn create_user(&self, username: &str, email: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(RepositoryError::Duplicate(format!("username {}", username)));
        }
        let user = User::new(username.to_string(), email.to_string());
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn create_group(
        &self,
        kind: &str,
        fields: &GroupFields,
        creator_id: Uuid,
    ) -> StoreResult<Group> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&creator_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "user {} does not exist",
                creator_id
            )));
        }
        let group = Group::new(
            kind.to_string(),
            fields.name.clone(),
            fields.description.clone(),
            creator_id,
        );
        tables.groups.insert(group.id, group.clone());
        tables.insert_member(group.id, creator_id, MemberRole::Admin);
        Ok(group)
    }

    async fn find_group(&self, group_id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&group_id).cloned())
    }

    async fn list_groups(&self, kind: &str) -> StoreResult<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| g.kind == kind)
            .cloned()
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(groups)
    }

    async fn update_group(&self, group_id: Uuid, fields: &GroupFields) -> StoreResult<Group> {
        let mut tables = self.tables.write().await;
        let group = tables
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("group {}", group_id)))?;
        group.name = fields.name.clone();
        group.description = fields.description.clone();
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&group_id).is_none() {
            return Ok(false);
        }
        tables.members.retain(|(g, _), _| *g != group_id);
        tables.applications.retain(|_, a| a.group_id != group_id);
        tables.email_invitations.retain(|i| i.group_id != group_id);
        tables.user_invitations.retain(|_, i| i.group_id != group_id);
        Ok(true)
    }

    async fn find_role(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<Option<MemberRole>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .get(&(group_id, user_id))
            .map(GroupMember::role_enum))
    }

    async fn list_members(&self, group_id: Uuid) -> StoreResult<Vec<Member>> {
        let tables = self.tables.read().await;
        let mut members: Vec<Member> = tables
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .filter_map(|m| {
                tables.users.get(&m.user_id).map(|user| Member {
                    user: user.clone(),
                    role: m.role_enum(),
                    joined_at: m.joined_at,
                })
            })
            .collect();
        members.sort_by(|a, b| b.user.date_joined.cmp(&a.user.date_joined));
        Ok(members)
    }

    async fn admin_ids(&self, group_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        let mut admins: Vec<&GroupMember> = tables
            .members
            .values()
            .filter(|m| m.group_id == group_id && m.is_admin())
            .collect();
        admins.sort_by_key(|m| m.joined_at);
        Ok(admins.into_iter().map(|m| m.user_id).collect())
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        tables.ensure_refs(group_id, user_id)?;
        Ok(tables.insert_member(group_id, user_id, MemberRole::Member))
    }

    async fn grant_admin(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.ensure_refs(group_id, user_id)?;
        tables
            .members
            .entry((group_id, user_id))
            .and_modify(|m| m.role = MemberRole::Admin.as_str().to_string())
            .or_insert_with(|| GroupMember::new(group_id, user_id, MemberRole::Admin));
        Ok(())
    }

    async fn revoke_admin(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.members.get_mut(&(group_id, user_id)) {
            Some(member) if member.is_admin() => {
                member.role = MemberRole::Member.as_str().to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.members.remove(&(group_id, user_id)).is_some())
    }

    async fn leave_group(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let mut admins = tables
            .members
            .values()
            .filter(|m| m.group_id == group_id && m.is_admin());
        let sole_admin = matches!(
            (admins.next(), admins.next()),
            (Some(only), None) if only.user_id == user_id
        );
        if sole_admin {
            return Ok(false);
        }
        tables.members.remove(&(group_id, user_id));
        Ok(true)
    }

    async fn find_application(
        &self,
        application_id: Uuid,
    ) -> StoreResult<Option<UserGroupApplication>> {
        Ok(self
            .tables
            .read()
            .await
            .applications
            .get(&application_id)
            .cloned())
    }

    async fn list_applications(&self, group_id: Uuid) -> StoreResult<Vec<UserGroupApplication>> {
        let tables = self.tables.read().await;
        let mut applications: Vec<UserGroupApplication> = tables
            .applications
            .values()
            .filter(|a| a.group_id == group_id)
            .cloned()
            .collect();
        applications.sort_by_key(|a| a.created_at);
        Ok(applications)
    }

    async fn upsert_application(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<(UserGroupApplication, bool)> {
        let mut tables = self.tables.write().await;
        tables.ensure_refs(group_id, user_id)?;

        if let Some(existing) = tables
            .applications
            .values_mut()
            .find(|a| a.group_id == group_id && a.user_id == user_id)
        {
            existing.created_at = chrono::Utc::now().naive_utc();
            return Ok((existing.clone(), false));
        }

        let application = UserGroupApplication::new(group_id, user_id);
        tables.applications.insert(application.id, application.clone());
        Ok((application, true))
    }

    async fn approve_application(
        &self,
        application_id: Uuid,
    ) -> StoreResult<Option<UserGroupApplication>> {
        let mut tables = self.tables.write().await;
        let Some(application) = tables.applications.remove(&application_id) else {
            return Ok(None);
        };
        tables.insert_member(application.group_id, application.user_id, MemberRole::Member);
        Ok(Some(application))
    }

    async fn delete_application(&self, application_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.applications.remove(&application_id).is_some())
    }

    async fn create_email_invitation(
        &self,
        group_id: Uuid,
        issuer_id: Uuid,
        email: &str,
        secret_key: &str,
    ) -> StoreResult<EmailInvitation> {
        let mut tables = self.tables.write().await;
        tables.ensure_refs(group_id, issuer_id)?;
        let invitation = EmailInvitation::new(
            group_id,
            issuer_id,
            email.to_string(),
            secret_key.to_string(),
        );
        tables.email_invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn find_email_invitations(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<Vec<EmailInvitation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .email_invitations
            .iter()
            .filter(|i| i.group_id == group_id && i.secret_key == secret_key)
            .cloned()
            .collect())
    }

    async fn redeem_email_invitation(
        &self,
        invitation_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .email_invitations
            .iter()
            .position(|i| i.id == invitation_id)
        else {
            return Ok(false);
        };
        let group_id = tables.email_invitations[index].group_id;
        tables.ensure_refs(group_id, user_id)?;
        tables.email_invitations.remove(index);
        tables.insert_member(group_id, user_id, MemberRole::Member);
        Ok(true)
    }

    async fn delete_email_invitations(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.email_invitations.len();
        tables
            .email_invitations
            .retain(|i| !(i.group_id == group_id && i.secret_key == secret_key));
        Ok((before - tables.email_invitations.len()) as u64)
    }

    async fn create_user_invitation(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        issuer_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<UserGroupInvitation> {
        let mut tables = self.tables.write().await;
        tables.ensure_refs(group_id, user_id)?;
        tables.ensure_refs(group_id, issuer_id)?;
        let invitation =
            UserGroupInvitation::new(group_id, user_id, issuer_id, secret_key.to_string());
        tables.user_invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn find_user_invitation(
        &self,
        group_id: Uuid,
        secret_key: &str,
    ) -> StoreResult<Option<UserGroupInvitation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_invitations
            .values()
            .find(|i| i.group_id == group_id && i.secret_key == secret_key)
            .cloned())
    }

    async fn accept_user_invitation(&self, invitation_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(invitation) = tables.user_invitations.remove(&invitation_id) else {
            return Ok(false);
        };
        tables.insert_member(invitation.group_id, invitation.user_id, MemberRole::Member);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, User, Group) {
        let store = MemoryStore::new();
        let owner = store.create_user("owner", "owner@example.com").await.unwrap();
        let fields = GroupFields {
            name: "Readers".to_string(),
            description: None,
        };
        let group = store.create_group("groups", &fields, owner.id).await.unwrap();
        (store, owner, group)
    }

    #[tokio::test]
    async fn test_creator_is_first_admin() {
        let (store, owner, group) = seeded().await;
        assert_eq!(
            store.find_role(group.id, owner.id).await.unwrap(),
            Some(MemberRole::Admin)
        );
        assert_eq!(store.admin_ids(group.id).await.unwrap(), vec![owner.id]);
    }

    #[tokio::test]
    async fn test_add_member_keeps_admin_role() {
        let (store, owner, group) = seeded().await;
        assert!(!store.add_member(group.id, owner.id).await.unwrap());
        assert_eq!(
            store.find_role(group.id, owner.id).await.unwrap(),
            Some(MemberRole::Admin)
        );
    }

    #[tokio::test]
    async fn test_leave_refuses_sole_admin() {
        let (store, owner, group) = seeded().await;
        let reader = store.create_user("reader", "reader@example.com").await.unwrap();
        store.add_member(group.id, reader.id).await.unwrap();

        assert!(!store.leave_group(group.id, owner.id).await.unwrap());
        assert!(store.find_role(group.id, owner.id).await.unwrap().is_some());

        assert!(store.leave_group(group.id, reader.id).await.unwrap());
        assert!(store.find_role(group.id, reader.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_member_rejects_unknown_user() {
        let (store, _, group) = seeded().await;
        let err = store.add_member(group.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (store, _, _) = seeded().await;
        let err = store.create_user("owner", "other@example.com").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_delete_group_cascades() {
        let (store, owner, group) = seeded().await;
        let reader = store.create_user("reader", "reader@example.com").await.unwrap();
        store.upsert_application(group.id, reader.id).await.unwrap();
        store
            .create_email_invitation(group.id, owner.id, "x@example.com", "k")
            .await
            .unwrap();

        assert!(store.delete_group(group.id).await.unwrap());
        assert!(store.list_members(group.id).await.unwrap().is_empty());
        assert!(store.list_applications(group.id).await.unwrap().is_empty());
        assert!(store.find_email_invitations(group.id, "k").await.unwrap().is_empty());
        assert!(!store.delete_group(group.id).await.unwrap());
    }
}

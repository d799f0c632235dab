//! Per-kind group configuration and the registry that holds them.
//!
//! A host registers one `GroupConfiguration` per group kind at startup. The
//! configuration carries the template names, list ordering and the
//! `GroupPolicy` that decides who may administer a group and what a valid
//! group form is.

use crate::forms::{FormErrors, GroupForm};
use crate::models::{Group, Member, MemberRole};
use crate::store::GroupFields;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("configuration already registered for key '{0}'")]
    AlreadyRegistered(String),

    #[error("no configuration registered for key '{0}'")]
    NotRegistered(String),
}

/// Hooks a host overrides to customise a group kind
pub trait GroupPolicy: Send + Sync {
    /// The creator always has admin rights, even after their admin role was revoked.
    fn has_permission(&self, actor: Uuid, group: &Group, role: Option<MemberRole>) -> bool {
        group.is_creator(actor) || role == Some(MemberRole::Admin)
    }

    fn validate_group_form(&self, form: &GroupForm) -> Result<GroupFields, FormErrors> {
        form.validate()
    }
}

/// Creator-or-admin permissions and the built-in form rules
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPolicy;

impl GroupPolicy for DefaultPolicy {}

/// Order of the group list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    Name,
}

impl GroupOrder {
    pub fn sort(&self, groups: &mut [Group]) {
        match self {
            GroupOrder::NewestFirst => groups.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            GroupOrder::OldestFirst => groups.sort_by_key(|g| g.created_at),
            GroupOrder::Name => groups.sort_by_key(|g| g.name.to_lowercase()),
        }
    }
}

/// Order of the member list on the detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberOrder {
    /// Most recently registered users first
    #[default]
    NewestUserFirst,
    /// Most recent members of this group first
    RecentlyJoinedFirst,
    Username,
}

impl MemberOrder {
    pub fn sort(&self, members: &mut [Member]) {
        match self {
            MemberOrder::NewestUserFirst => {
                members.sort_by(|a, b| b.user.date_joined.cmp(&a.user.date_joined))
            }
            MemberOrder::RecentlyJoinedFirst => {
                members.sort_by(|a, b| b.joined_at.cmp(&a.joined_at))
            }
            MemberOrder::Username => members.sort_by_key(|m| m.user.username.to_lowercase()),
        }
    }
}

/// Template names used by the views of one group kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub list: String,
    pub detail: String,
    pub create_group: String,
    pub edit_group: String,
    pub confirm_action: String,
    pub application: String,
    pub applications: String,
    pub create_email_invitation: String,
    pub invalid_invitation: String,
    pub group_joined: String,
    pub invitation_sent: String,
    pub invitation: String,
    pub delete_done: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            list: "usergroups/group_list.html".to_string(),
            detail: "usergroups/group_detail.html".to_string(),
            create_group: "usergroups/group_form.html".to_string(),
            edit_group: "usergroups/group_form.html".to_string(),
            confirm_action: "usergroups/confirm_action.html".to_string(),
            application: "usergroups/application.html".to_string(),
            applications: "usergroups/application_list.html".to_string(),
            create_email_invitation: "usergroups/create_email_invitation.html".to_string(),
            invalid_invitation: "usergroups/invalid_invitation.html".to_string(),
            group_joined: "usergroups/group_joined.html".to_string(),
            invitation_sent: "usergroups/invitation_sent.html".to_string(),
            invitation: "usergroups/invitation.html".to_string(),
            delete_done: "usergroups/group_deleted.html".to_string(),
        }
    }
}

/// Everything the views need to serve one group kind
#[derive(Clone)]
pub struct GroupConfiguration {
    pub slug: String,
    pub templates: Templates,
    pub order_groups_by: GroupOrder,
    pub order_members_by: MemberOrder,
    pub send_notifications: bool,
    pub policy: Arc<dyn GroupPolicy>,
}

impl GroupConfiguration {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            templates: Templates::default(),
            order_groups_by: GroupOrder::default(),
            order_members_by: MemberOrder::default(),
            send_notifications: false,
            policy: Arc::new(DefaultPolicy),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn GroupPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.send_notifications = enabled;
        self
    }

    pub fn with_group_order(mut self, order: GroupOrder) -> Self {
        self.order_groups_by = order;
        self
    }

    pub fn with_member_order(mut self, order: MemberOrder) -> Self {
        self.order_members_by = order;
        self
    }

    pub fn has_permission(&self, actor: Uuid, group: &Group, role: Option<MemberRole>) -> bool {
        self.policy.has_permission(actor, group, role)
    }
}

impl fmt::Debug for GroupConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupConfiguration")
            .field("slug", &self.slug)
            .field("templates", &self.templates)
            .field("order_groups_by", &self.order_groups_by)
            .field("order_members_by", &self.order_members_by)
            .field("send_notifications", &self.send_notifications)
            .finish_non_exhaustive()
    }
}

/// Registry of group configurations, keyed by slug; built once at startup
#[derive(Debug, Default, Clone)]
pub struct GroupRegistry {
    configurations: Vec<Arc<GroupConfiguration>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration under its slug. A slug can only be registered once.
    pub fn register(
        &mut self,
        configuration: GroupConfiguration,
    ) -> Result<Arc<GroupConfiguration>, RegistryError> {
        if self.configurations.iter().any(|c| c.slug == configuration.slug) {
            return Err(RegistryError::AlreadyRegistered(configuration.slug));
        }
        let configuration = Arc::new(configuration);
        self.configurations.push(configuration.clone());
        Ok(configuration)
    }

    pub fn get(&self, key: &str) -> Result<Arc<GroupConfiguration>, RegistryError> {
        self.configurations
            .iter()
            .find(|c| c.slug == key)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(key.to_string()))
    }

    /// Registered slugs in registration order
    pub fn keys(&self) -> Vec<&str> {
        self.configurations.iter().map(|c| c.slug.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MembersMayEdit;

    impl GroupPolicy for MembersMayEdit {
        fn has_permission(&self, _actor: Uuid, _group: &Group, role: Option<MemberRole>) -> bool {
            role.is_some()
        }
    }

    fn group(creator_id: Uuid) -> Group {
        Group::new("groups".into(), "Readers".into(), None, creator_id)
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = GroupRegistry::new();
        registry.register(GroupConfiguration::new("groups")).unwrap();
        registry.register(GroupConfiguration::new("teams")).unwrap();

        assert_eq!(registry.get("teams").unwrap().slug, "teams");
        assert_eq!(registry.keys(), vec!["groups", "teams"]);
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = GroupRegistry::new();
        registry.register(GroupConfiguration::new("groups")).unwrap();
        let err = registry.register(GroupConfiguration::new("groups")).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered("groups".to_string()));
    }

    #[test]
    fn test_get_unknown_fails() {
        let registry = GroupRegistry::new();
        assert_eq!(
            registry.get("clubs").unwrap_err(),
            RegistryError::NotRegistered("clubs".to_string())
        );
    }

    #[test]
    fn test_default_policy_creator_or_admin() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let config = GroupConfiguration::new("groups");
        let g = group(creator);

        assert!(config.has_permission(creator, &g, None));
        assert!(config.has_permission(other, &g, Some(MemberRole::Admin)));
        assert!(!config.has_permission(other, &g, Some(MemberRole::Member)));
        assert!(!config.has_permission(other, &g, None));
    }

    #[test]
    fn test_custom_policy() {
        let config = GroupConfiguration::new("clubs").with_policy(Arc::new(MembersMayEdit));
        let g = group(Uuid::new_v4());
        assert!(config.has_permission(Uuid::new_v4(), &g, Some(MemberRole::Member)));
    }

    #[test]
    fn test_group_order_by_name() {
        let creator = Uuid::new_v4();
        let mut groups = vec![
            Group::new("groups".into(), "zeta".into(), None, creator),
            Group::new("groups".into(), "Alpha".into(), None, creator),
        ];
        GroupOrder::Name.sort(&mut groups);
        assert_eq!(groups[0].name, "Alpha");
    }
}

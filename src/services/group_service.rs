use crate::auth;
use crate::error::{option_to_result, AppError, AppResult};
use crate::forms::{EmailInvitationForm, FormErrors, GroupForm};
use crate::models::{
    EmailInvitation, Group, Member, MemberRole, User, UserGroupApplication, UserGroupInvitation,
};
use crate::options::GroupConfiguration;
use crate::routes::Route;
use crate::services::notifier::{Notification, Notifier};
use crate::store::GroupStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a view that accepts form data
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome<T> {
    Saved(T),
    Invalid(FormErrors),
}

/// What happened when a user asked to leave a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    /// The user is the only admin; the group has to be deleted instead
    MustDeleteGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub already_member: bool,
    /// Pending application, `None` when the user already was a member
    pub application: Option<UserGroupApplication>,
    /// False when an existing application was refreshed
    pub created: bool,
}

/// What happened to an invitation key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Joined,
    Invalid,
    /// Several invitations shared the key; all were deleted and nobody joined
    Reconciled,
}

/// Group page data as seen by one viewer
#[derive(Debug, Clone, Serialize)]
pub struct GroupDetail {
    pub group: Group,
    pub members: Vec<Member>,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_member: bool,
}

/// Membership, admin and invitation rules for one group kind
#[derive(Clone)]
pub struct GroupService {
    config: Arc<GroupConfiguration>,
    store: Arc<dyn GroupStore>,
    notifier: Arc<dyn Notifier>,
}

impl GroupService {
    pub fn new(
        config: Arc<GroupConfiguration>,
        store: Arc<dyn GroupStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &GroupConfiguration {
        &self.config
    }

    // ───────────────────────────── Lookups ───────────────────────────

    /// Fetch a group of this kind
    pub async fn group(&self, group_id: Uuid) -> AppResult<Group> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .filter(|g| g.kind == self.config.slug);
        option_to_result(group, &format!("Group {} not found", group_id))
    }

    pub async fn user(&self, user_id: Uuid) -> AppResult<User> {
        let user = self.store.find_user(user_id).await?;
        option_to_result(user, &format!("User {} not found", user_id))
    }

    /// Fetch an application that belongs to `group`
    pub async fn application(
        &self,
        group: &Group,
        application_id: Uuid,
    ) -> AppResult<UserGroupApplication> {
        self.store
            .find_application(application_id)
            .await?
            .filter(|a| a.group_id == group.id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Application {} not found", application_id))
            })
    }

    pub async fn role_of(&self, group: &Group, user_id: Uuid) -> AppResult<Option<MemberRole>> {
        Ok(self.store.find_role(group.id, user_id).await?)
    }

    pub async fn has_permission(&self, actor: Uuid, group: &Group) -> AppResult<bool> {
        let role = self.role_of(group, actor).await?;
        Ok(self.config.has_permission(actor, group, role))
    }

    /// Fail with `PermissionDenied` unless `actor` may administer `group`
    pub async fn require_permission(&self, actor: Uuid, group: &Group) -> AppResult<()> {
        if self.has_permission(actor, group).await? {
            return Ok(());
        }
        warn!(actor = %actor, group = %group.id, "Permission denied");
        Err(AppError::PermissionDenied(
            "Only the creator or an admin can do this".to_string(),
        ))
    }

    // ───────────────────────────── Display ───────────────────────────

    pub async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let mut groups = self.store.list_groups(&self.config.slug).await?;
        self.config.order_groups_by.sort(&mut groups);
        Ok(groups)
    }

    pub async fn group_detail(&self, viewer: Option<Uuid>, group_id: Uuid) -> AppResult<GroupDetail> {
        let group = self.group(group_id).await?;
        let mut members = self.store.list_members(group.id).await?;
        self.config.order_members_by.sort(&mut members);

        let (is_admin, is_owner, is_member) = match viewer {
            Some(viewer) => {
                let role = members.iter().find(|m| m.user.id == viewer).map(|m| m.role);
                let is_admin = self.config.has_permission(viewer, &group, role);
                (is_admin, group.is_creator(viewer), is_admin || role.is_some())
            }
            None => (false, false, false),
        };

        Ok(GroupDetail {
            group,
            members,
            is_admin,
            is_owner,
            is_member,
        })
    }

    // ───────────────────────────── Create, edit, delete ──────────────

    /// Create a group; the actor becomes its creator and first admin
    pub async fn create_group(&self, actor: Uuid, form: &GroupForm) -> AppResult<FormOutcome<Group>> {
        let fields = match self.config.policy.validate_group_form(form) {
            Ok(fields) => fields,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let group = self
            .store
            .create_group(&self.config.slug, &fields, actor)
            .await?;

        info!("Created group {} ({}) for {}", group.name, group.id, actor);
        Ok(FormOutcome::Saved(group))
    }

    pub async fn edit_group(
        &self,
        actor: Uuid,
        group_id: Uuid,
        form: &GroupForm,
    ) -> AppResult<FormOutcome<Group>> {
        let group = self.group(group_id).await?;
        self.require_permission(actor, &group).await?;

        let fields = match self.config.policy.validate_group_form(form) {
            Ok(fields) => fields,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let group = self.store.update_group(group.id, &fields).await?;
        info!("Updated group {}", group.id);
        Ok(FormOutcome::Saved(group))
    }

    /// Delete a group; returns the deleted row
    pub async fn delete_group(&self, actor: Uuid, group_id: Uuid) -> AppResult<Group> {
        let group = self.group(group_id).await?;
        self.require_permission(actor, &group).await?;

        self.store.delete_group(group.id).await?;
        info!("Deleted group {} ({})", group.name, group.id);
        Ok(group)
    }

    // ───────────────────────────── Members and admins ────────────────

    /// Make `user_id` an admin (and a member if needed)
    pub async fn add_admin(&self, actor: Uuid, group_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let group = self.group(group_id).await?;
        let user = self.user(user_id).await?;
        self.require_permission(actor, &group).await?;

        self.store.grant_admin(group.id, user.id).await?;
        info!("User {} is now admin of group {}", user.id, group.id);
        Ok(())
    }

    /// Remove admin rights; membership is kept
    pub async fn revoke_admin(&self, actor: Uuid, group_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let group = self.group(group_id).await?;
        let user = self.user(user_id).await?;
        self.require_permission(actor, &group).await?;

        if self.store.revoke_admin(group.id, user.id).await? {
            info!("Revoked admin rights of {} in group {}", user.id, group.id);
        }
        Ok(())
    }

    /// Remove another user from the group, admin rights included.
    /// Removing oneself goes through `leave_group`.
    pub async fn remove_member(&self, actor: Uuid, group_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let group = self.group(group_id).await?;
        let user = self.user(user_id).await?;
        self.require_permission(actor, &group).await?;

        if actor == user.id {
            return Err(AppError::BusinessLogic(
                "Use leave_group to leave a group".to_string(),
            ));
        }

        if self.store.remove_member(group.id, user.id).await? {
            info!("Removed member {} from group {}", user.id, group.id);
        }
        Ok(())
    }

    /// Leave a group. The sole admin cannot leave; the group must be deleted instead.
    pub async fn leave_group(&self, user_id: Uuid, group_id: Uuid) -> AppResult<LeaveOutcome> {
        let group = self.group(group_id).await?;

        if !self.store.leave_group(group.id, user_id).await? {
            info!("Sole admin {} tried to leave group {}", user_id, group.id);
            return Ok(LeaveOutcome::MustDeleteGroup);
        }

        info!("User {} left group {}", user_id, group.id);
        Ok(LeaveOutcome::Left)
    }

    // ───────────────────────────── Applications ──────────────────────

    /// Apply to join. Applying again refreshes the pending application.
    pub async fn apply_to_join(&self, user_id: Uuid, group_id: Uuid) -> AppResult<ApplyOutcome> {
        let group = self.group(group_id).await?;

        if self.role_of(&group, user_id).await?.is_some() {
            return Ok(ApplyOutcome {
                already_member: true,
                application: None,
                created: false,
            });
        }

        let (application, created) = self.store.upsert_application(group.id, user_id).await?;

        if created {
            info!("User {} applied to join group {}", user_id, group.id);
            if self.config.send_notifications {
                let recipients = self.store.admin_ids(group.id).await?;
                self.notifier
                    .send(Notification::ApplicationSubmitted {
                        recipients,
                        group_id: group.id,
                        group_name: group.name.clone(),
                        application_id: application.id,
                        applicant_id: user_id,
                    })
                    .await;
            }
        } else {
            info!("User {} refreshed application to group {}", user_id, group.id);
        }

        Ok(ApplyOutcome {
            already_member: false,
            application: Some(application),
            created,
        })
    }

    /// Pending applications, admins only
    pub async fn list_applications(
        &self,
        actor: Uuid,
        group_id: Uuid,
    ) -> AppResult<(Group, Vec<UserGroupApplication>)> {
        let group = self.group(group_id).await?;
        self.require_permission(actor, &group).await?;
        let applications = self.store.list_applications(group.id).await?;
        Ok((group, applications))
    }

    /// Accept an application: the applicant joins and the application is removed
    pub async fn approve_application(
        &self,
        actor: Uuid,
        group_id: Uuid,
        application_id: Uuid,
    ) -> AppResult<UserGroupApplication> {
        let group = self.group(group_id).await?;
        let application = self.application(&group, application_id).await?;
        self.require_permission(actor, &group).await?;

        let application = self
            .store
            .approve_application(application.id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Application {} not found", application_id))
            })?;

        info!(
            "Approved application {} of {} to group {}",
            application.id, application.user_id, group.id
        );

        if self.config.send_notifications {
            self.notifier
                .send(Notification::ApplicationApproved {
                    recipient: application.user_id,
                    group_id: group.id,
                    group_name: group.name.clone(),
                })
                .await;
        }

        Ok(application)
    }

    /// Drop an application without telling the applicant
    pub async fn ignore_application(
        &self,
        actor: Uuid,
        group_id: Uuid,
        application_id: Uuid,
    ) -> AppResult<UserGroupApplication> {
        let group = self.group(group_id).await?;
        let application = self.application(&group, application_id).await?;
        self.require_permission(actor, &group).await?;

        self.store.delete_application(application.id).await?;
        info!("Ignored application {} to group {}", application.id, group.id);
        Ok(application)
    }

    // ───────────────────────────── Invitations ───────────────────────

    /// Create one invitation per address and hand each to the notifier
    pub async fn send_email_invitations(
        &self,
        actor: Uuid,
        group_id: Uuid,
        form: &EmailInvitationForm,
    ) -> AppResult<FormOutcome<Vec<EmailInvitation>>> {
        let group = self.group(group_id).await?;
        self.require_permission(actor, &group).await?;

        let addresses = match form.validate() {
            Ok(addresses) => addresses,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };
        let message = form
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        let mut invitations = Vec::with_capacity(addresses.len());
        for email in addresses {
            let key = auth::generate_secret_key(&email);
            let invitation = self
                .store
                .create_email_invitation(group.id, actor, &email, &key)
                .await?;

            // The invitation itself is the point of this view, so it is always dispatched.
            self.notifier
                .send(Notification::EmailInvitation {
                    email: email.clone(),
                    group_id: group.id,
                    group_name: group.name.clone(),
                    link: Route::ValidateEmailInvitation {
                        group_id: group.id,
                        key,
                    }
                    .path(&self.config.slug),
                    message: message.clone(),
                })
                .await;

            invitations.push(invitation);
        }

        info!(
            "Sent {} e-mail invitation(s) to group {}",
            invitations.len(),
            group.id
        );
        Ok(FormOutcome::Saved(invitations))
    }

    /// Redeem an e-mail invitation key for `user_id`
    pub async fn redeem_email_invitation(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        key: &str,
    ) -> AppResult<RedeemOutcome> {
        let group = self.group(group_id).await?;

        let matches = self.store.find_email_invitations(group.id, key).await?;
        match matches.as_slice() {
            [] => Ok(RedeemOutcome::Invalid),
            [invitation] => {
                if !self
                    .store
                    .redeem_email_invitation(invitation.id, user_id)
                    .await?
                {
                    // consumed by a concurrent request
                    return Ok(RedeemOutcome::Invalid);
                }
                info!(
                    "User {} joined group {} through an e-mail invitation",
                    user_id, group.id
                );
                Ok(RedeemOutcome::Joined)
            }
            many => {
                let deleted = self.store.delete_email_invitations(group.id, key).await?;
                warn!(
                    "{} e-mail invitations of group {} shared one key; deleted {}",
                    many.len(),
                    group.id,
                    deleted
                );
                Ok(RedeemOutcome::Reconciled)
            }
        }
    }

    /// Invite an existing user
    pub async fn invite_user(
        &self,
        actor: Uuid,
        group_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<UserGroupInvitation> {
        let group = self.group(group_id).await?;
        let user = self.user(user_id).await?;
        self.require_permission(actor, &group).await?;

        let key = auth::generate_secret_key(&user.id.to_string());
        let invitation = self
            .store
            .create_user_invitation(group.id, user.id, actor, &key)
            .await?;

        info!("User {} invited {} to group {}", actor, user.id, group.id);

        if self.config.send_notifications {
            self.notifier
                .send(Notification::UserInvited {
                    recipient: user.id,
                    group_id: group.id,
                    group_name: group.name.clone(),
                    link: Route::AcceptInvitation {
                        group_id: group.id,
                        key,
                    }
                    .path(&self.config.slug),
                })
                .await;
        }

        Ok(invitation)
    }

    /// Accept an invitation addressed to `user_id`
    pub async fn accept_invitation(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        key: &str,
    ) -> AppResult<RedeemOutcome> {
        let group = self.group(group_id).await?;

        let invitation = match self.store.find_user_invitation(group.id, key).await? {
            Some(invitation) if invitation.user_id == user_id => invitation,
            _ => return Ok(RedeemOutcome::Invalid),
        };

        if !self.store.accept_user_invitation(invitation.id).await? {
            return Ok(RedeemOutcome::Invalid);
        }

        info!("User {} accepted invitation to group {}", user_id, group.id);
        Ok(RedeemOutcome::Joined)
    }
}

//! Request-level adapters over `GroupService`.
//!
//! Each view takes the acting user, the request method and the AJAX flag and
//! answers with a redirect to a named route, a template with its context, or
//! a JSON body. Mutating views show a confirmation on GET and only act on POST.

use crate::auth::require_actor;
use crate::error::AppResult;
use crate::forms::{EmailInvitationForm, FormErrors, GroupForm};
use crate::models::Group;
use crate::options::Templates;
use crate::routes::Route;
use crate::services::{FormOutcome, GroupService, LeaveOutcome, RedeemOutcome};
use crate::store::GroupFields;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// What a view needs to know about the incoming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRequest {
    pub actor: Option<Uuid>,
    pub method: Method,
    pub is_ajax: bool,
}

impl ViewRequest {
    pub fn get(actor: Option<Uuid>) -> Self {
        Self {
            actor,
            method: Method::Get,
            is_ajax: false,
        }
    }

    pub fn post(actor: Option<Uuid>) -> Self {
        Self {
            actor,
            method: Method::Post,
            is_ajax: false,
        }
    }

    pub fn ajax(mut self) -> Self {
        self.is_ajax = true;
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub name: String,
    pub context: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewResponse {
    Redirect(Route),
    Render(Template),
    Json(Value),
}

impl ViewResponse {
    fn render(name: &str, context: Value) -> Self {
        ViewResponse::Render(Template {
            name: name.to_string(),
            context,
        })
    }
}

/// The views of one group kind
#[derive(Clone)]
pub struct GroupViews {
    service: GroupService,
}

impl GroupViews {
    pub fn new(service: GroupService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &GroupService {
        &self.service
    }

    fn templates(&self) -> &Templates {
        &self.service.config().templates
    }

    /// Confirmation page for a mutating view reached with GET
    fn confirmation(&self, group: &Group, action: &str, extra: Value) -> ViewResponse {
        let mut context = json!({ "group": group, "action": action });
        if let (Value::Object(context), Value::Object(extra)) = (&mut context, extra) {
            context.extend(extra);
        }
        ViewResponse::render(&self.templates().confirm_action, context)
    }

    fn form_page(
        &self,
        name: String,
        group: Option<&Group>,
        form: &GroupForm,
        errors: &FormErrors,
    ) -> ViewResponse {
        ViewResponse::Render(Template {
            name,
            context: json!({ "group": group, "form": form, "errors": errors }),
        })
    }

    // ───────────────────────────── Display ───────────────────────────

    pub async fn group_list(&self, _req: ViewRequest) -> AppResult<ViewResponse> {
        let groups = self.service.list_groups().await?;
        Ok(ViewResponse::render(
            &self.templates().list,
            json!({ "kind": self.service.config().slug, "groups": groups }),
        ))
    }

    pub async fn group_detail(&self, req: ViewRequest, group_id: Uuid) -> AppResult<ViewResponse> {
        let detail = self.service.group_detail(req.actor, group_id).await?;
        Ok(ViewResponse::render(
            &self.templates().detail,
            serde_json::to_value(&detail)?,
        ))
    }

    // ───────────────────────────── Create, edit, delete ──────────────

    /// `form` is `None` on GET
    pub async fn create_group(
        &self,
        req: ViewRequest,
        form: Option<GroupForm>,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let name = self.templates().create_group.clone();

        let form = match form {
            Some(form) if req.is_post() => form,
            _ => return Ok(self.form_page(name, None, &GroupForm::default(), &FormErrors::new())),
        };

        match self.service.create_group(actor, &form).await? {
            FormOutcome::Saved(group) => Ok(ViewResponse::Redirect(Route::GroupDetail {
                group_id: group.id,
            })),
            FormOutcome::Invalid(errors) => Ok(self.form_page(name, None, &form, &errors)),
        }
    }

    pub async fn edit_group(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        form: Option<GroupForm>,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        self.service.require_permission(actor, &group).await?;
        let name = self.templates().edit_group.clone();

        let form = match form {
            Some(form) if req.is_post() => form,
            _ => {
                let current = GroupForm::from_fields(&GroupFields {
                    name: group.name.clone(),
                    description: group.description.clone(),
                });
                return Ok(self.form_page(name, Some(&group), &current, &FormErrors::new()));
            }
        };

        match self.service.edit_group(actor, group.id, &form).await? {
            FormOutcome::Saved(group) => Ok(ViewResponse::Redirect(Route::GroupDetail {
                group_id: group.id,
            })),
            FormOutcome::Invalid(errors) => Ok(self.form_page(name, Some(&group), &form, &errors)),
        }
    }

    pub async fn delete_group(&self, req: ViewRequest, group_id: Uuid) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        self.service.require_permission(actor, &group).await?;

        if !req.is_post() {
            return Ok(self.confirmation(&group, "delete", json!({})));
        }

        let group = self.service.delete_group(actor, group.id).await?;
        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "Group deleted",
                "group_id": group.id,
            })));
        }
        Ok(ViewResponse::Redirect(Route::DeleteGroupDone))
    }

    pub async fn delete_group_done(&self, _req: ViewRequest) -> AppResult<ViewResponse> {
        Ok(ViewResponse::render(
            &self.templates().delete_done,
            json!({ "kind": self.service.config().slug }),
        ))
    }

    // ───────────────────────────── Members and admins ────────────────

    pub async fn remove_member(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let member = self.service.user(user_id).await?;
        let group = self.service.group(group_id).await?;
        self.service.require_permission(actor, &group).await?;

        if member.id == actor {
            return Ok(ViewResponse::Redirect(Route::LeaveGroup { group_id: group.id }));
        }

        if !req.is_post() {
            return Ok(self.confirmation(&group, "remove_member", json!({ "member": member })));
        }

        self.service.remove_member(actor, group.id, member.id).await?;

        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "Member removed from group",
                "user_id": member.id,
            })));
        }
        Ok(ViewResponse::Redirect(Route::GroupDetail { group_id: group.id }))
    }

    pub async fn add_admin(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        let member = self.service.user(user_id).await?;
        self.service.require_permission(actor, &group).await?;

        if !req.is_post() {
            return Ok(self.confirmation(&group, "add_admin", json!({ "member": member })));
        }

        self.service.add_admin(actor, group.id, member.id).await?;

        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "User is now an admin of the group",
                "user_id": member.id,
            })));
        }
        Ok(ViewResponse::Redirect(Route::GroupDetail { group_id: group.id }))
    }

    pub async fn revoke_admin(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        let member = self.service.user(user_id).await?;
        self.service.require_permission(actor, &group).await?;

        if !req.is_post() {
            return Ok(self.confirmation(&group, "revoke_admin", json!({ "member": member })));
        }

        self.service.revoke_admin(actor, group.id, member.id).await?;

        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "Admin rights for user revoked",
                "user_id": member.id,
            })));
        }
        Ok(ViewResponse::Redirect(Route::GroupDetail { group_id: group.id }))
    }

    pub async fn leave_group(&self, req: ViewRequest, group_id: Uuid) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;

        if !req.is_post() {
            return Ok(self.confirmation(&group, "leave_group", json!({})));
        }

        match self.service.leave_group(actor, group.id).await? {
            LeaveOutcome::MustDeleteGroup => {
                Ok(ViewResponse::Redirect(Route::DeleteGroup { group_id: group.id }))
            }
            LeaveOutcome::Left if req.is_ajax => Ok(ViewResponse::Json(json!({
                "message": "You have left the group",
                "user_id": actor,
            }))),
            LeaveOutcome::Left => Ok(ViewResponse::Redirect(Route::GroupDetail {
                group_id: group.id,
            })),
        }
    }

    // ───────────────────────────── Applications ──────────────────────

    pub async fn apply_to_join(&self, req: ViewRequest, group_id: Uuid) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;

        if !req.is_post() {
            return Ok(self.confirmation(&group, "apply_to_join", json!({})));
        }

        let outcome = self.service.apply_to_join(actor, group.id).await?;

        if req.is_ajax {
            let message = if outcome.already_member {
                "You're already a member of group"
            } else {
                "Application sent"
            };
            return Ok(ViewResponse::Json(json!({
                "message": message,
                "already_member": outcome.already_member,
            })));
        }

        Ok(ViewResponse::render(
            &self.templates().application,
            json!({ "group": group, "already_member": outcome.already_member }),
        ))
    }

    pub async fn applications(&self, req: ViewRequest, group_id: Uuid) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let (group, applications) = self.service.list_applications(actor, group_id).await?;
        Ok(ViewResponse::render(
            &self.templates().applications,
            json!({ "group": group, "applications": applications }),
        ))
    }

    pub async fn approve_application(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        application_id: Uuid,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        let application = self.service.application(&group, application_id).await?;
        self.service.require_permission(actor, &group).await?;

        if !req.is_post() {
            return Ok(self.confirmation(
                &group,
                "approve_application",
                json!({ "application": application }),
            ));
        }

        let application = self
            .service
            .approve_application(actor, group.id, application.id)
            .await?;

        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "Application approved",
                "user_id": application.user_id,
                "application_id": application.id,
            })));
        }
        Ok(ViewResponse::Redirect(Route::GroupDetail { group_id: group.id }))
    }

    pub async fn ignore_application(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        application_id: Uuid,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        let application = self.service.application(&group, application_id).await?;
        self.service.require_permission(actor, &group).await?;

        if !req.is_post() {
            return Ok(self.confirmation(
                &group,
                "ignore_application",
                json!({ "application": application }),
            ));
        }

        let application = self
            .service
            .ignore_application(actor, group.id, application.id)
            .await?;

        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "Application ignored.",
                "user_id": application.user_id,
                "application_id": application.id,
            })));
        }
        Ok(ViewResponse::Redirect(Route::GroupDetail { group_id: group.id }))
    }

    // ───────────────────────────── Invitations ───────────────────────

    pub async fn create_email_invitation(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        form: Option<EmailInvitationForm>,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        self.service.require_permission(actor, &group).await?;
        let name = self.templates().create_email_invitation.clone();

        let form = match form {
            Some(form) if req.is_post() => form,
            _ => {
                return Ok(ViewResponse::render(
                    &name,
                    json!({ "group": group, "form": EmailInvitationForm::default(), "errors": {} }),
                ))
            }
        };

        match self.service.send_email_invitations(actor, group.id, &form).await? {
            FormOutcome::Saved(_) => {
                Ok(ViewResponse::Redirect(Route::GroupDetail { group_id: group.id }))
            }
            FormOutcome::Invalid(errors) => Ok(ViewResponse::render(
                &name,
                json!({ "group": group, "form": form, "errors": errors }),
            )),
        }
    }

    pub async fn validate_email_invitation(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        key: &str,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;

        match self.service.redeem_email_invitation(actor, group.id, key).await? {
            RedeemOutcome::Joined => Ok(ViewResponse::Redirect(Route::GroupJoined {
                group_id: group.id,
            })),
            outcome => Ok(ViewResponse::render(
                &self.templates().invalid_invitation,
                json!({
                    "group": group,
                    "reconciled": outcome == RedeemOutcome::Reconciled,
                }),
            )),
        }
    }

    pub async fn group_joined(&self, _req: ViewRequest, group_id: Uuid) -> AppResult<ViewResponse> {
        let group = self.service.group(group_id).await?;
        Ok(ViewResponse::render(
            &self.templates().group_joined,
            json!({ "group": group }),
        ))
    }

    pub async fn invite_user(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        let member = self.service.user(user_id).await?;
        self.service.require_permission(actor, &group).await?;

        if !req.is_post() {
            return Ok(self.confirmation(&group, "invite_user", json!({ "member": member })));
        }

        let invitation = self.service.invite_user(actor, group.id, member.id).await?;

        if req.is_ajax {
            return Ok(ViewResponse::Json(json!({
                "message": "Invitation sent",
                "user_id": member.id,
                "invitation_id": invitation.id,
            })));
        }
        Ok(ViewResponse::render(
            &self.templates().invitation_sent,
            json!({ "group": group, "member": member, "invitation": invitation }),
        ))
    }

    pub async fn handle_invitation(
        &self,
        req: ViewRequest,
        group_id: Uuid,
        key: &str,
    ) -> AppResult<ViewResponse> {
        let actor = require_actor(req.actor)?;
        let group = self.service.group(group_id).await?;
        let valid = self.service.accept_invitation(actor, group.id, key).await? == RedeemOutcome::Joined;

        Ok(ViewResponse::render(
            &self.templates().invitation,
            json!({ "group": group, "valid": valid }),
        ))
    }
}

use super::{AppState, ViewContext};
use crate::error::AppResult;
use crate::forms::{EmailInvitationForm, GroupForm};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde_json::json;
use uuid::Uuid;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(json!({
            "status": "up",
            "version": env!("CARGO_PKG_VERSION"),
            "kinds": state.registry.keys(),
        })),
    )
}

// ───────────────────────────── Display ───────────────────────────

pub async fn group_list(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.group_list(req).await?;
    state.respond(&slug, response)
}

pub async fn group_detail(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.group_detail(req, group_id).await?;
    state.respond(&slug, response)
}

pub async fn group_joined(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.group_joined(req, group_id).await?;
    state.respond(&slug, response)
}

// ───────────────────────────── Create, edit, delete ──────────────

pub async fn create_group_form(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.create_group(req, None).await?;
    state.respond(&slug, response)
}

pub async fn create_group(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path(slug): Path<String>,
    Form(form): Form<GroupForm>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.create_group(req, Some(form)).await?;
    state.respond(&slug, response)
}

pub async fn edit_group_form(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.edit_group(req, group_id, None).await?;
    state.respond(&slug, response)
}

pub async fn edit_group(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
    Form(form): Form<GroupForm>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .edit_group(req, group_id, Some(form))
        .await?;
    state.respond(&slug, response)
}

pub async fn delete_group(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.delete_group(req, group_id).await?;
    state.respond(&slug, response)
}

pub async fn delete_group_done(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.delete_group_done(req).await?;
    state.respond(&slug, response)
}

// ───────────────────────────── Members and admins ────────────────

pub async fn leave_group(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.leave_group(req, group_id).await?;
    state.respond(&slug, response)
}

pub async fn remove_member(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, user_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .remove_member(req, group_id, user_id)
        .await?;
    state.respond(&slug, response)
}

pub async fn add_admin(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, user_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.add_admin(req, group_id, user_id).await?;
    state.respond(&slug, response)
}

pub async fn revoke_admin(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, user_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .revoke_admin(req, group_id, user_id)
        .await?;
    state.respond(&slug, response)
}

// ───────────────────────────── Applications ──────────────────────

pub async fn apply_to_join(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.apply_to_join(req, group_id).await?;
    state.respond(&slug, response)
}

pub async fn applications(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.applications(req, group_id).await?;
    state.respond(&slug, response)
}

pub async fn approve_application(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, application_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .approve_application(req, group_id, application_id)
        .await?;
    state.respond(&slug, response)
}

pub async fn ignore_application(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, application_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .ignore_application(req, group_id, application_id)
        .await?;
    state.respond(&slug, response)
}

// ───────────────────────────── Invitations ───────────────────────

pub async fn email_invitation_form(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .create_email_invitation(req, group_id, None)
        .await?;
    state.respond(&slug, response)
}

pub async fn create_email_invitation(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id)): Path<(String, Uuid)>,
    Form(form): Form<EmailInvitationForm>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .create_email_invitation(req, group_id, Some(form))
        .await?;
    state.respond(&slug, response)
}

pub async fn validate_email_invitation(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, key)): Path<(String, Uuid, String)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .validate_email_invitation(req, group_id, &key)
        .await?;
    state.respond(&slug, response)
}

pub async fn invite_user(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, user_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Response> {
    let response = state.views(&slug)?.invite_user(req, group_id, user_id).await?;
    state.respond(&slug, response)
}

pub async fn handle_invitation(
    State(state): State<AppState>,
    ViewContext(req): ViewContext,
    Path((slug, group_id, key)): Path<(String, Uuid, String)>,
) -> AppResult<Response> {
    let response = state
        .views(&slug)?
        .handle_invitation(req, group_id, &key)
        .await?;
    state.respond(&slug, response)
}

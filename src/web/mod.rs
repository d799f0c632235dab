//! HTTP surface: one set of group routes per registered group kind.

pub mod handlers;
pub mod response;

pub use response::{JsonRenderer, TemplateRenderer};

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::options::GroupRegistry;
use crate::services::{GroupService, Notifier};
use crate::store::GroupStore;
use crate::views::{GroupViews, Method, ViewRequest, ViewResponse};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<GroupRegistry>,
    pub store: Arc<dyn GroupStore>,
    pub notifier: Arc<dyn Notifier>,
    pub renderer: Arc<dyn TemplateRenderer>,
    /// Header carrying the authenticated user's id
    pub user_header: HeaderName,
}

impl AppState {
    pub fn new(
        registry: GroupRegistry,
        store: Arc<dyn GroupStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            notifier,
            renderer: Arc::new(JsonRenderer),
            user_header: HeaderName::from_static("x-user-id"),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_user_header(mut self, name: &str) -> AppResult<Self> {
        self.user_header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::Config(format!("Invalid user header '{}': {}", name, e)))?;
        Ok(self)
    }

    /// Views bound to the configuration registered under `slug`
    pub fn views(&self, slug: &str) -> AppResult<GroupViews> {
        let config = self.registry.get(slug)?;
        Ok(GroupViews::new(GroupService::new(
            config,
            self.store.clone(),
            self.notifier.clone(),
        )))
    }

    /// Turn a view result into an HTTP response
    pub fn respond(&self, slug: &str, response: ViewResponse) -> AppResult<Response> {
        match response {
            ViewResponse::Redirect(route) => Ok(Redirect::to(&route.path(slug)).into_response()),
            ViewResponse::Render(template) => self.renderer.render(&template),
            ViewResponse::Json(body) => Ok(Json(body).into_response()),
        }
    }
}

/// Acting user, method and AJAX flag of the current request
#[derive(Debug, Clone, Copy)]
pub struct ViewContext(pub ViewRequest);

impl FromRequestParts<AppState> for ViewContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let actor = match parts.headers.get(&state.user_header) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| AppError::Validation("Invalid user id header".to_string()))?;
                auth::parse_actor(value)?
            }
            None => None,
        };

        let is_ajax = parts
            .headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        let method = if parts.method == axum::http::Method::POST {
            Method::Post
        } else {
            Method::Get
        };

        Ok(ViewContext(ViewRequest {
            actor,
            method,
            is_ajax,
        }))
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    use handlers::*;

    Router::new()
        .route("/health", get(health))
        .route("/groups/{slug}/", get(group_list))
        .route("/groups/{slug}/create/", get(create_group_form).post(create_group))
        .route("/groups/{slug}/deleted/", get(delete_group_done))
        .route("/groups/{slug}/{group_id}/", get(group_detail))
        .route(
            "/groups/{slug}/{group_id}/edit/",
            get(edit_group_form).post(edit_group),
        )
        .route(
            "/groups/{slug}/{group_id}/delete/",
            get(delete_group).post(delete_group),
        )
        .route(
            "/groups/{slug}/{group_id}/leave/",
            get(leave_group).post(leave_group),
        )
        .route(
            "/groups/{slug}/{group_id}/apply/",
            get(apply_to_join).post(apply_to_join),
        )
        .route("/groups/{slug}/{group_id}/joined/", get(group_joined))
        .route("/groups/{slug}/{group_id}/applications/", get(applications))
        .route(
            "/groups/{slug}/{group_id}/members/{user_id}/remove/",
            get(remove_member).post(remove_member),
        )
        .route(
            "/groups/{slug}/{group_id}/admins/{user_id}/add/",
            get(add_admin).post(add_admin),
        )
        .route(
            "/groups/{slug}/{group_id}/admins/{user_id}/revoke/",
            get(revoke_admin).post(revoke_admin),
        )
        .route(
            "/groups/{slug}/{group_id}/applications/{application_id}/approve/",
            get(approve_application).post(approve_application),
        )
        .route(
            "/groups/{slug}/{group_id}/applications/{application_id}/ignore/",
            get(ignore_application).post(ignore_application),
        )
        .route(
            "/groups/{slug}/{group_id}/invite/",
            get(email_invitation_form).post(create_email_invitation),
        )
        .route(
            "/groups/{slug}/{group_id}/invite/{key}/",
            get(validate_email_invitation),
        )
        .route(
            "/groups/{slug}/{group_id}/users/{user_id}/invite/",
            get(invite_user).post(invite_user),
        )
        .route(
            "/groups/{slug}/{group_id}/invitation/{key}/",
            get(handle_invitation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use crate::error::{AppError, AppResult};
use crate::views::Template;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Turns a view's template and context into an HTTP response.
///
/// Hosts plug in their template engine here.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &Template) -> AppResult<Response>;
}

/// Renders `{ "template": ..., "context": ... }` as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl TemplateRenderer for JsonRenderer {
    fn render(&self, template: &Template) -> AppResult<Response> {
        Ok(Json(template).into_response())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

//! Axum HTTP server handlers for account registration and provisioning endpoints.

pub mod context;
mod handler_accounts;
mod handler_provisioning;
pub mod server;

pub use context::AppState;
pub use server::build_router;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::identity::operation::OperationResult;

/// Render a failure as a problem-style JSON body
pub(crate) fn problem_response(status: StatusCode, title: &str, detail: &str) -> Response {
    (
        status,
        Json(json!({
            "title": title,
            "status": status.as_u16(),
            "detail": detail,
        })),
    )
        .into_response()
}

/// Convert an operation envelope into an HTTP response, using the given
/// status for the success arm
pub(crate) fn operation_response<T: Serialize>(
    success_status: StatusCode,
    result: OperationResult<T>,
) -> Response {
    match result {
        OperationResult::Success(payload) => (success_status, Json(payload)).into_response(),
        OperationResult::Failure {
            kind,
            title,
            message,
        } => problem_response(kind.status_code(), &title, &message),
    }
}

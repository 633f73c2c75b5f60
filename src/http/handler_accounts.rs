//! Handles POST /api/user/register and PUT /api/user/update/{id}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use crate::http::context::AppState;
use crate::http::operation_response;
use crate::identity::types::{AccountUpdateRequest, RegisterRequest};

/// Handle account registration
/// POST /api/user/register - Creates an account, its credential, and its claims
pub async fn register_account_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    tracing::debug!(email = %request.email, "account registration requested");

    let result = state.registration_service.register(request).await;
    operation_response(StatusCode::CREATED, result)
}

/// Handle partial profile update
/// PUT /api/user/update/{id} - Updates the supplied fields, leaves the rest
pub async fn update_account_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AccountUpdateRequest>,
) -> Response {
    tracing::debug!(account = %id, "account update requested");

    let result = state.registration_service.update(&id, request).await;
    operation_response(StatusCode::OK, result)
}

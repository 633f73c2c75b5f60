//! Handlers for the administrative provisioning endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use crate::http::context::AppState;
use crate::http::operation_response;
use crate::identity::types::{ClientCredentials, ResourceCredentials, ScopeCredentials};

/// POST /api/api-scope/create - Provision a single API scope
pub async fn create_scope_handler(
    State(state): State<AppState>,
    Json(credentials): Json<ScopeCredentials>,
) -> Response {
    tracing::debug!(scope = %credentials.name, "scope provisioning requested");

    let result = state.provisioning_service.create_scope(credentials).await;
    operation_response(StatusCode::CREATED, result)
}

/// POST /api/api-scopes/create - Provision a batch of API scopes
pub async fn create_scopes_handler(
    State(state): State<AppState>,
    Json(credentials): Json<Vec<ScopeCredentials>>,
) -> Response {
    tracing::debug!(count = credentials.len(), "scope batch provisioning requested");

    let result = state.provisioning_service.create_scopes(credentials).await;
    operation_response(StatusCode::CREATED, result)
}

/// POST /api/api-resource/create - Provision an API resource
pub async fn create_resource_handler(
    State(state): State<AppState>,
    Json(credentials): Json<ResourceCredentials>,
) -> Response {
    tracing::debug!(resource = %credentials.name, "resource provisioning requested");

    let result = state
        .provisioning_service
        .create_resource(credentials)
        .await;
    operation_response(StatusCode::CREATED, result)
}

/// POST /api/client/create - Provision a single client with caller-supplied
/// grant types
pub async fn create_client_handler(
    State(state): State<AppState>,
    Json(credentials): Json<ClientCredentials>,
) -> Response {
    tracing::debug!(client = %credentials.id, "client provisioning requested");

    let result = state.provisioning_service.create_client(credentials).await;
    operation_response(StatusCode::CREATED, result)
}

/// POST /api/clients/create - Provision a batch of interactive clients
pub async fn create_clients_handler(
    State(state): State<AppState>,
    Json(credentials): Json<Vec<ClientCredentials>>,
) -> Response {
    tracing::debug!(count = credentials.len(), "client batch provisioning requested");

    let result = state.provisioning_service.create_clients(credentials).await;
    operation_response(StatusCode::CREATED, result)
}

/// POST /api/system-clients/create - Provision a batch of machine-to-machine
/// clients
pub async fn create_system_clients_handler(
    State(state): State<AppState>,
    Json(credentials): Json<Vec<ClientCredentials>>,
) -> Response {
    tracing::debug!(
        count = credentials.len(),
        "system client batch provisioning requested"
    );

    let result = state
        .provisioning_service
        .create_system_clients(credentials)
        .await;
    operation_response(StatusCode::CREATED, result)
}

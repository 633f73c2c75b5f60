//! Main router configuration assembling the account and provisioning endpoints.

use axum::{
    Router,
    routing::{post, put},
};
use tower_http::trace::TraceLayer;

use super::{
    context::AppState,
    handler_accounts::{register_account_handler, update_account_handler},
    handler_provisioning::{
        create_client_handler, create_clients_handler, create_resource_handler,
        create_scope_handler, create_scopes_handler, create_system_clients_handler,
    },
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let account_routes = Router::new()
        .route("/user/register", post(register_account_handler))
        .route("/user/update/{id}", put(update_account_handler));

    let provisioning_routes = Router::new()
        .route("/api-scope/create", post(create_scope_handler))
        .route("/api-scopes/create", post(create_scopes_handler))
        .route("/api-resource/create", post(create_resource_handler))
        .route("/client/create", post(create_client_handler))
        .route("/clients/create", post(create_clients_handler))
        .route(
            "/system-clients/create",
            post(create_system_clients_handler),
        );

    Router::new()
        .nest("/api", account_routes.merge(provisioning_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

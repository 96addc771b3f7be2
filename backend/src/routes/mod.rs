//! Route definitions for the Depot Back-Office

use axum::{middleware, routing::get, Router};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - consignment ledger
        .nest("/depots", depot_routes())
}

/// Depot / consignment ledger routes (protected)
fn depot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_depots))
        .route_layer(middleware::from_fn(auth_middleware))
}

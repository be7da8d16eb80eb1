//! HTTP service exposing chainsign signing devices.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

/// Builds the service router.
pub fn app(state: Arc<AppState>, cors_enabled: bool) -> Router {
    let api = Router::new()
        .route(
            "/devices",
            get(handlers::list_devices).post(handlers::create_device),
        )
        .route("/devices/:deviceid", get(handlers::get_device))
        .route(
            "/devices/:deviceid/signatures",
            post(handlers::sign_transaction),
        )
        .route("/openapi.yaml", get(handlers::openapi_spec));

    let router = Router::new()
        .route(
            "/api/v0/health",
            get(handlers::health_check).fallback(handlers::method_not_allowed),
        )
        .nest("/api/v1", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

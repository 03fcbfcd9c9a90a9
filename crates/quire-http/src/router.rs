//! Axum router construction for the settings API.
//!
//! Assembles all routes into a single [`Router`] with the save middleware,
//! CORS, and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::save_on_completion;
use crate::state::SettingsState;

/// Build the complete Axum router for the settings server.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET|DELETE /api/settings/{domain}` -- read or reset a domain
/// - `GET|PUT|DELETE /api/settings/{domain}/{key}` -- one setting
///
/// Every request gets its own manager, saved once after the handler
/// returns. CORS is configured to allow any origin.
pub fn build_router(state: Arc<SettingsState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/settings/{domain}",
            get(handlers::get_domain).delete(handlers::reset_domain),
        )
        .route(
            "/api/settings/{domain}/{key}",
            get(handlers::get_setting)
                .put(handlers::put_setting)
                .delete(handlers::delete_setting),
        )
        .layer(middleware::from_fn_with_state(state, save_on_completion))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

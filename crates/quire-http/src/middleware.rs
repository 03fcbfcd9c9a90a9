//! Deferred save at the end of each request.
//!
//! [`save_on_completion`] gives every request its own
//! [`SettingsManager`](quire_core::SettingsManager), lets the inner service
//! run, then saves once. The save runs whatever the handler returned. A
//! failed save is logged and does not change the response that was
//! already produced.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, error};

use crate::state::{SettingsState, SharedSettings};

/// Attach a per-request manager and save it after the handler ran.
pub async fn save_on_completion(
    State(state): State<Arc<SettingsState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let settings = SharedSettings::new(state.manager());
    request.extensions_mut().insert(settings.clone());

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    let mut manager = settings.lock().await;
    match manager.save().await {
        Ok(()) => debug!(%method, %path, status = %response.status(), "request settings saved"),
        Err(e) => error!(%method, %path, error = %e, "failed to save settings after request"),
    }

    response
}

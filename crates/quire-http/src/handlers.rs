//! REST API endpoint handlers for the settings server.
//!
//! Every handler works on the per-request manager placed in the request
//! extensions by [`save_on_completion`](crate::middleware::save_on_completion).
//! Writes only touch memory here; the middleware persists them once the
//! handler returns.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/settings/{domain}` | All settings of a domain |
//! | `DELETE` | `/api/settings/{domain}` | Reset a domain |
//! | `GET` | `/api/settings/{domain}/{key}` | One setting |
//! | `PUT` | `/api/settings/{domain}/{key}` | Store a setting (JSON body) |
//! | `DELETE` | `/api/settings/{domain}/{key}` | Delete a setting |

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use quire_core::manager::DOMAIN_SEPARATOR;
use quire_types::Value;

use crate::error::ApiError;
use crate::state::SharedSettings;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report that the server is up.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// /api/settings/{domain}
// ---------------------------------------------------------------------------

/// Return the nested settings tree of `domain`.
pub async fn get_domain(
    Extension(settings): Extension<SharedSettings>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_domain(&domain)?;
    let all = settings.lock().await.all(Some(&domain)).await?;

    Ok(Json(serde_json::json!({
        "domain": domain,
        "settings": all,
    })))
}

/// Drop every setting of `domain`.
pub async fn reset_domain(
    Extension(settings): Extension<SharedSettings>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_domain(&domain)?;
    settings.lock().await.reset(Some(&domain)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// /api/settings/{domain}/{key}
// ---------------------------------------------------------------------------

/// Return the value stored at `key` in `domain`.
pub async fn get_setting(
    Extension(settings): Extension<SharedSettings>,
    Path((domain, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let full = qualified(&domain, &key)?;
    let value = settings
        .lock()
        .await
        .get(&full)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("setting {full}")))?;

    Ok(Json(entry_json(&domain, &key, &value)))
}

/// Store the JSON body at `key` in `domain`.
pub async fn put_setting(
    Extension(settings): Extension<SharedSettings>,
    Path((domain, key)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let full = qualified(&domain, &key)?;
    settings.lock().await.set(&full, value.clone()).await?;

    Ok(Json(entry_json(&domain, &key, &value)))
}

/// Remove the value stored at `key` in `domain`.
pub async fn delete_setting(
    Extension(settings): Extension<SharedSettings>,
    Path((domain, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let full = qualified(&domain, &key)?;
    settings
        .lock()
        .await
        .delete(&full)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("setting {full}")))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_domain(domain: &str) -> Result<(), ApiError> {
    if domain.is_empty() || domain.contains(DOMAIN_SEPARATOR) {
        return Err(ApiError::BadRequest(format!("invalid domain: {domain:?}")));
    }
    Ok(())
}

fn qualified(domain: &str, key: &str) -> Result<String, ApiError> {
    check_domain(domain)?;
    Ok(format!("{domain}{DOMAIN_SEPARATOR}{key}"))
}

fn entry_json(domain: &str, key: &str, value: &Value) -> serde_json::Value {
    serde_json::json!({
        "domain": domain,
        "key": key,
        "value": value,
    })
}

//! HTTP API for the settings store.
//!
//! This crate provides an Axum server exposing settings over REST. Each
//! request works on its own
//! [`SettingsManager`](quire_core::SettingsManager): the handler reads and
//! writes memory, and [`middleware::save_on_completion`] saves once after
//! the handler has produced its response.
//!
//! # Modules
//!
//! - [`error`] -- [`ApiError`](error::ApiError) and its JSON response
//! - [`handlers`] -- Endpoint handlers
//! - [`middleware`] -- Per-request manager and deferred save
//! - [`router`] -- Route table
//! - [`server`] -- Bind and serve
//! - [`state`] -- Shared state and the per-request manager handle

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::{SettingsState, SharedSettings};

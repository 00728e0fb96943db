//! Glimmer social network HTTP API.
//!
//! Routing, auth, and upload handling for the photo-sharing backend;
//! all state lives in the database crate.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::state::AppState;

/// Request body ceiling. Leaves headroom over the per-file limit so
/// oversized uploads reach the handler's own 413 check.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Build the application router with state applied.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

//! Route handlers for the API.

pub mod auth;
pub mod friend_requests;
pub mod friends;
pub mod health;
pub mod notifications;
pub mod photos;
pub mod profile;
pub mod users;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Accounts and sessions
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Friend request workflow
        .route(
            "/friend-requests",
            get(friend_requests::list).post(friend_requests::create),
        )
        .route(
            "/friend-requests/:id",
            patch(friend_requests::respond).delete(friend_requests::cancel),
        )
        // Friendship ledger reads
        .route("/friends", get(friends::list))
        .route("/friends/suggestions", get(friends::suggestions))
        .route("/users/search", get(users::search))
        // Photo feed
        .route("/photos", get(photos::feed).post(photos::upload))
        // Profile
        .route("/profile", get(profile::overview).patch(profile::update))
        // Notifications
        .route(
            "/notifications",
            get(notifications::list).patch(notifications::mark_read),
        )
}

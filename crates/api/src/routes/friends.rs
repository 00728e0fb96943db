//! Friend list and suggested connections.

use axum::extract::State;
use axum::Json;
use database::friendship::{self, FriendEntry};
use database::suggestion::{self, Suggestion};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::state::AppState;

/// How many suggested connections to surface.
const SUGGESTION_LIMIT: i64 = 4;

#[derive(Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<FriendEntry>,
}

/// List the caller's friends, newest friendship first.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<FriendsResponse>> {
    let friends = friendship::list_friends(state.db.pool(), &user.id).await?;
    Ok(Json(FriendsResponse { friends }))
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// Rank non-friends by shared-friend count against the live graph.
pub async fn suggestions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SuggestionsResponse>> {
    let suggestions =
        suggestion::mutual_connections(state.db.pool(), &user.id, SUGGESTION_LIMIT).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

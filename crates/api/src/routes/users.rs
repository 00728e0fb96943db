//! Account search with computed relationship status.

use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::Json;
use database::{friend_request, friendship, user, UserSummary};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

const SEARCH_LIMIT: i64 = 10;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Where a candidate stands relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipStatus {
    Friend,
    Pending,
    Incoming,
    None,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub user: UserSummary,
    pub status: RelationshipStatus,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// Search candidates by name, handle, or email substring. The status
/// reflects the live request/friendship state for each result.
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let query = params.q.as_deref().unwrap_or("").trim().to_string();

    if query.is_empty() {
        return Ok(Json(SearchResponse { results: vec![] }));
    }

    if query.chars().count() < 2 {
        return Err(ApiError::BadRequest(
            "Query must be at least 2 characters".to_string(),
        ));
    }

    let pool = state.db.pool();

    let candidates = user::search(pool, &query, &user.id, SEARCH_LIMIT).await?;
    let friends: HashSet<String> = friendship::friend_ids(pool, &user.id).await?.into_iter().collect();
    let pending = friend_request::list_pending_involving(pool, &user.id).await?;

    let mut outgoing = HashSet::new();
    let mut incoming = HashSet::new();
    for (requester_id, recipient_id) in pending {
        if requester_id == user.id {
            outgoing.insert(recipient_id);
        } else if recipient_id == user.id {
            incoming.insert(requester_id);
        }
    }

    let results = candidates
        .into_iter()
        .map(|candidate| {
            let status = if friends.contains(&candidate.id) {
                RelationshipStatus::Friend
            } else if outgoing.contains(&candidate.id) {
                RelationshipStatus::Pending
            } else if incoming.contains(&candidate.id) {
                RelationshipStatus::Incoming
            } else {
                RelationshipStatus::None
            };

            SearchResult {
                user: candidate,
                status,
            }
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}

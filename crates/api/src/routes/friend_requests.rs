//! Friend request endpoints.
//!
//! The handlers run the precondition ladder (self-request, unknown
//! recipient, existing friendship, duplicate direction) and delegate
//! the transactional transitions to the database crate.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::friend_request::{self, CancelOutcome};
use database::{friendship, user, RequestStatus, UserSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingView {
    pub id: String,
    pub created_at: String,
    pub requester: UserSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingView {
    pub id: String,
    pub created_at: String,
    pub recipient: UserSummary,
}

#[derive(Serialize)]
pub struct RequestLists {
    pub incoming: Vec<IncomingView>,
    pub outgoing: Vec<OutgoingView>,
}

/// List the caller's pending requests in both directions.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<RequestLists>> {
    let pool = state.db.pool();

    let incoming = friend_request::list_incoming_pending(pool, &user.id)
        .await?
        .into_iter()
        .map(|entry| IncomingView {
            id: entry.id,
            created_at: entry.created_at,
            requester: entry.user,
        })
        .collect();

    let outgoing = friend_request::list_outgoing_pending(pool, &user.id)
        .await?
        .into_iter()
        .map(|entry| OutgoingView {
            id: entry.id,
            created_at: entry.created_at,
            recipient: entry.user,
        })
        .collect();

    Ok(Json(RequestLists { incoming, outgoing }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub recipient_id: String,
}

/// Send a friend request, or resolve a mutual one.
///
/// A pending request in the reverse direction is accepted on the spot
/// instead of creating a second row.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let pool = state.db.pool();
    let recipient_id = req.recipient_id.trim().to_string();

    if recipient_id.is_empty() {
        return Err(ApiError::Unprocessable("recipientId is required".to_string()));
    }

    if recipient_id == user.id {
        return Err(ApiError::BadRequest("You cannot add yourself.".to_string()));
    }

    let target = user::get_summary(pool, &recipient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    if friendship::exists(pool, &user.id, &recipient_id).await? {
        return Err(ApiError::Conflict("You are already friends.".to_string()));
    }

    // A pending request in the other direction means both sides want
    // the friendship; accept it instead of creating a mirror row.
    if let Some(reverse) = friend_request::find_by_pair(pool, &recipient_id, &user.id).await? {
        if reverse.status == RequestStatus::Pending {
            let friendship = friend_request::accept(pool, &reverse, &user.summary()).await?;
            info!(request = %reverse.id, "Mutual request resolved into friendship");

            return Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "status": "FRIENDSHIP",
                    "friendship": friendship,
                })),
            ));
        }
    }

    if let Some(outgoing) = friend_request::find_by_pair(pool, &user.id, &recipient_id).await? {
        if outgoing.status == RequestStatus::Pending {
            return Err(ApiError::Conflict("Request already sent.".to_string()));
        }
    }

    let request = friend_request::upsert_pending(pool, &user.summary(), &recipient_id).await?;
    info!(request = %request.id, recipient = %recipient_id, "Friend request sent");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "REQUEST",
            "request": {
                "id": request.id,
                "createdAt": request.created_at,
                "recipient": target,
            },
        })),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Accept,
    Decline,
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub action: Action,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipView {
    pub id: String,
    pub created_at: String,
    pub user_a: UserSummary,
    pub user_b: UserSummary,
}

/// Accept or decline a pending request. Recipient only.
pub async fn respond(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<serde_json::Value>> {
    let pool = state.db.pool();

    let request = friend_request::get(pool, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(ApiError::BadRequest("Request already handled".to_string()));
    }

    if request.recipient_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the recipient can respond.".to_string(),
        ));
    }

    let requester = user::get_summary(pool, &request.requester_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    match req.action {
        Action::Decline => {
            friend_request::decline(pool, &request).await?;
            info!(request = %request.id, "Friend request declined");

            Ok(Json(serde_json::json!({
                "status": "DECLINED",
                "request": {
                    "id": request.id,
                    "requester": requester,
                },
            })))
        }
        Action::Accept => {
            let responder = user.summary();
            let friendship = friend_request::accept(pool, &request, &responder).await?;
            info!(request = %request.id, "Friend request accepted");

            // Resolve which side of the normalized pair is which.
            let (user_a, user_b) = if friendship.user_a_id == requester.id {
                (requester.clone(), responder)
            } else {
                (responder, requester.clone())
            };
            let view = FriendshipView {
                id: friendship.id,
                created_at: friendship.created_at,
                user_a,
                user_b,
            };

            Ok(Json(serde_json::json!({
                "status": "ACCEPTED",
                "request": {
                    "id": request.id,
                    "requester": requester,
                },
                "friendship": view,
            })))
        }
    }
}

/// Cancel a request. Requester only; stale terminal rows are removed.
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let pool = state.db.pool();

    let request = friend_request::get(pool, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    if request.requester_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the requester can cancel.".to_string(),
        ));
    }

    let status = match friend_request::cancel(pool, &request).await? {
        CancelOutcome::Canceled => "CANCELED",
        CancelOutcome::Removed => "REMOVED",
    };
    info!(request = %request.id, status, "Friend request canceled");

    Ok(Json(serde_json::json!({ "status": status })))
}

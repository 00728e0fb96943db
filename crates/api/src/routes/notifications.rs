//! Notification list and read-state endpoints.

use axum::extract::{Query, State};
use axum::Json;
use database::notification::{self, NotificationMetadata, PersonSummary};
use database::{Notification, NotificationType};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub variant: &'static str,
    pub data: serde_json::Value,
    pub created_at: String,
    pub read_at: Option<String>,
    pub is_read: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub notifications: Vec<NotificationView>,
    pub unread_count: i64,
}

/// List the caller's notifications, newest first, with the unread count.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let pool = state.db.pool();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let notifications = notification::list(pool, &user.id, limit).await?;
    let unread_count = notification::unread_count(pool, &user.id).await?;

    let views = notifications
        .into_iter()
        .filter_map(serialize_notification)
        .collect();

    Ok(Json(ListResponse {
        notifications: views,
        unread_count,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub ids: Option<Vec<String>>,
    pub mark_all: Option<bool>,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Mark notifications read, either by id or all at once.
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>> {
    let pool = state.db.pool();
    let mark_all = req.mark_all.unwrap_or(false);
    let ids = req.ids.unwrap_or_default();

    if !mark_all && ids.is_empty() {
        return Err(ApiError::Unprocessable(
            "Provide notification ids or markAll.".to_string(),
        ));
    }

    let updated = if mark_all {
        notification::mark_all_read(pool, &user.id).await?
    } else {
        notification::mark_read(pool, &user.id, &ids).await?
    };

    Ok(Json(MarkReadResponse { updated }))
}

/// Flatten a stored notification into its client shape. Rows with
/// missing or unparseable metadata are dropped.
fn serialize_notification(notification: Notification) -> Option<NotificationView> {
    let metadata = notification::parse_metadata(notification.metadata.as_deref())?;

    let kind = match notification.kind {
        NotificationType::FriendRequest => "friend_request",
        NotificationType::Upload => "upload",
    };

    let (variant, data) = match metadata {
        NotificationMetadata::IncomingRequest { request_id, from } => (
            "incoming_request",
            serde_json::json!({
                "requestId": request_id,
                "from": public_person(from),
            }),
        ),
        NotificationMetadata::RequestAccepted { request_id, by } => (
            "request_accepted",
            serde_json::json!({
                "requestId": request_id,
                "by": public_person(by),
            }),
        ),
        NotificationMetadata::FriendUpload {
            photo_id,
            photo,
            user,
        } => (
            "friend_upload",
            serde_json::json!({
                "photoId": photo_id,
                "photo": {
                    "caption": photo.caption,
                    "filePath": photo.file_path.clone(),
                    "fileUrl": public_url(&photo.file_path),
                },
                "user": public_person(user),
            }),
        ),
    };

    Some(NotificationView {
        id: notification.id,
        kind,
        variant,
        data,
        created_at: notification.created_at,
        read_at: notification.read_at.clone(),
        is_read: notification.read_at.is_some(),
    })
}

/// Stored paths are relative; the client wants a rooted URL.
fn public_url(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn public_person(mut person: PersonSummary) -> PersonSummary {
    person.image = person.image.map(|image| public_url(&image));
    person
}

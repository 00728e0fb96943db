//! Photo feed and multipart upload.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::notification::{self, NotificationMetadata, PersonSummary, PhotoRef};
use database::{friendship, photo, NotificationType, Photo, PhotoWithOwner, UserSummary};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::uploads::{self, UploadStore};

const DEFAULT_PAGE_SIZE: i64 = 9;
const MAX_PAGE_SIZE: i64 = 30;

#[derive(Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPhoto {
    pub id: String,
    pub owner_id: String,
    pub caption: Option<String>,
    pub file_path: String,
    pub created_at: String,
    pub owner: UserSummary,
}

impl From<PhotoWithOwner> for FeedPhoto {
    fn from(entry: PhotoWithOwner) -> Self {
        FeedPhoto {
            id: entry.photo.id,
            owner_id: entry.photo.owner_id,
            caption: entry.photo.caption,
            file_path: entry.photo.file_path,
            created_at: entry.photo.created_at,
            owner: entry.owner,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub photos: Vec<FeedPhoto>,
    pub next_cursor: Option<String>,
}

/// Cursor-paginated feed, newest first. The cursor names the first
/// photo of the requested page.
pub async fn feed(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let pool = state.db.pool();
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let after = match params.cursor.as_deref() {
        None => None,
        Some(cursor) => {
            let anchor = photo::get(pool, cursor)
                .await?
                .ok_or_else(|| ApiError::BadRequest("Unknown cursor".to_string()))?;
            Some((anchor.created_at, anchor.id))
        }
    };

    let page = photo::feed_page(
        pool,
        limit,
        after.as_ref().map(|(created_at, id)| (created_at.as_str(), id.as_str())),
    )
    .await?;

    Ok(Json(FeedResponse {
        photos: page.photos.into_iter().map(FeedPhoto::from).collect(),
        next_cursor: page.next_cursor,
    }))
}

/// Upload a photo (multipart `file` plus optional `caption`) and
/// notify the uploader's friends.
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut caption: Option<String> = None;
    let mut file: Option<(Option<String>, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        // Reading a field's content consumes it, so take the name first.
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("caption") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    caption = Some(text.to_string());
                }
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Image file is required.".to_string()))?;

    if !uploads::allowed_mime(&content_type) {
        return Err(ApiError::UnsupportedMedia(
            "Unsupported file type. Upload JPEG, PNG, or WebP.".to_string(),
        ));
    }

    if bytes.len() > uploads::MAX_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge("File exceeds 5MB limit.".to_string()));
    }

    let stored_name = UploadStore::generate_file_name(file_name.as_deref(), &content_type);
    state
        .uploads
        .save(&stored_name, &bytes)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let owner = user.summary();
    let photo = photo::create(
        state.db.pool(),
        &user.id,
        caption.as_deref(),
        &UploadStore::public_path(&stored_name),
    )
    .await?;

    info!(photo = %photo.id, owner = %owner.id, "Photo uploaded");

    notify_friends(&state, &photo, &owner).await;

    let view = FeedPhoto {
        id: photo.id,
        owner_id: photo.owner_id,
        caption: photo.caption,
        file_path: photo.file_path,
        created_at: photo.created_at,
        owner,
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "photo": view })),
    ))
}

/// Fan one upload out to every friend. Best effort: a failed upsert is
/// logged and skipped, and never rolls back the photo.
async fn notify_friends(state: &AppState, photo: &Photo, owner: &UserSummary) {
    let pool = state.db.pool();

    let friend_ids = match friendship::friend_ids(pool, &owner.id).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "Failed to enumerate friends for upload fan-out");
            return;
        }
    };

    let metadata = NotificationMetadata::FriendUpload {
        photo_id: photo.id.clone(),
        photo: PhotoRef {
            caption: photo.caption.clone(),
            file_path: photo.file_path.clone(),
        },
        user: PersonSummary::from(owner),
    };

    let mut notified = 0;
    for friend_id in friend_ids {
        let result = notification::upsert(
            pool,
            &notification::friend_upload_id(&photo.id, &friend_id),
            &friend_id,
            NotificationType::Upload,
            &metadata,
        )
        .await;

        match result {
            Ok(()) => notified += 1,
            Err(err) => {
                warn!(friend = %friend_id, error = %err, "Failed to record upload notification");
            }
        }
    }

    info!(photo = %photo.id, notified, "Upload fan-out complete");
}

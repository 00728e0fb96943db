//! Profile overview and settings.

use axum::extract::{Multipart, State};
use axum::Json;
use database::friendship::FriendEntry;
use database::{friendship, photo, user, validation, Photo, UserSummary};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::uploads::{self, UploadStore};

const OVERVIEW_PHOTO_COUNT: i64 = 9;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub id: String,
    pub display_name: String,
    pub handle: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
    pub photos: Vec<Photo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub user: ProfileUser,
    pub friends: Vec<FriendEntry>,
    pub total_photos: i64,
}

/// The caller's profile: latest photos, friends, and photo count.
pub async fn overview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<OverviewResponse>> {
    let pool = state.db.pool();

    let photos = photo::list_for_owner(pool, &user.id, OVERVIEW_PHOTO_COUNT).await?;
    let friends = friendship::list_friends(pool, &user.id).await?;
    let total_photos = photo::count_for_owner(pool, &user.id).await?;

    Ok(Json(OverviewResponse {
        user: ProfileUser {
            id: user.id,
            display_name: user.display_name,
            handle: user.handle,
            bio: user.bio,
            image: user.image,
            created_at: user.created_at,
            photos,
        },
        friends,
        total_photos,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfile {
    pub user: UserSummary,
}

/// Update display name, handle, bio, and optionally the avatar
/// (multipart form).
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UpdatedProfile>> {
    let pool = state.db.pool();

    let mut display_name: Option<String> = None;
    let mut handle: Option<String> = None;
    let mut bio: Option<String> = None;
    let mut avatar: Option<(Option<String>, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        // Reading a field's content consumes it, so take the name first.
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("displayName") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                display_name = Some(text.trim().to_string());
            }
            Some("handle") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                let text = text.trim().to_lowercase();
                if !text.is_empty() {
                    handle = Some(text);
                }
            }
            Some("bio") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    bio = Some(text.to_string());
                }
            }
            Some("avatar") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                avatar = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let display_name = display_name
        .ok_or_else(|| ApiError::Unprocessable("displayName is required".to_string()))?;
    validation::validate_display_name(&display_name)?;

    if let Some(handle) = handle.as_deref() {
        validation::validate_handle(handle)?;

        // Friendly pre-check; the unique index is the actual guard.
        if user::handle_exists(pool, handle, Some(&user.id)).await? {
            return Err(ApiError::Conflict("Handle is already taken.".to_string()));
        }
    }

    if let Some(bio) = bio.as_deref() {
        validation::validate_bio(bio)?;
    }

    let mut avatar_path: Option<String> = None;
    if let Some((file_name, content_type, bytes)) = avatar {
        if !uploads::allowed_mime(&content_type) {
            return Err(ApiError::UnsupportedMedia("Unsupported avatar type.".to_string()));
        }

        if bytes.len() > uploads::MAX_UPLOAD_BYTES {
            return Err(ApiError::PayloadTooLarge("Avatar exceeds 5MB limit.".to_string()));
        }

        let stored_name = UploadStore::generate_file_name(file_name.as_deref(), &content_type);
        state
            .uploads
            .save(&stored_name, &bytes)
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;
        avatar_path = Some(UploadStore::public_path(&stored_name));
    }

    let updated = user::update_profile(
        pool,
        &user.id,
        &display_name,
        handle.as_deref(),
        bio.as_deref(),
        avatar_path.as_deref(),
    )
    .await
    .map_err(|err| match err {
        database::DatabaseError::AlreadyExists {
            entity: "Handle", ..
        } => ApiError::Conflict("Handle is already taken.".to_string()),
        other => ApiError::Database(other),
    })?;

    info!(user = %updated.id, "Profile updated");

    Ok(Json(UpdatedProfile {
        user: updated.summary(),
    }))
}

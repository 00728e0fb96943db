//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// UUID string.
    pub id: String,
    /// Unique login email, stored lowercase.
    pub email: String,
    /// bcrypt hash of the password.
    pub password_hash: String,
    /// Display name shown across the app.
    pub display_name: String,
    /// Optional unique handle, stored lowercase (unique case-insensitively).
    pub handle: Option<String>,
    /// Optional short bio.
    pub bio: Option<String>,
    /// Optional avatar path under the uploads directory.
    pub image: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl User {
    /// The public summary of this account.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            handle: self.handle.clone(),
            image: self.image.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// Input for creating an account. Timestamps are assigned by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub handle: Option<String>,
}

/// The subset of account fields exposed to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    pub handle: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// A bearer-token session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
}

/// An established, symmetric friendship between two accounts.
///
/// The pair is normalized so `user_a_id` always sorts before `user_b_id`;
/// at most one row exists per unordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: String,
    pub user_a_id: String,
    pub user_b_id: String,
    pub created_at: String,
}

/// Lifecycle of a friend request.
///
/// PENDING is the only non-terminal state for a row, but a DECLINED or
/// CANCELED row can be reset to PENDING by a later re-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Canceled,
}

/// A directed friend request from `requester_id` to `recipient_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FriendRequest,
    Upload,
}

/// A user-facing notification record.
///
/// `metadata` holds a JSON payload tagged by variant (see
/// [`crate::notification::NotificationMetadata`]). A null `read_at` means
/// unread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub metadata: Option<String>,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// An uploaded photo. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub owner_id: String,
    pub caption: Option<String>,
    pub file_path: String,
    pub created_at: String,
}

/// A photo joined with its owner's summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoWithOwner {
    pub photo: Photo,
    pub owner: UserSummary,
}

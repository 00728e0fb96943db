//! Notification records and fan-out helpers.
//!
//! Every notification id is derived from the triggering event's natural
//! key, so replaying an event (a retried accept, a re-sent request)
//! upserts the existing row instead of inserting a duplicate. An upsert
//! resets the row to unread.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{Notification, NotificationType, UserSummary};

/// Compact account summary embedded in notification payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: String,
    pub display_name: String,
    pub handle: Option<String>,
    pub image: Option<String>,
}

impl From<&UserSummary> for PersonSummary {
    fn from(summary: &UserSummary) -> Self {
        Self {
            id: summary.id.clone(),
            display_name: summary.display_name.clone(),
            handle: summary.handle.clone(),
            image: summary.image.clone(),
        }
    }
}

/// Compact photo summary embedded in upload notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub caption: Option<String>,
    pub file_path: String,
}

/// Tagged notification payload. The `variant` tag is part of the stored
/// format; unknown variants are dropped at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum NotificationMetadata {
    #[serde(rename_all = "camelCase")]
    IncomingRequest {
        request_id: String,
        from: PersonSummary,
    },
    #[serde(rename_all = "camelCase")]
    RequestAccepted {
        request_id: String,
        by: PersonSummary,
    },
    #[serde(rename_all = "camelCase")]
    FriendUpload {
        photo_id: String,
        photo: PhotoRef,
        user: PersonSummary,
    },
}

/// Deterministic id for the recipient-side notification of a request.
pub fn incoming_request_id(request_id: &str) -> String {
    format!("notif-{request_id}-incoming")
}

/// Deterministic id for the requester-side notification of an accept.
pub fn request_accepted_id(request_id: &str) -> String {
    format!("notif-{request_id}-accepted")
}

/// Deterministic id for one friend's notification of an upload.
pub fn friend_upload_id(photo_id: &str, friend_id: &str) -> String {
    format!("notif-{photo_id}-{friend_id}-upload")
}

/// Encode a payload to its stored JSON form.
pub fn encode_metadata(metadata: &NotificationMetadata) -> Result<String> {
    Ok(serde_json::to_string(metadata)?)
}

/// Parse a stored payload. Returns `None` for missing, malformed, or
/// unknown-variant metadata rather than failing the read path.
pub fn parse_metadata(value: Option<&str>) -> Option<NotificationMetadata> {
    let value = value?;
    match serde_json::from_str(value) {
        Ok(metadata) => Some(metadata),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to parse notification metadata");
            None
        }
    }
}

/// Upsert a notification by its deterministic id.
pub async fn upsert(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    kind: NotificationType,
    metadata: &NotificationMetadata,
) -> Result<()> {
    let mut conn = pool.acquire().await?;
    upsert_with(&mut conn, id, user_id, kind, metadata).await
}

/// Upsert within an open transaction. Replaying the same event replaces
/// the payload and resets the row to unread.
pub(crate) async fn upsert_with(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
    kind: NotificationType,
    metadata: &NotificationMetadata,
) -> Result<()> {
    let payload = encode_metadata(metadata)?;

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, type, metadata)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            type = excluded.type,
            metadata = excluded.metadata,
            read_at = NULL
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(kind)
    .bind(payload)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// List an account's notifications, newest first.
pub async fn list(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, type, metadata, read_at, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// Count an account's unread notifications.
pub async fn unread_count(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM notifications
        WHERE user_id = ? AND read_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Mark specific unread notifications read. Ids not owned by the
/// account, already read, or unknown are ignored. Returns the number of
/// rows updated.
pub async fn mark_read(pool: &SqlitePool, user_id: &str, ids: &[String]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        r#"
        UPDATE notifications
        SET read_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE user_id = ? AND read_at IS NULL AND id IN ({placeholders})
        "#
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for id in ids {
        query = query.bind(id);
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Mark all of an account's unread notifications read.
pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET read_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE user_id = ? AND read_at IS NULL
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Mark an account's unread friend-request notifications for one
/// request read, matched by the request id embedded in the payload.
pub(crate) async fn mark_request_read_with(
    conn: &mut SqliteConnection,
    user_id: &str,
    request_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE notifications
        SET read_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE user_id = ?
          AND read_at IS NULL
          AND type = 'FRIEND_REQUEST'
          AND metadata LIKE '%' || ? || '%'
        "#,
    )
    .bind(user_id)
    .bind(request_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{seed_user, test_db};

    fn sample_metadata() -> NotificationMetadata {
        NotificationMetadata::IncomingRequest {
            request_id: "req-1".to_string(),
            from: PersonSummary {
                id: "u2".to_string(),
                display_name: "Bob".to_string(),
                handle: Some("bob".to_string()),
                image: None,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_resets_unread() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let id = incoming_request_id("req-1");
        let metadata = sample_metadata();

        upsert(db.pool(), &id, "u1", NotificationType::FriendRequest, &metadata)
            .await
            .unwrap();
        assert_eq!(mark_all_read(db.pool(), "u1").await.unwrap(), 1);
        assert_eq!(unread_count(db.pool(), "u1").await.unwrap(), 0);

        // Replaying the event re-surfaces the same row, unread.
        upsert(db.pool(), &id, "u1", NotificationType::FriendRequest, &metadata)
            .await
            .unwrap();
        let notifications = list(db.pool(), "u1", 10).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].read_at, None);
        assert_eq!(unread_count(db.pool(), "u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_scoped_to_owner() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;
        seed_user(&db, "u2", "Bob").await;

        let id = incoming_request_id("req-1");
        upsert(db.pool(), &id, "u1", NotificationType::FriendRequest, &sample_metadata())
            .await
            .unwrap();

        // Wrong owner updates nothing.
        assert_eq!(
            mark_read(db.pool(), "u2", &[id.clone()]).await.unwrap(),
            0
        );
        assert_eq!(mark_read(db.pool(), "u1", &[id.clone()]).await.unwrap(), 1);
        // Already read.
        assert_eq!(mark_read(db.pool(), "u1", &[id]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_request_read_matches_embedded_id() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        upsert(
            db.pool(),
            &incoming_request_id("req-1"),
            "u1",
            NotificationType::FriendRequest,
            &sample_metadata(),
        )
        .await
        .unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            mark_request_read_with(&mut conn, "u1", "req-other")
                .await
                .unwrap();
        }
        assert_eq!(unread_count(db.pool(), "u1").await.unwrap(), 1);

        {
            let mut conn = db.pool().acquire().await.unwrap();
            mark_request_read_with(&mut conn, "u1", "req-1").await.unwrap();
        }
        assert_eq!(unread_count(db.pool(), "u1").await.unwrap(), 0);
    }

    #[test]
    fn test_metadata_round_trip() {
        let encoded = encode_metadata(&sample_metadata()).unwrap();
        assert!(encoded.contains(r#""variant":"incoming_request""#));
        assert!(encoded.contains(r#""requestId":"req-1""#));
        assert!(encoded.contains(r#""displayName":"Bob""#));

        let parsed = parse_metadata(Some(&encoded)).unwrap();
        assert_eq!(parsed, sample_metadata());
    }

    #[test]
    fn test_metadata_rejects_unknown_variant() {
        assert!(parse_metadata(None).is_none());
        assert!(parse_metadata(Some("not json")).is_none());
        assert!(parse_metadata(Some(r#"{"variant":"mystery"}"#)).is_none());
    }
}

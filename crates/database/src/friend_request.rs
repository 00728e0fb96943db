//! Friend request workflow.
//!
//! A request is a directed edge with a PENDING → {ACCEPTED, DECLINED,
//! CANCELED} lifecycle and at most one row per ordered (requester,
//! recipient) pair. The multi-step transitions (accept, decline, the
//! pending upsert with its notification) run inside one transaction so
//! no partial state is ever visible; status updates are guarded on
//! `status = 'PENDING'` so a concurrent transition loses cleanly.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{FriendRequest, Friendship, NotificationType, RequestStatus, UserSummary};
use crate::notification::{self, NotificationMetadata, PersonSummary};
use crate::friendship;

const REQUEST_COLUMNS: &str = "id, requester_id, recipient_id, status, created_at, updated_at";

/// A pending request joined with the counterpart account's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub id: String,
    pub created_at: String,
    pub user: UserSummary,
}

/// Outcome of canceling a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The row was PENDING and transitioned to CANCELED.
    Canceled,
    /// The row was already terminal and was deleted outright.
    Removed,
}

#[derive(FromRow)]
struct PendingRow {
    id: String,
    created_at: String,
    user_id: String,
    display_name: String,
    handle: Option<String>,
    image: Option<String>,
    bio: Option<String>,
}

impl From<PendingRow> for PendingRequest {
    fn from(row: PendingRow) -> Self {
        PendingRequest {
            id: row.id,
            created_at: row.created_at,
            user: UserSummary {
                id: row.user_id,
                display_name: row.display_name,
                handle: row.handle,
                image: row.image,
                bio: row.bio,
            },
        }
    }
}

/// Get a request by id.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<FriendRequest>> {
    let request = sqlx::query_as::<_, FriendRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Get the request for an exact ordered pair, whatever its status.
pub async fn find_by_pair(
    pool: &SqlitePool,
    requester_id: &str,
    recipient_id: &str,
) -> Result<Option<FriendRequest>> {
    let request = sqlx::query_as::<_, FriendRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE requester_id = ? AND recipient_id = ?"
    ))
    .bind(requester_id)
    .bind(recipient_id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// List pending requests addressed to an account, newest first, with
/// the requester's summary.
pub async fn list_incoming_pending(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<PendingRequest>> {
    let rows = sqlx::query_as::<_, PendingRow>(
        r#"
        SELECT r.id, r.created_at,
               u.id AS user_id, u.display_name, u.handle, u.image, u.bio
        FROM friend_requests r
        INNER JOIN users u ON u.id = r.requester_id
        WHERE r.recipient_id = ? AND r.status = 'PENDING'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PendingRequest::from).collect())
}

/// List pending requests sent by an account, newest first, with the
/// recipient's summary.
pub async fn list_outgoing_pending(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<PendingRequest>> {
    let rows = sqlx::query_as::<_, PendingRow>(
        r#"
        SELECT r.id, r.created_at,
               u.id AS user_id, u.display_name, u.handle, u.image, u.bio
        FROM friend_requests r
        INNER JOIN users u ON u.id = r.recipient_id
        WHERE r.requester_id = ? AND r.status = 'PENDING'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PendingRequest::from).collect())
}

/// All pending (requester, recipient) pairs touching an account, for
/// relationship-status computation.
pub async fn list_pending_involving(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<(String, String)>> {
    let pairs = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT requester_id, recipient_id
        FROM friend_requests
        WHERE status = 'PENDING' AND (requester_id = ?1 OR recipient_id = ?1)
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(pairs)
}

/// Upsert a PENDING request for the ordered pair and notify the
/// recipient, in one transaction.
///
/// A prior DECLINED or CANCELED row for the same pair is silently reset
/// to PENDING with a refreshed `updated_at`; the row keeps its id, so
/// the recipient's notification is re-surfaced unread rather than
/// duplicated. Callers are responsible for the precondition checks
/// (self-request, existing friendship, already-pending).
pub async fn upsert_pending(
    pool: &SqlitePool,
    requester: &UserSummary,
    recipient_id: &str,
) -> Result<FriendRequest> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO friend_requests (id, requester_id, recipient_id, status)
        VALUES (?, ?, ?, 'PENDING')
        ON CONFLICT(requester_id, recipient_id) DO UPDATE SET
            status = 'PENDING',
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&requester.id)
    .bind(recipient_id)
    .execute(&mut *tx)
    .await?;

    let request = sqlx::query_as::<_, FriendRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE requester_id = ? AND recipient_id = ?"
    ))
    .bind(&requester.id)
    .bind(recipient_id)
    .fetch_one(&mut *tx)
    .await?;

    notification::upsert_with(
        &mut *tx,
        &notification::incoming_request_id(&request.id),
        recipient_id,
        NotificationType::FriendRequest,
        &NotificationMetadata::IncomingRequest {
            request_id: request.id.clone(),
            from: PersonSummary::from(requester),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(request)
}

/// Accept a PENDING request: mark it ACCEPTED, record the friendship,
/// retire the recipient's incoming notification, and notify the
/// requester. One transaction; all four effects or none.
///
/// `responder` is the account accepting: the recipient for a normal
/// accept, or the caller resolving a mutual request. Fails with
/// [`DatabaseError::NotPending`] if the row was transitioned
/// concurrently.
pub async fn accept(
    pool: &SqlitePool,
    request: &FriendRequest,
    responder: &UserSummary,
) -> Result<Friendship> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE friend_requests
        SET status = 'ACCEPTED', updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ? AND status = 'PENDING'
        "#,
    )
    .bind(&request.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotPending {
            entity: "FriendRequest",
            id: request.id.clone(),
        });
    }

    let friendship =
        friendship::upsert_with(&mut *tx, &request.requester_id, &request.recipient_id).await?;

    notification::mark_request_read_with(&mut *tx, &request.recipient_id, &request.id).await?;

    notification::upsert_with(
        &mut *tx,
        &notification::request_accepted_id(&request.id),
        &request.requester_id,
        NotificationType::FriendRequest,
        &NotificationMetadata::RequestAccepted {
            request_id: request.id.clone(),
            by: PersonSummary::from(responder),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(friendship)
}

/// Decline a PENDING request and retire the recipient's incoming
/// notification. Fails with [`DatabaseError::NotPending`] if the row
/// was transitioned concurrently.
pub async fn decline(pool: &SqlitePool, request: &FriendRequest) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE friend_requests
        SET status = 'DECLINED', updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ? AND status = 'PENDING'
        "#,
    )
    .bind(&request.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotPending {
            entity: "FriendRequest",
            id: request.id.clone(),
        });
    }

    notification::mark_request_read_with(&mut *tx, &request.recipient_id, &request.id).await?;

    tx.commit().await?;
    Ok(())
}

/// Cancel a request as its requester.
///
/// A PENDING row transitions to CANCELED and is retained; a row already
/// in a terminal state is deleted outright as stale cleanup.
pub async fn cancel(pool: &SqlitePool, request: &FriendRequest) -> Result<CancelOutcome> {
    if request.status == RequestStatus::Pending {
        let result = sqlx::query(
            r#"
            UPDATE friend_requests
            SET status = 'CANCELED', updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(&request.id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(CancelOutcome::Canceled);
        }
        // Lost a race with accept/decline; fall through to cleanup.
    }

    sqlx::query(
        r#"
        DELETE FROM friend_requests
        WHERE id = ?
        "#,
    )
    .bind(&request.id)
    .execute(pool)
    .await?;

    Ok(CancelOutcome::Removed)
}

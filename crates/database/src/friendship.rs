//! Friendship ledger operations.
//!
//! One row per unordered pair of accounts. Rows store the pair normalized
//! (the lexicographically smaller id in `user_a_id`) so the unique
//! constraint covers both query directions; [`normalize_pair`] is the
//! single place that ordering is decided.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Friendship;

/// Order two distinct account ids into the stored (user_a, user_b) form.
///
/// Callers must reject self-pairs before reaching the ledger; the
/// schema's CHECK constraint is the backstop for degenerate rows.
pub fn normalize_pair<'a>(user_id: &'a str, other_id: &'a str) -> (&'a str, &'a str) {
    if user_id < other_id {
        (user_id, other_id)
    } else {
        (other_id, user_id)
    }
}

/// A friend as seen from one side of a friendship, with the ledger
/// row's creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub id: String,
    pub display_name: String,
    pub handle: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub since: String,
}

/// Create the friendship row for a pair, tolerating a row that already
/// exists from a concurrent accept. Returns the canonical row.
pub async fn upsert(pool: &SqlitePool, user_id: &str, other_id: &str) -> Result<Friendship> {
    let mut conn = pool.acquire().await?;
    upsert_with(&mut conn, user_id, other_id).await
}

pub(crate) async fn upsert_with(
    conn: &mut SqliteConnection,
    user_id: &str,
    other_id: &str,
) -> Result<Friendship> {
    let (user_a, user_b) = normalize_pair(user_id, other_id);

    sqlx::query(
        r#"
        INSERT INTO friendships (id, user_a_id, user_b_id)
        VALUES (?, ?, ?)
        ON CONFLICT(user_a_id, user_b_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_a)
    .bind(user_b)
    .execute(&mut *conn)
    .await?;

    let friendship = sqlx::query_as::<_, Friendship>(
        r#"
        SELECT id, user_a_id, user_b_id, created_at
        FROM friendships
        WHERE user_a_id = ? AND user_b_id = ?
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_one(&mut *conn)
    .await?;

    Ok(friendship)
}

/// Look up the friendship for a pair, in either direction.
pub async fn get(
    pool: &SqlitePool,
    user_id: &str,
    other_id: &str,
) -> Result<Option<Friendship>> {
    let (user_a, user_b) = normalize_pair(user_id, other_id);

    let friendship = sqlx::query_as::<_, Friendship>(
        r#"
        SELECT id, user_a_id, user_b_id, created_at
        FROM friendships
        WHERE user_a_id = ? AND user_b_id = ?
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    Ok(friendship)
}

/// Check whether two accounts are friends.
pub async fn exists(pool: &SqlitePool, user_id: &str, other_id: &str) -> Result<bool> {
    Ok(get(pool, user_id, other_id).await?.is_some())
}

/// List an account's friends with their summaries, newest friendship first.
pub async fn list_friends(pool: &SqlitePool, user_id: &str) -> Result<Vec<FriendEntry>> {
    let friends = sqlx::query_as::<_, FriendEntry>(
        r#"
        SELECT u.id, u.display_name, u.handle, u.image, u.bio, f.created_at AS since
        FROM friendships f
        INNER JOIN users u
            ON u.id = CASE WHEN f.user_a_id = ?1 THEN f.user_b_id ELSE f.user_a_id END
        WHERE f.user_a_id = ?1 OR f.user_b_id = ?1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(friends)
}

/// Ids of all friends of an account.
pub async fn friend_ids(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT CASE WHEN user_a_id = ?1 THEN user_b_id ELSE user_a_id END
        FROM friendships
        WHERE user_a_id = ?1 OR user_b_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

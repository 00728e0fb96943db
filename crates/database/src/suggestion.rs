//! Mutual-connection ranking.
//!
//! Computed at read time against the current friendship graph; there is
//! no persisted suggestion entity. For a viewer, every friendship edge
//! incident to one of their friends nominates the other endpoint as a
//! candidate, so the number of edges per candidate is exactly the
//! number of shared friends.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::Result;
use crate::models::UserSummary;

/// A suggested connection and how many friends are shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(flatten)]
    pub user: UserSummary,
    pub mutual_count: i64,
}

#[derive(FromRow)]
struct SuggestionRow {
    id: String,
    display_name: String,
    handle: Option<String>,
    image: Option<String>,
    bio: Option<String>,
    mutual_count: i64,
}

/// Rank non-friends of `user_id` by shared-friend count, descending,
/// ties broken by ascending display name, truncated to `limit`.
///
/// The viewer and their existing friends are excluded; candidates with
/// no shared friends never appear.
pub async fn mutual_connections(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Suggestion>> {
    let rows = sqlx::query_as::<_, SuggestionRow>(
        r#"
        WITH friends(friend_id) AS (
            SELECT CASE WHEN user_a_id = ?1 THEN user_b_id ELSE user_a_id END
            FROM friendships
            WHERE user_a_id = ?1 OR user_b_id = ?1
        )
        SELECT u.id, u.display_name, u.handle, u.image, u.bio,
               COUNT(*) AS mutual_count
        FROM friendships f
        INNER JOIN friends ON friends.friend_id IN (f.user_a_id, f.user_b_id)
        INNER JOIN users u
            ON u.id = CASE WHEN f.user_a_id = friends.friend_id
                           THEN f.user_b_id ELSE f.user_a_id END
        WHERE u.id != ?1
          AND u.id NOT IN (SELECT friend_id FROM friends)
        GROUP BY u.id
        ORDER BY mutual_count DESC, u.display_name ASC
        LIMIT ?2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Suggestion {
            user: UserSummary {
                id: row.id,
                display_name: row.display_name,
                handle: row.handle,
                image: row.image,
                bio: row.bio,
            },
            mutual_count: row.mutual_count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friendship;
    use crate::test_util::{seed_user, test_db};

    #[tokio::test]
    async fn test_ranks_by_shared_friends() {
        let db = test_db().await;
        seed_user(&db, "me", "Me").await;
        seed_user(&db, "f1", "Friend One").await;
        seed_user(&db, "f2", "Friend Two").await;
        seed_user(&db, "c1", "Zoe").await;
        seed_user(&db, "c2", "Adam").await;
        seed_user(&db, "x1", "Stranger").await;

        // Me ~ f1, f2. Zoe shares both; Adam shares one; Stranger none.
        friendship::upsert(db.pool(), "me", "f1").await.unwrap();
        friendship::upsert(db.pool(), "me", "f2").await.unwrap();
        friendship::upsert(db.pool(), "c1", "f1").await.unwrap();
        friendship::upsert(db.pool(), "c1", "f2").await.unwrap();
        friendship::upsert(db.pool(), "c2", "f1").await.unwrap();

        let suggestions = mutual_connections(db.pool(), "me", 6).await.unwrap();
        let ranked: Vec<(&str, i64)> = suggestions
            .iter()
            .map(|s| (s.user.id.as_str(), s.mutual_count))
            .collect();
        assert_eq!(ranked, vec![("c1", 2), ("c2", 1)]);
    }

    #[tokio::test]
    async fn test_excludes_self_and_existing_friends() {
        let db = test_db().await;
        seed_user(&db, "me", "Me").await;
        seed_user(&db, "f1", "Friend One").await;
        seed_user(&db, "f2", "Friend Two").await;

        // f1 and f2 are both my friends and each other's; nobody else.
        friendship::upsert(db.pool(), "me", "f1").await.unwrap();
        friendship::upsert(db.pool(), "me", "f2").await.unwrap();
        friendship::upsert(db.pool(), "f1", "f2").await.unwrap();

        let suggestions = mutual_connections(db.pool(), "me", 6).await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_tie_breaks_on_display_name() {
        let db = test_db().await;
        seed_user(&db, "me", "Me").await;
        seed_user(&db, "f1", "Friend One").await;
        seed_user(&db, "zz", "Zed").await;
        seed_user(&db, "aa", "Amy").await;

        friendship::upsert(db.pool(), "me", "f1").await.unwrap();
        friendship::upsert(db.pool(), "zz", "f1").await.unwrap();
        friendship::upsert(db.pool(), "aa", "f1").await.unwrap();

        let suggestions = mutual_connections(db.pool(), "me", 6).await.unwrap();
        let names: Vec<&str> = suggestions
            .iter()
            .map(|s| s.user.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }

    #[tokio::test]
    async fn test_truncates_to_limit() {
        let db = test_db().await;
        seed_user(&db, "me", "Me").await;
        seed_user(&db, "hub", "Hub").await;
        friendship::upsert(db.pool(), "me", "hub").await.unwrap();

        for n in 0..5 {
            let id = format!("c{n}");
            seed_user(&db, &id, &format!("Candidate {n}")).await;
            friendship::upsert(db.pool(), &id, "hub").await.unwrap();
        }

        let suggestions = mutual_connections(db.pool(), "me", 3).await.unwrap();
        assert_eq!(suggestions.len(), 3);
    }
}

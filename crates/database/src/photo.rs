//! Photo storage and the cursor-paginated feed.
//!
//! The feed is ordered by `(created_at DESC, id DESC)`; the id breaks
//! timestamp ties so the order is total. A page probe fetches one row
//! past the requested size: the extra row's id becomes the cursor and
//! names the first row of the next page, which keeps pages stable while
//! new photos land at the head (no offset drift or skipped rows).

use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Photo, PhotoWithOwner, UserSummary};

/// A feed page and the cursor for the next one, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub photos: Vec<PhotoWithOwner>,
    pub next_cursor: Option<String>,
}

#[derive(FromRow)]
struct FeedRow {
    id: String,
    owner_id: String,
    caption: Option<String>,
    file_path: String,
    created_at: String,
    display_name: String,
    handle: Option<String>,
    image: Option<String>,
    bio: Option<String>,
}

impl From<FeedRow> for PhotoWithOwner {
    fn from(row: FeedRow) -> Self {
        PhotoWithOwner {
            owner: UserSummary {
                id: row.owner_id.clone(),
                display_name: row.display_name,
                handle: row.handle,
                image: row.image,
                bio: row.bio,
            },
            photo: Photo {
                id: row.id,
                owner_id: row.owner_id,
                caption: row.caption,
                file_path: row.file_path,
                created_at: row.created_at,
            },
        }
    }
}

/// Record an uploaded photo.
pub async fn create(
    pool: &SqlitePool,
    owner_id: &str,
    caption: Option<&str>,
    file_path: &str,
) -> Result<Photo> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO photos (id, owner_id, caption, file_path)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(owner_id)
    .bind(caption)
    .bind(file_path)
    .execute(pool)
    .await?;

    get(pool, &id).await?.ok_or(DatabaseError::NotFound {
        entity: "Photo",
        id,
    })
}

/// Get a photo by id.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Photo>> {
    let photo = sqlx::query_as::<_, Photo>(
        r#"
        SELECT id, owner_id, caption, file_path, created_at
        FROM photos
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(photo)
}

/// Fetch one feed page.
///
/// `after` is the `(created_at, id)` position of the cursor photo; the
/// page starts at that row inclusively. `None` starts at the head.
pub async fn feed_page(
    pool: &SqlitePool,
    limit: i64,
    after: Option<(&str, &str)>,
) -> Result<FeedPage> {
    let probe = limit + 1;

    let rows = match after {
        None => {
            sqlx::query_as::<_, FeedRow>(
                r#"
                SELECT p.id, p.owner_id, p.caption, p.file_path, p.created_at,
                       u.display_name, u.handle, u.image, u.bio
                FROM photos p
                INNER JOIN users u ON u.id = p.owner_id
                ORDER BY p.created_at DESC, p.id DESC
                LIMIT ?
                "#,
            )
            .bind(probe)
            .fetch_all(pool)
            .await?
        }
        Some((created_at, id)) => {
            sqlx::query_as::<_, FeedRow>(
                r#"
                SELECT p.id, p.owner_id, p.caption, p.file_path, p.created_at,
                       u.display_name, u.handle, u.image, u.bio
                FROM photos p
                INNER JOIN users u ON u.id = p.owner_id
                WHERE p.created_at < ?1 OR (p.created_at = ?1 AND p.id <= ?2)
                ORDER BY p.created_at DESC, p.id DESC
                LIMIT ?3
                "#,
            )
            .bind(created_at)
            .bind(id)
            .bind(probe)
            .fetch_all(pool)
            .await?
        }
    };

    let mut photos: Vec<PhotoWithOwner> = rows.into_iter().map(PhotoWithOwner::from).collect();

    let next_cursor = if photos.len() as i64 > limit {
        photos.pop().map(|extra| extra.photo.id)
    } else {
        None
    };

    Ok(FeedPage {
        photos,
        next_cursor,
    })
}

/// An owner's most recent photos.
pub async fn list_for_owner(pool: &SqlitePool, owner_id: &str, limit: i64) -> Result<Vec<Photo>> {
    let photos = sqlx::query_as::<_, Photo>(
        r#"
        SELECT id, owner_id, caption, file_path, created_at
        FROM photos
        WHERE owner_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(photos)
}

/// Count an owner's photos.
pub async fn count_for_owner(pool: &SqlitePool, owner_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM photos WHERE owner_id = ?
        "#,
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{seed_user, test_db};
    use crate::Database;

    /// Insert a photo with a controlled timestamp so ordering is exact.
    async fn seed_photo(db: &Database, owner: &str, stamp: &str) -> Photo {
        let photo = create(db.pool(), owner, None, "uploads/p.jpg").await.unwrap();
        sqlx::query("UPDATE photos SET created_at = ? WHERE id = ?")
            .bind(stamp)
            .bind(&photo.id)
            .execute(db.pool())
            .await
            .unwrap();
        get(db.pool(), &photo.id).await.unwrap().unwrap()
    }

    async fn paginate_all(db: &Database, limit: i64) -> Vec<String> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let after = match &cursor {
                None => None,
                Some(c) => {
                    let photo = get(db.pool(), c).await.unwrap().unwrap();
                    Some((photo.created_at.clone(), photo.id.clone()))
                }
            };
            let page = feed_page(
                db.pool(),
                limit,
                after.as_ref().map(|(c, i)| (c.as_str(), i.as_str())),
            )
            .await
            .unwrap();
            ids.extend(page.photos.iter().map(|p| p.photo.id.clone()));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        ids
    }

    #[tokio::test]
    async fn test_feed_orders_newest_first_with_owner() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        seed_photo(&db, "u1", "2024-01-01 10:00:00.000").await;
        let newest = seed_photo(&db, "u1", "2024-01-03 10:00:00.000").await;
        seed_photo(&db, "u1", "2024-01-02 10:00:00.000").await;

        let page = feed_page(db.pool(), 9, None).await.unwrap();
        assert_eq!(page.photos.len(), 3);
        assert_eq!(page.photos[0].photo.id, newest.id);
        assert_eq!(page.photos[0].owner.display_name, "Alice");
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_pagination_covers_everything_exactly_once() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let mut expected = Vec::new();
        for day in 1..=25 {
            let photo = seed_photo(&db, "u1", &format!("2024-01-{:02} 08:00:00.000", day)).await;
            expected.push(photo.id);
        }
        expected.reverse();

        for limit in [4, 9, 25, 40] {
            let ids = paginate_all(&db, limit).await;
            assert_eq!(ids, expected, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn test_pagination_stable_under_head_inserts() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let mut existing = Vec::new();
        for day in 1..=10 {
            let photo = seed_photo(&db, "u1", &format!("2024-01-{:02} 08:00:00.000", day)).await;
            existing.push(photo.id);
        }
        existing.reverse();

        // First page of four.
        let page = feed_page(db.pool(), 4, None).await.unwrap();
        let mut seen: Vec<String> = page.photos.iter().map(|p| p.photo.id.clone()).collect();
        let mut cursor = page.next_cursor.unwrap();

        // New photos land at the head between fetches.
        seed_photo(&db, "u1", "2024-02-01 08:00:00.000").await;
        seed_photo(&db, "u1", "2024-02-02 08:00:00.000").await;

        loop {
            let photo = get(db.pool(), &cursor).await.unwrap().unwrap();
            let page = feed_page(db.pool(), 4, Some((&photo.created_at, &photo.id)))
                .await
                .unwrap();
            seen.extend(page.photos.iter().map(|p| p.photo.id.clone()));
            match page.next_cursor {
                Some(next) => cursor = next,
                None => break,
            }
        }

        // Every pre-existing photo appears exactly once, in order.
        assert_eq!(seen, existing);
    }

    #[tokio::test]
    async fn test_tie_broken_by_id() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let stamp = "2024-01-01 08:00:00.000";
        let mut ids: Vec<String> = Vec::new();
        for _ in 0..5 {
            ids.push(seed_photo(&db, "u1", stamp).await.id);
        }
        ids.sort_unstable();
        ids.reverse();

        let singles = paginate_all(&db, 2).await;
        assert_eq!(singles, ids);
    }

    #[tokio::test]
    async fn test_owner_listings() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;
        seed_user(&db, "u2", "Bob").await;

        seed_photo(&db, "u1", "2024-01-01 08:00:00.000").await;
        seed_photo(&db, "u1", "2024-01-02 08:00:00.000").await;
        seed_photo(&db, "u2", "2024-01-03 08:00:00.000").await;

        assert_eq!(count_for_owner(db.pool(), "u1").await.unwrap(), 2);
        assert_eq!(count_for_owner(db.pool(), "u2").await.unwrap(), 1);

        let photos = list_for_owner(db.pool(), "u1", 9).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos[0].created_at > photos[1].created_at);
    }
}

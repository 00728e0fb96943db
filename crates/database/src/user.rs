//! Account CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewUser, User, UserSummary};

const USER_COLUMNS: &str = "id, email, password_hash, display_name, handle, bio, image, created_at";

/// Create a new account.
///
/// Email and handle uniqueness are enforced by the schema; the returned
/// error distinguishes which constraint fired.
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, handle)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.display_name)
    .bind(&user.handle)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                if db_err.message().contains("users.handle") {
                    return DatabaseError::AlreadyExists {
                        entity: "Handle",
                        id: user.handle.clone().unwrap_or_default(),
                    };
                }
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: user.email.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_user(pool, &user.id).await
}

/// Get an account by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get an account by login email, if registered.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Get the public summary of an account, if it exists.
pub async fn get_summary(pool: &SqlitePool, id: &str) -> Result<Option<UserSummary>> {
    let summary = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, display_name, handle, image, bio
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(summary)
}

/// Check whether a handle is taken, optionally ignoring one account
/// (the caller editing their own profile). Case-insensitive.
pub async fn handle_exists(
    pool: &SqlitePool,
    handle: &str,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM users
        WHERE handle = ? AND id != COALESCE(?, '')
        "#,
    )
    .bind(handle)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Update profile fields.
///
/// `image` is left untouched when `None`; the other fields are written
/// as given (a `None` handle or bio clears the column).
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    display_name: &str,
    handle: Option<&str>,
    bio: Option<&str>,
    image: Option<&str>,
) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET display_name = ?, handle = ?, bio = ?, image = COALESCE(?, image)
        WHERE id = ?
        "#,
    )
    .bind(display_name)
    .bind(handle)
    .bind(bio)
    .bind(image)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Handle",
                    id: handle.unwrap_or_default().to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    get_user(pool, id).await
}

/// Search accounts by display name, handle, or email substring,
/// excluding the searching account. Case-insensitive, capped at `limit`.
pub async fn search(
    pool: &SqlitePool,
    query: &str,
    exclude_id: &str,
    limit: i64,
) -> Result<Vec<UserSummary>> {
    let pattern = format!("%{}%", escape_like(query));

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, display_name, handle, image, bio
        FROM users
        WHERE id != ?1
          AND (display_name LIKE ?2 ESCAPE '\'
               OR handle LIKE ?2 ESCAPE '\'
               OR email LIKE ?2 ESCAPE '\')
        ORDER BY display_name ASC
        LIMIT ?3
        "#,
    )
    .bind(exclude_id)
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Count registered accounts.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Escape LIKE wildcards in user-provided search input.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{seed_user, test_db};

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let result = create_user(
            db.pool(),
            &NewUser {
                id: "u2".to_string(),
                email: "u1@example.com".to_string(),
                password_hash: "$2b$12$test-hash".to_string(),
                display_name: "Other Alice".to_string(),
                handle: Some("other-alice".to_string()),
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "User", .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_unique_case_insensitive() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let result = create_user(
            db.pool(),
            &NewUser {
                id: "u2".to_string(),
                email: "u2@example.com".to_string(),
                password_hash: "$2b$12$test-hash".to_string(),
                display_name: "Upper".to_string(),
                handle: Some("U1".to_string()),
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "Handle", .. })
        ));

        assert!(handle_exists(db.pool(), "U1", None).await.unwrap());
        assert!(!handle_exists(db.pool(), "u1", Some("u1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_excludes_self_and_matches_substring() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice Adams").await;
        seed_user(&db, "u2", "alicia keys").await;
        seed_user(&db, "u3", "Bob").await;

        let results = search(db.pool(), "ali", "u1", 10).await.unwrap();
        let ids: Vec<_> = results.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u2"]);

        let results = search(db.pool(), "ali", "u3", 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;
        seed_user(&db, "u2", "100% Bob").await;

        let results = search(db.pool(), "%", "u1", 10).await.unwrap();
        let ids: Vec<_> = results.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u2"]);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let updated = update_profile(
            db.pool(),
            "u1",
            "Alice Cooper",
            Some("acooper"),
            Some("Shutterbug."),
            None,
        )
        .await
        .unwrap();
        assert_eq!(updated.display_name, "Alice Cooper");
        assert_eq!(updated.handle.as_deref(), Some("acooper"));
        assert_eq!(updated.bio.as_deref(), Some("Shutterbug."));
        assert_eq!(updated.image, None);

        // Avatar set, other fields preserved on later update
        let updated = update_profile(
            db.pool(),
            "u1",
            "Alice Cooper",
            Some("acooper"),
            None,
            Some("uploads/avatar.png"),
        )
        .await
        .unwrap();
        assert_eq!(updated.image.as_deref(), Some("uploads/avatar.png"));
        assert_eq!(updated.bio, None);
    }

    #[tokio::test]
    async fn test_update_profile_handle_conflict() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;
        seed_user(&db, "u2", "Bob").await;

        let result = update_profile(db.pool(), "u2", "Bob", Some("u1"), None, None).await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "Handle", .. })
        ));
    }
}

//! Bearer-token session storage.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Session, User};

/// Create a session for a user and return it with a fresh token.
pub async fn create_session(pool: &SqlitePool, user_id: &str) -> Result<Session> {
    let token = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id)
        VALUES (?, ?)
        "#,
    )
    .bind(&token)
    .bind(user_id)
    .execute(pool)
    .await?;

    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT token, user_id, created_at
        FROM sessions
        WHERE token = ?
        "#,
    )
    .bind(&token)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Resolve a bearer token to its account, if the session exists.
pub async fn user_for_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.password_hash, u.display_name, u.handle, u.bio, u.image, u.created_at
        FROM users u
        INNER JOIN sessions s ON s.user_id = u.id
        WHERE s.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Delete a session.
///
/// Returns true if a session was deleted, false if none existed.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE token = ?
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{seed_user, test_db};

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = test_db().await;
        seed_user(&db, "u1", "Alice").await;

        let session = create_session(db.pool(), "u1").await.unwrap();
        assert_eq!(session.user_id, "u1");

        let user = user_for_token(db.pool(), &session.token).await.unwrap();
        assert_eq!(user.map(|u| u.id), Some("u1".to_string()));

        assert!(delete_session(db.pool(), &session.token).await.unwrap());
        assert!(!delete_session(db.pool(), &session.token).await.unwrap());

        let user = user_for_token(db.pool(), &session.token).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let db = test_db().await;
        let user = user_for_token(db.pool(), "not-a-token").await.unwrap();
        assert!(user.is_none());
    }
}

//! SQLite persistence layer for Glimmer.
//!
//! This crate provides async database operations for accounts, the
//! friendship ledger, the friend request workflow, notifications, and
//! uploaded photos, using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{models::NewUser, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:glimmer.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create an account
//!     let user = user::create_user(
//!         db.pool(),
//!         &NewUser {
//!             id: "c27fb365-0c84-4cf2-8555-814bb065e448".to_string(),
//!             email: "bob@example.com".to_string(),
//!             password_hash: "$2b$12$...".to_string(),
//!             display_name: "Bob".to_string(),
//!             handle: Some("bob".to_string()),
//!         },
//!     )
//!     .await?;
//!     println!("registered {}", user.display_name);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod friend_request;
pub mod friendship;
pub mod models;
pub mod notification;
pub mod photo;
pub mod session;
pub mod suggestion;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    FriendRequest, Friendship, NewUser, Notification, NotificationType, Photo,
    PhotoWithOwner, RequestStatus, Session, User, UserSummary,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/glimmer.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent request handlers.
    const DEFAULT_POOL_SIZE: u32 = 20;

    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::test_db;
    use super::*;

    #[tokio::test]
    async fn test_user_crud() {
        let db = test_db().await;

        // Create
        let user = user::create_user(
            db.pool(),
            &NewUser {
                id: "test-uuid-123".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "$2b$12$test-hash".to_string(),
                display_name: "Alice".to_string(),
                handle: Some("alice".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(user.display_name, "Alice");
        assert!(!user.created_at.is_empty());

        // Read
        let fetched = user::get_user(db.pool(), "test-uuid-123").await.unwrap();
        assert_eq!(fetched.email, "alice@example.com");

        // Read by email
        let by_email = user::get_user_by_email(db.pool(), "alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.map(|u| u.id), Some("test-uuid-123".to_string()));

        // Missing id
        let result = user::get_user(db.pool(), "missing").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}

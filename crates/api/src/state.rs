//! Application state shared across handlers.

use database::Database;

use crate::uploads::UploadStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Uploaded-file storage.
    pub uploads: UploadStore,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, uploads: UploadStore) -> Self {
        Self { db, uploads }
    }
}

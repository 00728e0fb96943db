//! API server entry point.

use api::config::Config;
use api::state::AppState;
use api::uploads::UploadStore;
use database::Database;
use tower_http::services::ServeDir;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Prepare upload storage
    let uploads = UploadStore::new(&config.upload_dir);
    uploads.ensure_dir().await?;

    // Build application state and router
    let state = AppState::new(db, uploads);
    let app = api::app(state).nest_service("/uploads", ServeDir::new(&config.upload_dir));

    // Start server
    info!(addr = %config.addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

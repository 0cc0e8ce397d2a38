use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use domain::store::InMemoryStore;
use persistence::PgGeofenceStore;
use pettrack_api::app;
use pettrack_api::config::{Config, StorageBackend};
use pettrack_api::middleware::{init_logging, init_metrics};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting PetTrack geofence service v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.socket_addr()?;

    let app = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart");
            app::create_app(config.clone(), Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

            info!("Running database migrations...");
            sqlx::migrate!("../persistence/src/migrations")
                .run(&pool)
                .await?;
            info!("Migrations completed");

            app::create_app(config.clone(), Arc::new(PgGeofenceStore::new(pool)))
        }
    };

    info!(backend = config.storage.backend.as_str(), "Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

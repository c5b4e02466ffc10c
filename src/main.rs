mod api;
mod config;
mod storage;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::storage::MongoStore;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("🚀 Starting Food Review API Server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Database: {}", config.database.name);
    info!("   - Server: {}", config.bind_address());

    // Storage must be ready before the listener accepts traffic
    info!("💾 Connecting to MongoDB...");
    let store = match MongoStore::connect(&config.database.uri, &config.database.name).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };
    info!("✅ Storage ready");

    let app = api::router(AppState::new(store));

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET    /                  - Liveness");
    info!("   GET    /reviews           - List reviews (userEmail, search)");
    info!("   GET    /reviews/top       - Top rated reviews");
    info!("   GET    /reviews/{{id}}      - Get review");
    info!("   POST   /reviews           - Create review");
    info!("   PUT    /reviews/{{id}}      - Update review");
    info!("   DELETE /reviews/{{id}}      - Delete review");
    info!("   POST   /favorites         - Favorite a review");
    info!("   GET    /favorites/{{email}} - List favorites with reviews");
    info!("   DELETE /favorites/{{id}}    - Remove favorite");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}

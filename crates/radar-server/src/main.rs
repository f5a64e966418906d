mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use radar_api::auth::{AppState, AppStateInner};
use radar_session::SessionAuthority;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radar=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let config = ServerConfig::from_env()?;
    let addr = config.addr()?;
    info!(
        "Session format {}, TTL {}h",
        config.session.format,
        config.session.ttl.num_hours()
    );

    // Init database
    let db = radar_db::Database::open(&config.db_path)?;

    // Shared state
    let sessions = SessionAuthority::new(config.session)?;
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        sessions,
        secure_cookies: config.secure_cookies,
    });

    let app = radar_api::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Radar server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

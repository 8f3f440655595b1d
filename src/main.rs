use std::sync::Arc;

use thredd::config::AppConfig;
use thredd::state::AppState;
use thredd::store::postgres::PgStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    tracing::info!("Starting thredd API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; all authenticated routes will reject");
    }

    let store = PgStore::connect(&config.database)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));

    let port = config.server.port;
    let state = AppState::new(Arc::new(store), config);
    let app = thredd::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("thredd API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

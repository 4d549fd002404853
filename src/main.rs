use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use user_service::{app, config::Config, store::UserStore, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("🚀 Starting user-service...");

    let config = Config::from_env().unwrap_or_else(|e| {
        error!("❌ Invalid configuration: {}", e);
        panic!("Cannot load configuration: {}", e);
    });

    let state = AppState::new(UserStore::new());
    info!("✓ UserStore created.");

    let addr = config.socket_addr();
    info!("Binding to {}...", addr);
    let listener = TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!("❌ Failed to bind to {}: {}", addr, e);
        panic!("Cannot bind to {}: {}", addr, e);
    });

    info!("🎉 User service listening on {}", addr);
    if let Err(e) = axum::serve(listener, app(state)).await {
        error!("Server error: {}", e);
    }
}

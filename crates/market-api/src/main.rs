//! # Tools Market
//!
//! REST backend for a tools marketplace.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export MONGODB_URI=mongodb://localhost:27017
//! export ACCESS_TOKEN_SECRET=...
//! export STRIPE_SECRET_KEY=sk_test_...
//!
//! # Run the server
//! tools-market
//! ```

use market_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Store: {} (database {})",
        state.store.backend_name(),
        state.config.db_name
    );
    info!("Payment provider: {}", state.payments.provider_name());

    let app = routes::create_router(state);

    info!("Tools Market listening on http://{}", addr);
    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Token: POST http://{}/login", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  Tools Market
  ━━━━━━━━━━━━━━━━━━━━━━━
  Marketplace REST backend
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}

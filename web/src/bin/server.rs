//! Storefront Server
//!
//! Main server process for the Storefront service.
//!
//! This binary:
//! - Connects to `PostgreSQL` and ensures the schema
//! - Wires the eligibility engine and cart service
//! - Serves the HTTP API and a Prometheus metrics endpoint
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d
//!
//! # Run server
//! cargo run --bin server
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use storefront_web::{build_router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🛒 Starting Storefront Server...");

    // Load configuration
    let config = Config::from_env();
    tracing::info!(
        postgres = %config.postgres.url,
        vip_prefix = %config.vip.code_prefix,
        cooldown_months = config.vip.cooldown_months,
        selection_ratio = config.vip.selection_ratio,
        "Configuration loaded"
    );

    // Metrics exporter
    let metrics_addr: SocketAddr =
        format!("{}:{}", config.server.metrics_host, config.server.metrics_port).parse()?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()?;
    storefront_web::metrics::register_business_metrics();
    tracing::info!(%metrics_addr, "✓ Prometheus exporter listening");

    // Wire state (connects to PostgreSQL and ensures the schema)
    let state = AppState::connect(&config).await?;
    tracing::info!("✓ Stores connected");

    // Serve
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "🛒 Storefront Server is running!");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down gracefully...");
        })
        .await?;

    Ok(())
}

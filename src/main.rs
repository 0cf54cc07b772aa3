//! Aura Storefront - cart, pricing and checkout service

use anyhow::Result;
use aura_storefront::http::{router, AppState};
use aura_storefront::services::{EventPublisher, LogPublisher, NatsPublisher};
use aura_storefront::storage::{MemorySessions, PgSessions, SessionStores};
use aura_storefront::{Services, StorefrontConfig};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = StorefrontConfig::from_env()?;

    let sessions: Arc<dyn SessionStores> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgSessions::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, carts and orders are kept in memory");
            Arc::new(MemorySessions::new())
        }
    };

    let publisher: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Arc::new(NatsPublisher::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, order events will only be logged");
                Arc::new(LogPublisher)
            }
        },
        None => Arc::new(LogPublisher),
    };

    let shutdown = CancellationToken::new();
    let state = AppState { sessions, services: Services::from_config(&config, publisher), shutdown: shutdown.clone() };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, code = %config.pricing.discount_code, "Aura storefront listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down, cancelling in-flight payments");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

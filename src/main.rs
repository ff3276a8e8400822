//! GOAT Storefront order service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront::server::mailer::{LogMailer, Mailer, ResendMailer};
use storefront::server::repository::{InMemoryOrderRepository, OrderRepository, PgOrderRepository};
use storefront::server::{self, AppState};
use storefront::{Catalog, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = ServerConfig::from_env()?;

    let orders: Arc<dyn OrderRepository> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgOrderRepository::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory only");
            Arc::new(InMemoryOrderRepository::default())
        }
    };
    let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key, &config.mail_from, config.request_timeout)?),
        None => {
            tracing::warn!("RESEND_API_KEY not set, order notifications are only logged");
            Arc::new(LogMailer)
        }
    };

    let catalog = Arc::new(Catalog::seeded()?);
    tracing::info!(products = catalog.len(), "catalog loaded");
    let state = AppState { orders, mailer, catalog, notify_recipient: config.notify_recipient.clone() };
    let app = server::router(state);

    tracing::info!("🚀 GOAT Storefront order service listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}

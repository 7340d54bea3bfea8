//! OpenSASE Back Office - catalog, cart and order administration service

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use opensase_backoffice::config::Config;
use opensase_backoffice::publisher::{EventPublisher, LogPublisher, NatsPublisher};
use opensase_backoffice::store::{MemoryStore, PgStore};
use opensase_backoffice::{api, Backoffice};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let events: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match NatsPublisher::connect(url, config.event_subject_prefix.clone()).await {
            Ok(nats) => Arc::new(nats),
            Err(e) => { tracing::warn!(error = %e, "NATS unavailable, logging events instead"); Arc::new(LogPublisher) }
        },
        None => Arc::new(LogPublisher),
    };

    let backoffice = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            Backoffice::new(Arc::new(store), events)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Backoffice::new(Arc::new(MemoryStore::new()), events)
        }
    };

    let app = api::app(backoffice);
    let addr = config.listen_addr();
    tracing::info!("🚀 OpenSASE Back Office listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

//! Real-estate listing backend
//! Mission: Serve listings, reviews, wishlists and users over REST, behind JWT role gates

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use estate_backend::{
    api::{create_router, AppState},
    auth::JwtHandler,
    config::{Args, Config, StoreConfig},
    store::{DocumentStore, SqliteDocumentStore},
};
use std::{path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::from_args(Args::parse())?;

    info!("🚀 Real estate backend starting");

    let store = open_store(&config.store).await?;
    store
        .ping()
        .await
        .context("Document store is not reachable")?;
    info!("📊 Document store ready ({})", config.store.describe());

    let jwt_handler = Arc::new(JwtHandler::new(config.token_secret.clone()));
    if !jwt_handler.has_secret() {
        warn!("⚠️  ACCESS_TOKEN_SECRET is not set: credentials can be neither issued nor verified");
    }

    let app = create_router(AppState::new(store.clone(), jwt_handler));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Router and its state are gone; this is the last handle
    drop(store);
    info!("👋 Server stopped, document store released");

    Ok(())
}

async fn open_store(store: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match store {
        StoreConfig::Sqlite { path } => Ok(Arc::new(SqliteDocumentStore::new(path)?)),
        #[cfg(feature = "mongo")]
        StoreConfig::Mongo { uri, database } => Ok(Arc::new(
            estate_backend::store::MongoDocumentStore::connect(uri, database).await?,
        )),
        #[cfg(not(feature = "mongo"))]
        StoreConfig::Mongo { .. } => {
            anyhow::bail!("MongoDB configured but this build lacks the `mongo` feature")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_backend=debug,estate_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) The crate directory, for runs started from elsewhere with --manifest-path
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

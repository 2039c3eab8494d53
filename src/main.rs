// NutriTrack - nutrition and medication tracking client core
// Entry point and service wiring

use std::sync::Arc;

use nutritrack::config::AppConfig;
use nutritrack::services::auth::{IdentityBridge, RestIdentityProvider};
use nutritrack::services::notifications::{toast_channel, LogNotifier};
use nutritrack::services::ReminderScanner;
use nutritrack::store::AppStore;
use nutritrack::sync::{RestDocumentStore, SyncGateway};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutritrack=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NutriTrack core");

    let config = AppConfig::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;
    tracing::info!("Data directory: {:?}", config.data_dir);

    let documents = Arc::new(RestDocumentStore::new(&config.sync_base_url)?);
    let gateway = SyncGateway::new(documents);
    let provider = Arc::new(RestIdentityProvider::new(
        &config.auth_base_url,
        &config.auth_api_key,
    )?);

    let store = AppStore::open(&config.data_dir, gateway, provider.clone()).await?;

    let bridge = IdentityBridge::new(store.clone(), provider);
    let bridge_handle = bridge.start();

    let (toasts, mut toast_rx) = toast_channel();
    let toast_handle = tokio::spawn(async move {
        while let Some(toast) = toast_rx.recv().await {
            tracing::info!("Toast: {} - {}", toast.title, toast.body);
        }
    });

    let scanner = ReminderScanner::new(store, Arc::new(LogNotifier), toasts);
    let scanner_handle = scanner.start();

    tracing::info!("NutriTrack core running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    scanner_handle.abort();
    bridge_handle.abort();
    toast_handle.abort();

    Ok(())
}

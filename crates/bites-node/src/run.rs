//! Run modes

use std::sync::Arc;

use anyhow::Context;
use bites_core::{BusClient, LocalBus, StoreClient};
use bites_gateway::AppState;
use bites_storage::{DirectClient, RedbItemStore, RedbStoreConfig, StorageService};
use bites_transport::NatsBus;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::NodeConfig;

fn open_store(config: &NodeConfig) -> anyhow::Result<Arc<RedbItemStore>> {
    let store = RedbItemStore::open(RedbStoreConfig {
        db_path: config.db_path.clone(),
    })
    .with_context(|| format!("failed to open store at {}", config.db_path.display()))?;
    Ok(Arc::new(store))
}

async fn connect_nats(config: &NodeConfig) -> anyhow::Result<Arc<NatsBus>> {
    let bus = NatsBus::connect(&config.nats_url)
        .await
        .with_context(|| format!("failed to connect to {}", config.nats_url))?;
    Ok(Arc::new(bus))
}

async fn gateway(config: &NodeConfig, client: Arc<dyn StoreClient>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    let state = AppState::new(client).with_timeout(config.request_timeout());
    bites_gateway::serve(listener, state).await?;
    Ok(())
}

/// Storage service answering on NATS
pub async fn storage(config: NodeConfig) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let bus = connect_nats(&config).await?;
    info!(
        db_path = %store.config().db_path.display(),
        nats = %config.nats_url,
        "Storage service starting"
    );
    StorageService::new(store).run(bus).await?;
    Ok(())
}

/// HTTP gateway querying the storage service over NATS
pub async fn gateway_only(config: NodeConfig) -> anyhow::Result<()> {
    let bus = connect_nats(&config).await?;
    let client = BusClient::with_timeout(bus, config.request_timeout());
    gateway(&config, Arc::new(client)).await
}

/// Storage and gateway in one process
pub async fn standalone(config: NodeConfig, direct: bool) -> anyhow::Result<()> {
    let service = StorageService::new(open_store(&config)?);

    if direct {
        info!("Standalone node using direct store calls");
        return gateway(&config, Arc::new(DirectClient::new(service))).await;
    }

    info!("Standalone node using in-process bus");
    let bus = Arc::new(LocalBus::new());
    let client = BusClient::with_timeout(bus.clone(), config.request_timeout());
    tokio::select! {
        result = service.run(bus) => result.context("storage service stopped"),
        result = gateway(&config, Arc::new(client)) => result,
    }
}

use crate::clock::{Clock, SystemClock};
use crate::config::AllocationConfig;
use crate::gateway::{ReservationStore, StoreClient};
use crate::lifecycle::compactor::spawn_compactor;
use crate::repository::PoolRepository;
use config::ConfigError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// A background task ended abnormally during shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("Store task failed: {0}")]
    Store(JoinError),
    #[error("Compactor task failed: {0}")]
    Compactor(JoinError),
}

/// The runtime orchestrator for the allocation engine.
///
/// `AllocationSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the reservation store and compactor
/// - **Dependency Wiring**: Handing the store's client to the repository and compactor
///
/// # Example
///
/// ```ignore
/// let system = AllocationSystem::new(&AllocationConfig::default())?;
///
/// let stock = ResourceId::from("item-999");
/// system.repository.create_stock(&stock, 1).await?;
/// system.repository.reserve(&stock, &"user-A".into(), Utc::now()).await?;
///
/// system.shutdown().await?;
/// ```
pub struct AllocationSystem {
    /// Repository over the running store.
    pub repository: PoolRepository<StoreClient>,

    store_handle: JoinHandle<()>,
    compactor: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl AllocationSystem {
    /// Starts the system on the wall clock.
    pub fn new(config: &AllocationConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Starts the store, and the compactor when `sweep_interval_secs` is set.
    ///
    /// The config is validated first; nothing is spawned if it is rejected.
    pub fn with_clock(
        config: &AllocationConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let window = config.expiry_window()?;

        let (store, client) = ReservationStore::new(config.channel_buffer, window);
        let client = client.with_timeout(config.request_timeout());
        let store_handle = tokio::spawn(store.run());

        let compactor = config.sweep_interval().map(|period| {
            let (stop_tx, stop_rx) = oneshot::channel();
            let handle = spawn_compactor(client.clone(), clock.clone(), period, stop_rx);
            (stop_tx, handle)
        });

        let repository = PoolRepository::new(client, window)
            .with_clock(clock)
            .with_max_retries(config.max_retries);

        info!(
            window_secs = window.duration().num_seconds(),
            compactor = compactor.is_some(),
            "Allocation system started"
        );

        Ok(Self {
            repository,
            store_handle,
            compactor,
        })
    }

    /// Gracefully shuts down the system.
    ///
    /// 1. Stops the compactor and waits for it, so it lets go of its client.
    /// 2. Drops the repository, closing the last sender of the store's channel.
    /// 3. Waits for the store task to drain and exit.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        info!("Shutting down system...");

        if let Some((stop, handle)) = self.compactor {
            let _ = stop.send(());
            if let Err(e) = handle.await {
                error!("Compactor task failed: {:?}", e);
                return Err(ShutdownError::Compactor(e));
            }
        }

        drop(self.repository);

        if let Err(e) = self.store_handle.await {
            error!("Store task failed: {:?}", e);
            return Err(ShutdownError::Store(e));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

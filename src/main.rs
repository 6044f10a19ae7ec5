//! # Stock Allocation Demo
//!
//! Two users race for a stock with a single slot:
//! 1.  Setting up the [`AllocationSystem`] from `allocation.toml` / `STOCK_*` variables.
//! 2.  Creating `item-999` with one slot.
//! 3.  `user-A` claims it, then `user-B` is turned away.

use chrono::Utc;
use stock_allocation::config::AllocationConfig;
use stock_allocation::lifecycle::{setup_tracing, AllocationSystem};
use stock_allocation::model::{HolderId, ResourceId};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = AllocationConfig::load()?;
    info!(?config, "Starting allocation demo");

    let system = AllocationSystem::new(&config)?;
    let repository = &system.repository;

    let stock = ResourceId::from("item-999");
    repository.create_stock(&stock, 1).await?;

    for holder in ["user-A", "user-B"] {
        let holder = HolderId::from(holder);
        let span = tracing::info_span!("reservation", %holder);
        let result = async {
            repository
                .reserve_with_retry(&stock, &holder, Utc::now())
                .await
        }
        .instrument(span)
        .await;

        match result {
            Ok(outcome) if outcome.is_held() => info!(%holder, %outcome, "Slot held"),
            Ok(outcome) => info!(%holder, %outcome, "No slot"),
            Err(e) => error!(%holder, error = %e, "Reservation failed"),
        }
    }

    let snapshot = repository.load(&stock).await?;
    info!(
        resource_id = %snapshot.id(),
        active = snapshot.active_count(),
        total = snapshot.total(),
        can_allocate = snapshot.can_allocate(),
        "Final state"
    );

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}

//! Background sweep of lapsed claims.
//!
//! Lapsed records stop counting against capacity the moment their window passes, and the
//! next grant on that stock drops them. Stocks that see no further traffic keep them
//! until a sweep runs; the compactor runs one for every stock on a fixed period.

use crate::clock::Clock;
use crate::gateway::{GatewayError, ReservationGateway};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sweeps every known stock once and returns the total number of records removed.
///
/// A stock that fails to sweep is logged and skipped; only a failure to list the stocks
/// is returned.
pub async fn sweep_all<G: ReservationGateway + ?Sized>(
    gateway: &G,
    now: DateTime<Utc>,
) -> Result<usize, GatewayError> {
    let mut removed = 0;
    for resource_id in gateway.list_resources().await? {
        match gateway.sweep_expired(&resource_id, now).await {
            Ok(count) => removed += count,
            Err(e) => warn!(%resource_id, error = %e, "Sweep failed"),
        }
    }
    Ok(removed)
}

/// Spawns the periodic sweep. The task ends when `stop` fires or its sender is dropped.
pub fn spawn_compactor<G>(
    gateway: G,
    clock: Arc<dyn Clock>,
    period: Duration,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    G: ReservationGateway + 'static,
{
    tokio::spawn(async move {
        info!(period_ms = period.as_millis() as u64, "Compactor started");
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    match sweep_all(&gateway, clock.now()).await {
                        Ok(0) => debug!("Nothing to sweep"),
                        Ok(removed) => info!(removed, "Compaction pass"),
                        Err(e) => warn!(error = %e, "Compaction pass failed"),
                    }
                }
            }
        }

        info!("Compactor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateway::mock::MockStore;
    use crate::gateway::ReservationStore;
    use crate::model::ExpiryWindow;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_all_covers_every_stock() {
        let (store, client) = ReservationStore::new(16, ExpiryWindow::default());
        tokio::spawn(store.run());

        for id in ["item-1", "item-2"] {
            client.create_stock(&id.into(), 2).await.unwrap();
            client
                .try_reserve(&id.into(), &"user-A".into(), t0())
                .await
                .unwrap();
        }

        assert_eq!(sweep_all(&client, t0() + chrono::Duration::minutes(5)).await, Ok(0));
        assert_eq!(sweep_all(&client, t0() + chrono::Duration::minutes(11)).await, Ok(2));
    }

    #[tokio::test]
    async fn test_sweep_all_skips_failing_stock() {
        let mut mock = MockStore::new();
        mock.expect_list_resources()
            .return_ok(vec!["item-1".into(), "item-2".into()]);
        mock.expect_sweep().return_err(GatewayError::NotFound("item-1".into()));
        mock.expect_sweep().return_ok(3);

        assert_eq!(sweep_all(&mock.client(), t0()).await, Ok(3));
        mock.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_compactor_sweeps_on_tick_and_stops() {
        let (store, client) = ReservationStore::new(16, ExpiryWindow::default());
        tokio::spawn(store.run());
        client.create_stock(&"item-1".into(), 1).await.unwrap();
        client
            .try_reserve(&"item-1".into(), &"user-A".into(), t0())
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(t0() + chrono::Duration::minutes(11)));
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = spawn_compactor(client.clone(), clock, Duration::from_secs(30), stop_rx);

        // Nothing is swept before the first period elapses.
        let snapshot = client
            .list_reservations(&"item-1".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.holders.len(), 1);

        // Paused time jumps straight to the tick at 30s while the test sleeps.
        tokio::time::sleep(Duration::from_secs(31)).await;
        let snapshot = client
            .list_reservations(&"item-1".into())
            .await
            .unwrap()
            .unwrap();
        assert!(snapshot.holders.is_empty());

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}

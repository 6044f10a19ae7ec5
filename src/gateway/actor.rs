//! # Reservation Store Actor
//!
//! The in-process reservation store. It owns every [`StockRecord`] and the receiving
//! end of the request channel, and handles one [`StoreRequest`] at a time.
//!
//! **Concurrency Model**:
//! Any number of [`StoreClient`] clones may send concurrently, but the store reads
//! messages one by one and finishes each before taking the next. A `TryReserve` therefore
//! runs its read-check-write without anyone else observing the record in between, which
//! is the atomicity the [`ReservationGateway`](super::ReservationGateway) contract asks
//! for. No `Mutex` guards the records; the task owns them outright.
//!
//! # Usage Pattern
//!
//! 1.  **Create**: Call `ReservationStore::new()` to get the `store` (server) and `client`.
//! 2.  **Run**: Spawn `store.run()` in a background task.
//! 3.  **Use**: Clone the client into every caller. Dropping the last clone stops the loop.
//!
//! ```rust,ignore
//! let (store, client) = ReservationStore::new(32, ExpiryWindow::default());
//! tokio::spawn(store.run());
//!
//! client.create_stock(&"item-999".into(), 1).await?;
//! let outcome = client.try_reserve(&"item-999".into(), &"user-A".into(), Utc::now()).await?;
//! ```

use super::{GatewayError, ReservationOutcome, StockRecord, StockSnapshot, StoreClient, StoreRequest};
use crate::model::{ExpiryWindow, HolderId, ResourceId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The server half of the reservation store.
pub struct ReservationStore {
    receiver: mpsc::Receiver<StoreRequest>,
    records: HashMap<ResourceId, StockRecord>,
    expiry_window: ExpiryWindow,
}

impl ReservationStore {
    /// Creates a new store and its client.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Capacity of the request channel. Senders wait when it is full.
    /// * `expiry_window` - How long a claim counts against capacity.
    pub fn new(buffer_size: usize, expiry_window: ExpiryWindow) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let store = Self {
            receiver,
            records: HashMap::new(),
            expiry_window,
        };
        (store, StoreClient::new(sender))
    }

    /// Runs the store's event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!(window_secs = self.expiry_window.duration().num_seconds(), "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::CreateStock {
                    resource_id,
                    total,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.create_stock(resource_id, total));
                }
                StoreRequest::TryReserve {
                    resource_id,
                    holder_id,
                    now,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.try_reserve(&resource_id, &holder_id, now));
                }
                StoreRequest::Snapshot {
                    resource_id,
                    respond_to,
                } => {
                    let snapshot = self.snapshot(&resource_id);
                    debug!(%resource_id, found = snapshot.is_some(), "Snapshot");
                    let _ = respond_to.send(Ok(snapshot));
                }
                StoreRequest::SweepExpired {
                    resource_id,
                    now,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.sweep_expired(&resource_id, now));
                }
                StoreRequest::ListResources { respond_to } => {
                    let mut ids: Vec<ResourceId> = self.records.keys().cloned().collect();
                    ids.sort();
                    let _ = respond_to.send(Ok(ids));
                }
            }
        }

        info!(size = self.records.len(), "Store shutdown");
    }

    fn create_stock(&mut self, resource_id: ResourceId, total: u32) -> Result<(), GatewayError> {
        debug!(%resource_id, total, "CreateStock");
        if total == 0 {
            warn!(%resource_id, "Rejected zero capacity");
            return Err(GatewayError::InvalidCapacity { resource_id, total });
        }
        if self.records.contains_key(&resource_id) {
            warn!(%resource_id, "Stock already exists");
            return Err(GatewayError::AlreadyExists(resource_id));
        }
        self.records.insert(resource_id.clone(), StockRecord::new(total));
        info!(%resource_id, total, size = self.records.len(), "Stock created");
        Ok(())
    }

    fn try_reserve(
        &mut self,
        resource_id: &ResourceId,
        holder_id: &HolderId,
        now: DateTime<Utc>,
    ) -> Result<ReservationOutcome, GatewayError> {
        debug!(%resource_id, %holder_id, %now, "TryReserve");
        let Some(record) = self.records.get_mut(resource_id) else {
            warn!(%resource_id, "Not found");
            return Err(GatewayError::NotFound(resource_id.clone()));
        };

        let outcome = record.try_reserve(holder_id, now, self.expiry_window);
        info!(
            %resource_id,
            %holder_id,
            %outcome,
            held = record.len(),
            total = record.total(),
            version = record.version(),
            "Reserve"
        );
        Ok(outcome)
    }

    fn snapshot(&self, resource_id: &ResourceId) -> Option<StockSnapshot> {
        self.records
            .get(resource_id)
            .map(|record| record.snapshot(resource_id))
    }

    fn sweep_expired(
        &mut self,
        resource_id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<usize, GatewayError> {
        let Some(record) = self.records.get_mut(resource_id) else {
            warn!(%resource_id, "Not found");
            return Err(GatewayError::NotFound(resource_id.clone()));
        };
        let removed = record.sweep(now, self.expiry_window);
        if removed > 0 {
            info!(%resource_id, removed, held = record.len(), version = record.version(), "Swept");
        } else {
            debug!(%resource_id, "Nothing to sweep");
        }
        Ok(removed)
    }
}

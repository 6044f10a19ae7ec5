//! # Pool Repository
//!
//! Bridges the [`SalesStock`] aggregate and a [`ReservationGateway`].
//!
//! * **Reads** ([`load`](PoolRepository::load)) rebuild a fresh snapshot from the store's
//!   raw records every time. Nothing is cached between calls.
//! * **Writes** ([`reserve`](PoolRepository::reserve)) go straight to the gateway's atomic
//!   `try_reserve`. There is no path that saves a whole aggregate back.
//!
//! ```rust,ignore
//! let repository = PoolRepository::new(client, ExpiryWindow::default());
//! repository.create_stock(&"item-999".into(), 1).await?;
//!
//! let outcome = repository.reserve(&"item-999".into(), &"user-A".into(), Utc::now()).await?;
//! let stock = repository.load(&"item-999".into()).await?;
//! assert_eq!(stock.active_count(), 1);
//! ```

pub mod error;

pub use error::RepositoryError;

use crate::clock::{Clock, SystemClock};
use crate::gateway::{ReservationGateway, ReservationOutcome, StoreClient};
use crate::model::{Allocation, ExpiryWindow, HolderId, ResourceId, SalesStock};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Retries after an unknown-outcome failure when none are configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Loads stock snapshots and forwards reservations to the gateway.
#[derive(Clone)]
pub struct PoolRepository<G = StoreClient> {
    gateway: G,
    clock: Arc<dyn Clock>,
    expiry_window: ExpiryWindow,
    max_retries: u32,
}

impl<G: ReservationGateway> PoolRepository<G> {
    pub fn new(gateway: G, expiry_window: ExpiryWindow) -> Self {
        Self {
            gateway,
            clock: Arc::new(SystemClock),
            expiry_window,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[instrument(skip(self))]
    pub async fn create_stock(
        &self,
        resource_id: &ResourceId,
        total: u32,
    ) -> Result<(), RepositoryError> {
        self.gateway.create_stock(resource_id, total).await?;
        info!(%resource_id, total, "Stock created");
        Ok(())
    }

    /// Loads the stock as of the injected clock's current time.
    pub async fn load(&self, resource_id: &ResourceId) -> Result<SalesStock, RepositoryError> {
        self.load_at(resource_id, self.clock.now()).await
    }

    /// Loads the stock with expiry evaluated at `now`.
    ///
    /// Every raw record comes back as an `Active` allocation; the invariants (capacity,
    /// one claim per holder) are checked on that raw set and only then is expiry applied.
    /// A store that honours the atomic contract never holds more records than slots, nor
    /// two records for one holder.
    #[instrument(skip(self))]
    pub async fn load_at(
        &self,
        resource_id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<SalesStock, RepositoryError> {
        let snapshot = self
            .gateway
            .list_reservations(resource_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(resource_id.clone()))?;

        let allocations = snapshot
            .holders
            .into_iter()
            .map(|record| Allocation::active(record.holder_id, record.reserved_at))
            .collect();

        let stock = SalesStock::from_parts(
            snapshot.resource_id,
            snapshot.version,
            snapshot.total,
            allocations,
            self.expiry_window,
        )?
        .check_timeout(now);

        debug!(
            %resource_id,
            version = stock.version(),
            active = stock.active_count(),
            total = stock.total(),
            "Loaded"
        );
        Ok(stock)
    }

    /// Single atomic attempt. A `Timeout` here is an unknown outcome; see
    /// [`reserve_with_retry`](Self::reserve_with_retry).
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        resource_id: &ResourceId,
        holder_id: &HolderId,
        now: DateTime<Utc>,
    ) -> Result<ReservationOutcome, RepositoryError> {
        let outcome = self.gateway.try_reserve(resource_id, holder_id, now).await?;
        info!(%resource_id, %holder_id, %outcome, "Reserve");
        Ok(outcome)
    }

    /// Like [`reserve`](Self::reserve), but repeats the call with the same holder after
    /// an unknown-outcome failure, up to `max_retries` extra attempts.
    ///
    /// A grant whose response was lost comes back as `AlreadyReserved`, so callers
    /// should judge success with [`ReservationOutcome::is_held`].
    #[instrument(skip(self))]
    pub async fn reserve_with_retry(
        &self,
        resource_id: &ResourceId,
        holder_id: &HolderId,
        now: DateTime<Utc>,
    ) -> Result<ReservationOutcome, RepositoryError> {
        let mut attempt = 0;
        loop {
            match self.reserve(resource_id, holder_id, now).await {
                Err(e) if e.is_unknown_outcome() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%resource_id, %holder_id, attempt, error = %e, "Retrying reserve");
                }
                result => return result,
            }
        }
    }

    /// Drops lapsed records from the store as of the clock's current time.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, resource_id: &ResourceId) -> Result<usize, RepositoryError> {
        let removed = self
            .gateway
            .sweep_expired(resource_id, self.clock.now())
            .await?;
        debug!(%resource_id, removed, "Sweep");
        Ok(removed)
    }
}

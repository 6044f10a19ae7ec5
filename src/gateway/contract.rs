//! # ReservationGateway Trait
//!
//! The boundary around the shared reservation store. Anything that can answer these
//! calls can back a [`PoolRepository`](crate::repository::PoolRepository): the in-process
//! [`StoreClient`](super::StoreClient), the [`MockStore`](super::mock::MockStore) used in
//! tests, or an adapter to an external store with a server-side script.
//!
//! ## The atomic contract
//!
//! [`ReservationGateway::try_reserve`] must run as one indivisible unit with respect to
//! every other `try_reserve` on the same resource. Reading the holder count in one call
//! and writing the claim in another is not enough: another caller can slip in between
//! and both would see the last slot as free.

use super::GatewayError;
use crate::model::{HolderId, ResourceId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Result of one atomic reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationOutcome {
    /// The holder won a slot. The only outcome that changes the store.
    Granted,
    /// Every slot is held by a live claim.
    OutOfCapacity,
    /// The holder already has a live claim; nothing was recorded.
    AlreadyReserved,
}

impl ReservationOutcome {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }

    /// True when the holder owns a slot after the call, whether it was won now or earlier.
    ///
    /// This is the success test for retried calls, where a `Granted` from a lost response
    /// shows up as `AlreadyReserved` on the retry.
    pub fn is_held(self) -> bool {
        matches!(self, Self::Granted | Self::AlreadyReserved)
    }
}

impl Display for ReservationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Granted => "granted",
            Self::OutOfCapacity => "out_of_capacity",
            Self::AlreadyReserved => "already_reserved",
        };
        f.write_str(label)
    }
}

/// One raw holder record: who claimed a slot and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderRecord {
    pub holder_id: HolderId,
    pub reserved_at: DateTime<Utc>,
}

/// Bulk read of a stock's raw records, in the order they were granted.
///
/// Taken without coordination with concurrent writers, so it may be stale by the time
/// it is used. Expiry is not applied here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub resource_id: ResourceId,
    pub total: u32,
    pub version: u64,
    pub holders: Vec<HolderRecord>,
}

/// Capability contract of the shared reservation store.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Registers a stock with `total` slots at version 1.
    async fn create_stock(&self, resource_id: &ResourceId, total: u32) -> Result<(), GatewayError>;

    /// Atomically claims a slot for `holder_id` if one is free.
    ///
    /// `OutOfCapacity` and `AlreadyReserved` leave the store untouched, so the call is
    /// safe to repeat with the same holder after a timeout.
    async fn try_reserve(
        &self,
        resource_id: &ResourceId,
        holder_id: &HolderId,
        now: DateTime<Utc>,
    ) -> Result<ReservationOutcome, GatewayError>;

    /// Reads capacity, version and every recorded holder. `None` for an unknown stock.
    async fn list_reservations(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Option<StockSnapshot>, GatewayError>;

    /// Removes records that lapsed by `now` and returns how many were removed.
    async fn sweep_expired(
        &self,
        resource_id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<usize, GatewayError>;

    /// Every registered stock.
    async fn list_resources(&self) -> Result<Vec<ResourceId>, GatewayError>;
}

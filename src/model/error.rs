//! Error types for the stock aggregate.

use super::{HolderId, ResourceId};
use thiserror::Error;

/// Business outcomes that reject an in-memory allocation.
///
/// These are expected and frequent; callers branch on them rather than treating them
/// as failures of the system.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// The holder already has an `Active` claim on this stock.
    #[error("Duplicate claim: {holder_id} already holds a slot in {resource_id}")]
    DuplicateClaim {
        resource_id: ResourceId,
        holder_id: HolderId,
    },

    /// Every slot is taken by an `Active` claim.
    #[error("Capacity exceeded for {resource_id}: {active} of {capacity} slots active")]
    CapacityExceeded {
        resource_id: ResourceId,
        capacity: u32,
        active: usize,
    },
}

/// A snapshot was built from claims no correct store could have produced.
///
/// This never happens while the reservation store keeps its atomicity guarantee, so it
/// is reported as a hard failure and must not be retried or patched over.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// More `Active` claims than slots.
    #[error("Invariant violated for {resource_id}: {active} active allocations exceed capacity {capacity}")]
    Overallocated {
        resource_id: ResourceId,
        active: usize,
        capacity: u32,
    },

    /// One holder with more than one `Active` claim.
    #[error("Invariant violated for {resource_id}: {holder_id} holds more than one active allocation")]
    DuplicateHolder {
        resource_id: ResourceId,
        holder_id: HolderId,
    },
}

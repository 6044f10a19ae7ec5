//! # Gateway Errors
//!
//! Failures of the reservation store itself. Business outcomes of a reservation
//! (`OutOfCapacity`, `AlreadyReserved`) are not errors; they come back as a
//! [`ReservationOutcome`](super::ReservationOutcome).

use crate::model::ResourceId;

/// Errors that can occur while talking to the reservation store.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    /// No answer arrived in time. The request may or may not have been applied.
    #[error("Store request timed out; outcome unknown")]
    Timeout,
    #[error("Stock not found: {0}")]
    NotFound(ResourceId),
    #[error("Stock already exists: {0}")]
    AlreadyExists(ResourceId),
    #[error("Invalid capacity for {resource_id}: {total}")]
    InvalidCapacity { resource_id: ResourceId, total: u32 },
}

impl GatewayError {
    /// Whether the request might have been applied even though it reported failure.
    pub fn is_unknown_outcome(&self) -> bool {
        matches!(self, Self::Timeout | Self::ActorDropped)
    }
}

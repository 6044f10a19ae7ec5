//! Error types for the pool repository.

use crate::gateway::GatewayError;
use crate::model::{InvariantViolation, ResourceId};
use thiserror::Error;

/// Errors returned by [`PoolRepository`](super::PoolRepository).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// The stock was never created.
    #[error("Stock not found: {0}")]
    NotFound(ResourceId),

    /// Stored records describe an impossible pool. Fatal.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("Gateway error: {0}")]
    Gateway(GatewayError),
}

impl RepositoryError {
    /// See [`GatewayError::is_unknown_outcome`].
    pub fn is_unknown_outcome(&self) -> bool {
        matches!(self, Self::Gateway(e) if e.is_unknown_outcome())
    }
}

impl From<GatewayError> for RepositoryError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound(resource_id) => Self::NotFound(resource_id),
            other => Self::Gateway(other),
        }
    }
}

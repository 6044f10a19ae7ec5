//! The `SalesStock` aggregate: a fixed number of slots and the claims made against them.
//!
//! A `SalesStock` is an immutable snapshot. Every operation returns a new snapshot and
//! leaves the receiver as it was, so a snapshot can be handed to any number of readers
//! without coordination.
//!
//! The methods here express the allocation *rules*. They are not what settles a race
//! between concurrent callers: that decision belongs to the reservation store (see
//! [`crate::gateway`]), and snapshots are rebuilt from it by the
//! [`PoolRepository`](crate::repository::PoolRepository).

use super::{Allocation, AllocationError, ExpiryWindow, HolderId, InvariantViolation, ResourceId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Aggregate root owning the capacity invariant for one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesStock {
    id: ResourceId,
    version: u64,
    total: u32,
    allocations: Vec<Allocation>,
    #[serde(skip)]
    expiry_window: ExpiryWindow,
}

impl SalesStock {
    /// Creates an empty stock with `total` slots at version 1.
    pub fn new(id: impl Into<ResourceId>, total: u32, expiry_window: ExpiryWindow) -> Self {
        Self {
            id: id.into(),
            version: 1,
            total,
            allocations: Vec::new(),
            expiry_window,
        }
    }

    /// Rebuilds a snapshot from stored parts, enforcing `active_count <= total` and at
    /// most one `Active` claim per holder.
    pub fn from_parts(
        id: impl Into<ResourceId>,
        version: u64,
        total: u32,
        allocations: Vec<Allocation>,
        expiry_window: ExpiryWindow,
    ) -> Result<Self, InvariantViolation> {
        Self {
            id: id.into(),
            version,
            total,
            allocations,
            expiry_window,
        }
        .checked()
    }

    fn checked(self) -> Result<Self, InvariantViolation> {
        let mut holders = HashSet::new();
        for allocation in self.allocations.iter().filter(|a| a.is_active()) {
            if !holders.insert(allocation.holder_id()) {
                return Err(InvariantViolation::DuplicateHolder {
                    resource_id: self.id.clone(),
                    holder_id: allocation.holder_id().clone(),
                });
            }
        }

        let active = holders.len();
        if active > self.total as usize {
            return Err(InvariantViolation::Overallocated {
                resource_id: self.id,
                active,
                capacity: self.total,
            });
        }
        Ok(self)
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn expiry_window(&self) -> ExpiryWindow {
        self.expiry_window
    }

    pub fn active_count(&self) -> usize {
        self.allocations.iter().filter(|a| a.is_active()).count()
    }

    /// Free slots left (never negative).
    pub fn available(&self) -> usize {
        (self.total as usize).saturating_sub(self.active_count())
    }

    pub fn can_allocate(&self) -> bool {
        self.active_count() < self.total as usize
    }

    pub fn has_active_allocation(&self, holder_id: &HolderId) -> bool {
        self.active_allocation(holder_id).is_some()
    }

    pub fn active_allocation(&self, holder_id: &HolderId) -> Option<&Allocation> {
        self.allocations
            .iter()
            .find(|a| a.is_active() && a.holder_id() == holder_id)
    }

    /// Claims one slot for `holder_id`, returning the next snapshot.
    ///
    /// # Errors
    /// - [`AllocationError::DuplicateClaim`] if the holder already has an active claim.
    /// - [`AllocationError::CapacityExceeded`] if no slot is free.
    pub fn allocate(
        &self,
        holder_id: impl Into<HolderId>,
        now: DateTime<Utc>,
    ) -> Result<Self, AllocationError> {
        let holder_id = holder_id.into();
        if self.has_active_allocation(&holder_id) {
            return Err(AllocationError::DuplicateClaim {
                resource_id: self.id.clone(),
                holder_id,
            });
        }
        if !self.can_allocate() {
            return Err(AllocationError::CapacityExceeded {
                resource_id: self.id.clone(),
                capacity: self.total,
                active: self.active_count(),
            });
        }

        let mut allocations = self.allocations.clone();
        allocations.push(Allocation::active(holder_id, now));
        Ok(Self {
            version: self.version + 1,
            allocations,
            ..self.clone()
        })
    }

    /// Re-derives every claim's state at `now`.
    ///
    /// Applied after each load so a lapsed claim is never shown as holding a slot.
    /// Expiry only ever lowers the active count, so the invariant carries over.
    pub fn check_timeout(&self, now: DateTime<Utc>) -> Self {
        let allocations = self
            .allocations
            .iter()
            .map(|a| a.check_expiry(now, self.expiry_window))
            .collect();
        Self {
            allocations,
            ..self.clone()
        }
    }
}

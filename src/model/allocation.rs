//! A single caller's claim on one slot of a stock, and the window after which it lapses.
//!
//! Allocations are values: every transition produces a new [`Allocation`] and the receiver
//! is left untouched. Only [`AllocationState::Active`] ever transitions.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use stock_allocation::model::{Allocation, AllocationState, ExpiryWindow};
//!
//! let reserved_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
//! let claim = Allocation::active("user-A", reserved_at);
//!
//! let window = ExpiryWindow::default();
//! let later = claim.check_expiry(reserved_at + Duration::seconds(601), window);
//! assert_eq!(later.state(), AllocationState::Expired);
//! assert_eq!(claim.state(), AllocationState::Active);
//! ```

use super::HolderId;
use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of an unconfirmed allocation: 10 minutes.
pub const DEFAULT_EXPIRY_WINDOW_SECS: i64 = 600;

/// How long an `Active` allocation stays valid without confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow(Duration);

impl ExpiryWindow {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// # Panics
    /// If `secs` is outside chrono's range (about `i64::MAX / 1000`). Use
    /// [`try_from_secs`](Self::try_from_secs) for untrusted input.
    pub fn from_secs(secs: i64) -> Self {
        Self(Duration::seconds(secs))
    }

    /// `None` when `secs` cannot be represented as a duration.
    pub fn try_from_secs(secs: i64) -> Option<Self> {
        TimeDelta::try_seconds(secs).map(Self)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// A claim made at `reserved_at` has lapsed once strictly more than the window has
    /// elapsed by `now`. Exactly at the boundary it is still valid.
    pub fn is_lapsed(&self, reserved_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - reserved_at > self.0
    }
}

impl Default for ExpiryWindow {
    fn default() -> Self {
        Self::from_secs(DEFAULT_EXPIRY_WINDOW_SECS)
    }
}

/// Lifecycle state of an allocation. `Expired` and `Sold` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationState {
    /// Holds a slot and is waiting for confirmation.
    Active,
    /// Lapsed without confirmation; the slot is free again.
    Expired,
    /// Confirmed by the checkout flow, which lives outside this crate.
    Sold,
}

impl AllocationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// One caller's claim on a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    holder_id: HolderId,
    reserved_at: DateTime<Utc>,
    state: AllocationState,
}

impl Allocation {
    /// Creates a fresh `Active` claim.
    pub fn active(holder_id: impl Into<HolderId>, reserved_at: DateTime<Utc>) -> Self {
        Self::new(holder_id, reserved_at, AllocationState::Active)
    }

    /// Creates a claim in an arbitrary state (used when rebuilding from stored records).
    pub fn new(
        holder_id: impl Into<HolderId>,
        reserved_at: DateTime<Utc>,
        state: AllocationState,
    ) -> Self {
        Self {
            holder_id: holder_id.into(),
            reserved_at,
            state,
        }
    }

    pub fn holder_id(&self) -> &HolderId {
        &self.holder_id
    }

    pub fn reserved_at(&self) -> DateTime<Utc> {
        self.reserved_at
    }

    pub fn state(&self) -> AllocationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == AllocationState::Active
    }

    /// Derives the state this claim has at `now`.
    ///
    /// Terminal claims come back unchanged, so applying this repeatedly with the same
    /// `now` gives the same answer as applying it once.
    pub fn check_expiry(&self, now: DateTime<Utc>, window: ExpiryWindow) -> Self {
        if self.state.is_terminal() || !window.is_lapsed(self.reserved_at, now) {
            return self.clone();
        }
        Self {
            state: AllocationState::Expired,
            ..self.clone()
        }
    }
}

//! Per-stock record kept by the [`ReservationStore`](super::ReservationStore).
//!
//! Each method here runs inside a single message of the store's loop, which is what
//! makes it indivisible. Nothing in this file is shared or locked.

use super::{HolderRecord, ReservationOutcome, StockSnapshot};
use crate::model::{ExpiryWindow, HolderId, ResourceId};
use chrono::{DateTime, Utc};

/// Capacity, version and raw holder claims for one stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    total: u32,
    version: u64,
    holders: Vec<HolderRecord>,
}

impl StockRecord {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            version: 1,
            holders: Vec::new(),
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// The conditional reserve.
    ///
    /// 1. Count the claims still live at `now`.
    /// 2. A live claim by `holder_id` → `AlreadyReserved`.
    /// 3. No free slot → `OutOfCapacity`.
    /// 4. Drop lapsed claims, record `holder_id -> now`, bump the version → `Granted`.
    ///
    /// Steps 2 and 3 leave the record untouched.
    pub fn try_reserve(
        &mut self,
        holder_id: &HolderId,
        now: DateTime<Utc>,
        window: ExpiryWindow,
    ) -> ReservationOutcome {
        let is_live = |h: &HolderRecord| !window.is_lapsed(h.reserved_at, now);

        let live = self.holders.iter().filter(|h| is_live(*h)).count();
        if self
            .holders
            .iter()
            .any(|h| &h.holder_id == holder_id && is_live(h))
        {
            return ReservationOutcome::AlreadyReserved;
        }
        if live >= self.total as usize {
            return ReservationOutcome::OutOfCapacity;
        }

        self.holders.retain(is_live);
        self.holders.push(HolderRecord {
            holder_id: holder_id.clone(),
            reserved_at: now,
        });
        self.version += 1;
        ReservationOutcome::Granted
    }

    /// Removes lapsed claims. The version moves only if something was removed.
    pub fn sweep(&mut self, now: DateTime<Utc>, window: ExpiryWindow) -> usize {
        let before = self.holders.len();
        self.holders.retain(|h| !window.is_lapsed(h.reserved_at, now));
        let removed = before - self.holders.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    pub fn snapshot(&self, resource_id: &ResourceId) -> StockSnapshot {
        StockSnapshot {
            resource_id: resource_id.clone(),
            total: self.total,
            version: self.version,
            holders: self.holders.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_grants_until_full() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(2);

        assert_eq!(record.try_reserve(&"a".into(), t0(), window), ReservationOutcome::Granted);
        assert_eq!(record.try_reserve(&"b".into(), t0(), window), ReservationOutcome::Granted);
        assert_eq!(
            record.try_reserve(&"c".into(), t0(), window),
            ReservationOutcome::OutOfCapacity
        );
        assert_eq!(record.len(), 2);
        assert_eq!(record.version(), 3);
    }

    #[test]
    fn test_same_holder_is_idempotent() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(5);

        assert_eq!(record.try_reserve(&"a".into(), t0(), window), ReservationOutcome::Granted);
        let version = record.version();
        assert_eq!(
            record.try_reserve(&"a".into(), t0() + Duration::seconds(5), window),
            ReservationOutcome::AlreadyReserved
        );
        assert_eq!(record.len(), 1);
        assert_eq!(record.version(), version);
    }

    #[test]
    fn test_holder_filling_last_slot_gets_already_reserved() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(1);

        record.try_reserve(&"a".into(), t0(), window);
        assert_eq!(
            record.try_reserve(&"a".into(), t0(), window),
            ReservationOutcome::AlreadyReserved
        );
    }

    #[test]
    fn test_negative_outcomes_do_not_touch_record() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(1);
        record.try_reserve(&"a".into(), t0(), window);
        let before = record.clone();

        record.try_reserve(&"b".into(), t0() + Duration::seconds(1), window);
        record.try_reserve(&"a".into(), t0() + Duration::seconds(2), window);
        assert_eq!(record, before);
    }

    #[test]
    fn test_lapsed_claim_frees_slot_on_grant() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(1);
        record.try_reserve(&"a".into(), t0(), window);

        assert_eq!(
            record.try_reserve(&"c".into(), t0() + Duration::seconds(602), window),
            ReservationOutcome::Granted
        );
        let snapshot = record.snapshot(&"item".into());
        assert_eq!(snapshot.holders.len(), 1);
        assert_eq!(snapshot.holders[0].holder_id, HolderId::from("c"));
    }

    #[test]
    fn test_lapsed_holder_can_reclaim() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(1);
        record.try_reserve(&"a".into(), t0(), window);

        let later = t0() + Duration::minutes(15);
        assert_eq!(record.try_reserve(&"a".into(), later, window), ReservationOutcome::Granted);
        assert_eq!(record.snapshot(&"item".into()).holders[0].reserved_at, later);
    }

    #[test]
    fn test_sweep_removes_only_lapsed() {
        let window = ExpiryWindow::default();
        let mut record = StockRecord::new(3);
        record.try_reserve(&"a".into(), t0(), window);
        record.try_reserve(&"b".into(), t0() + Duration::minutes(8), window);
        let version = record.version();

        assert_eq!(record.sweep(t0() + Duration::minutes(9), window), 0);
        assert_eq!(record.version(), version);

        assert_eq!(record.sweep(t0() + Duration::minutes(11), window), 1);
        assert_eq!(record.version(), version + 1);
        assert_eq!(record.len(), 1);

        assert_eq!(record.sweep(t0() + Duration::minutes(19), window), 1);
        assert!(record.is_empty());
    }
}

//! Per-session daily quota for generation requests billed to the server's API key.
//!
//! Counters are keyed by `(session_id, day)` in a sharded concurrent map; every update
//! to one key happens under that key's shard lock. Counters live for the process
//! lifetime only and reset on restart.

pub mod handlers;

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_DAILY_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageDenied {
    #[error("Daily limit of {limit} requests reached")]
    DailyLimitReached { limit: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UsageKey {
    session_id: String,
    day: NaiveDate,
}

impl UsageKey {
    fn new(session_id: &str, day: NaiveDate) -> Self {
        Self {
            session_id: session_id.to_string(),
            day,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counter {
    /// Successful generations.
    used: u32,
    /// Reservations for generations still in flight.
    reserved: u32,
}

impl Counter {
    fn committed_or_pending(&self) -> u32 {
        self.used + self.reserved
    }
}

/// Snapshot of one session's usage for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
}

#[derive(Clone, Default)]
pub struct UsagePolicy {
    counters: Arc<DashMap<UsageKey, Counter>>,
}

impl UsagePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether one more billed call is allowed, returning how many remain
    /// before this call. Does not change any counter.
    pub fn authorize(&self, session_id: &str, day: NaiveDate, limit: u32) -> Result<u32, UsageDenied> {
        let taken = self
            .counters
            .get(&UsageKey::new(session_id, day))
            .map(|c| c.committed_or_pending())
            .unwrap_or(0);

        if taken >= limit {
            Err(UsageDenied::DailyLimitReached { limit })
        } else {
            Ok(limit - taken)
        }
    }

    /// Counts one successful generation and returns the new count for the key.
    pub fn record_usage(&self, session_id: &str, day: NaiveDate) -> u32 {
        let mut counter = self
            .counters
            .entry(UsageKey::new(session_id, day))
            .or_default();
        counter.used += 1;
        counter.used
    }

    /// Authorizes and holds a slot in one step, so concurrent submits from the same
    /// session cannot both pass the final free slot.
    pub fn try_reserve(
        &self,
        session_id: &str,
        day: NaiveDate,
        limit: u32,
    ) -> Result<UsageReservation, UsageDenied> {
        let key = UsageKey::new(session_id, day);
        {
            let mut counter = self.counters.entry(key.clone()).or_default();
            if counter.committed_or_pending() >= limit {
                debug!(session_id, "Daily limit of {limit} reached");
                return Err(UsageDenied::DailyLimitReached { limit });
            }
            counter.reserved += 1;
        }

        Ok(UsageReservation {
            policy: self.clone(),
            key,
            limit,
            settled: false,
        })
    }

    pub fn used(&self, session_id: &str, day: NaiveDate) -> u32 {
        self.counters
            .get(&UsageKey::new(session_id, day))
            .map(|c| c.used)
            .unwrap_or(0)
    }

    pub fn remaining(&self, session_id: &str, day: NaiveDate, limit: u32) -> u32 {
        limit.saturating_sub(self.used(session_id, day))
    }

    pub fn snapshot(&self, session_id: &str, day: NaiveDate, limit: u32) -> UsageSnapshot {
        UsageSnapshot {
            used: self.used(session_id, day),
            remaining: self.remaining(session_id, day, limit),
            limit,
        }
    }

    /// Drops counters for days before `day`. Returns how many keys were removed.
    pub fn prune_before(&self, day: NaiveDate) -> usize {
        let before = self.counters.len();
        self.counters.retain(|key, _| key.day >= day);
        before.saturating_sub(self.counters.len())
    }

    fn release(&self, key: &UsageKey) {
        if let Some(mut counter) = self.counters.get_mut(key) {
            counter.reserved = counter.reserved.saturating_sub(1);
        }
    }
}

/// A held quota slot. `commit` counts it as used; dropping it uncommitted gives it back.
#[must_use = "dropping a reservation releases the slot"]
pub struct UsageReservation {
    policy: UsagePolicy,
    key: UsageKey,
    limit: u32,
    settled: bool,
}

impl UsageReservation {
    /// Records the successful generation and returns how many calls remain today.
    pub fn commit(mut self) -> u32 {
        // Count first, then release: the key is briefly over-counted, never under-counted.
        let used = self.policy.record_usage(&self.key.session_id, self.key.day);
        self.policy.release(&self.key);
        self.settled = true;
        self.limit.saturating_sub(used)
    }
}

impl Drop for UsageReservation {
    fn drop(&mut self) {
        if !self.settled {
            self.policy.release(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_limit_reached_after_recording() {
        let policy = UsagePolicy::new();
        for n in 1..=3 {
            assert!(policy.authorize("s1", day(1), 3).is_ok());
            assert_eq!(policy.record_usage("s1", day(1)), n);
        }
        assert_eq!(
            policy.authorize("s1", day(1), 3),
            Err(UsageDenied::DailyLimitReached { limit: 3 })
        );
    }

    #[test]
    fn test_other_day_and_session_unaffected() {
        let policy = UsagePolicy::new();
        for _ in 0..3 {
            policy.record_usage("s1", day(1));
        }
        assert!(policy.authorize("s1", day(1), 3).is_err());
        assert_eq!(policy.authorize("s1", day(2), 3), Ok(3));
        assert_eq!(policy.authorize("s2", day(1), 3), Ok(3));
    }

    #[test]
    fn test_authorize_does_not_increment() {
        let policy = UsagePolicy::new();
        for _ in 0..10 {
            policy.authorize("s1", day(1), 1).unwrap();
        }
        assert_eq!(policy.used("s1", day(1)), 0);
    }

    #[test]
    fn test_zero_limit_always_denies() {
        let policy = UsagePolicy::new();
        assert!(policy.authorize("s1", day(1), 0).is_err());
        assert!(policy.try_reserve("s1", day(1), 0).is_err());
    }

    #[test]
    fn test_reservation_commit_counts_usage() {
        let policy = UsagePolicy::new();
        let reservation = policy.try_reserve("s1", day(1), 2).unwrap();
        assert_eq!(reservation.commit(), 1);
        assert_eq!(policy.used("s1", day(1)), 1);
        assert_eq!(policy.authorize("s1", day(1), 2), Ok(1));
    }

    #[test]
    fn test_dropped_reservation_releases_slot() {
        let policy = UsagePolicy::new();
        {
            let _reservation = policy.try_reserve("s1", day(1), 1).unwrap();
            assert!(policy.authorize("s1", day(1), 1).is_err());
        }
        assert_eq!(policy.used("s1", day(1)), 0);
        assert_eq!(policy.authorize("s1", day(1), 1), Ok(1));
    }

    #[test]
    fn test_denied_reservation_does_not_increment() {
        let policy = UsagePolicy::new();
        policy.record_usage("s1", day(1));
        assert!(policy.try_reserve("s1", day(1), 1).is_err());
        assert_eq!(policy.used("s1", day(1)), 1);
    }

    #[test]
    fn test_concurrent_reservations_never_exceed_limit() {
        let policy = UsagePolicy::new();
        let held: Vec<UsageReservation> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| policy.try_reserve("double-click", day(1), 3).ok()))
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap())
                .collect()
        });
        assert_eq!(held.len(), 3);
    }

    #[test]
    fn test_concurrent_record_usage_loses_no_updates() {
        let policy = UsagePolicy::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        policy.record_usage("s1", day(1));
                    }
                });
            }
        });
        assert_eq!(policy.used("s1", day(1)), 800);
    }

    #[test]
    fn test_prune_before_drops_stale_days() {
        let policy = UsagePolicy::new();
        policy.record_usage("s1", day(1));
        policy.record_usage("s2", day(1));
        policy.record_usage("s1", day(2));

        assert_eq!(policy.prune_before(day(2)), 2);
        assert_eq!(policy.used("s1", day(1)), 0);
        assert_eq!(policy.used("s1", day(2)), 1);
    }

    #[test]
    fn test_snapshot() {
        let policy = UsagePolicy::new();
        policy.record_usage("s1", day(1));
        assert_eq!(
            policy.snapshot("s1", day(1), 10),
            UsageSnapshot {
                used: 1,
                remaining: 9,
                limit: 10
            }
        );
    }
}

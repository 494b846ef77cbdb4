//! # Lease Store
//!
//! Process-wide map of address to [`Lease`]. Writers (`add`, `delete`, `clean`)
//! are serialized by one exclusive lock, readers share it.
//!
//! Expiry is lazy: an expired lease stays visible through [`LeaseStore::get`]
//! until the next [`LeaseStore::clean`]. There is no background sweeper.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use netmgmt_common::network::lease::Lease;

#[derive(Debug)]
pub struct LeaseStore {
    leases: RwLock<HashMap<Ipv4Addr, Lease>>,
    duration: TimeDelta,
}

impl LeaseStore {
    pub fn new(duration: TimeDelta) -> Self {
        Self {
            leases: RwLock::new(HashMap::new()),
            duration,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// Check-and-set insertion: reserves `addr` unless a live lease already holds it.
    ///
    /// An expired lease that has not been swept yet does not block the new one.
    pub fn add(&self, addr: Ipv4Addr, comment: &str, owner: &str) -> bool {
        let now: DateTime<Utc> = Utc::now();
        let mut leases = self.write();

        if leases.get(&addr).is_some_and(|lease| !lease.is_expired_at(now)) {
            debug!("Lease on {addr} is still held");
            return false;
        }

        let lease = Lease::new(comment, owner, now + self.duration);
        debug!("Leased {addr} until {}", lease.locked_until);
        leases.insert(addr, lease);
        true
    }

    /// Current lease of `addr`, or the zero lease. Never expires anything itself.
    pub fn get(&self, addr: Ipv4Addr) -> Lease {
        self.read().get(&addr).cloned().unwrap_or_default()
    }

    pub fn delete(&self, addr: Ipv4Addr) {
        if self.write().remove(&addr).is_some() {
            debug!("Released lease on {addr}");
        }
    }

    /// Drops every lease whose expiry has passed and returns how many went.
    pub fn clean(&self) -> usize {
        let now: DateTime<Utc> = Utc::now();
        let mut leases = self.write();
        let before: usize = leases.len();
        leases.retain(|_, lease| !lease.is_expired_at(now));

        let removed: usize = before - leases.len();
        if removed > 0 {
            debug!("Swept {removed} expired lease(s)");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All leases ordered by address.
    pub fn snapshot(&self) -> Vec<(Ipv4Addr, Lease)> {
        let mut leases: Vec<(Ipv4Addr, Lease)> = self
            .read()
            .iter()
            .map(|(addr, lease)| (*addr, lease.clone()))
            .collect();
        leases.sort_by_key(|(addr, _)| *addr);
        leases
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Ipv4Addr, Lease>> {
        self.leases.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Ipv4Addr, Lease>> {
        self.leases.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ip(d: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, d)
    }

    #[test]
    fn add_then_get() {
        let store = LeaseStore::new(TimeDelta::minutes(30));
        let before = Utc::now();

        assert!(store.add(ip(1), "ci runner", "build-team"));
        let lease = store.get(ip(1));
        assert_eq!(lease.comment, "ci runner");
        assert_eq!(lease.owner, "build-team");
        assert!(lease.locked_until >= before + TimeDelta::minutes(30));
        assert!(lease.is_locked());
    }

    #[test]
    fn get_unknown_is_zero_lease() {
        let store = LeaseStore::new(TimeDelta::minutes(30));
        assert_eq!(store.get(ip(9)), Lease::default());
    }

    #[test]
    fn live_lease_blocks_second_add() {
        let store = LeaseStore::new(TimeDelta::minutes(30));
        assert!(store.add(ip(1), "first", ""));
        assert!(!store.add(ip(1), "second", ""));
        assert_eq!(store.get(ip(1)).comment, "first");
    }

    #[test]
    fn expired_lease_does_not_block_add() {
        let store = LeaseStore::new(TimeDelta::zero());
        assert!(store.add(ip(1), "first", ""));
        assert!(store.add(ip(1), "second", ""));
        assert_eq!(store.get(ip(1)).comment, "second");
    }

    #[test]
    fn concurrent_adds_have_one_winner() {
        let store = LeaseStore::new(TimeDelta::minutes(5));
        let contenders: usize = 16;
        let barrier = Barrier::new(contenders);
        let winners = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for n in 0..contenders {
                let (store, barrier, winners) = (&store, &barrier, &winners);
                scope.spawn(move || {
                    barrier.wait();
                    if store.add(ip(7), &format!("worker {n}"), "") {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn stale_lease_visible_until_clean() {
        let store = LeaseStore::new(TimeDelta::minutes(-1));
        assert!(store.add(ip(3), "stale", ""));

        let lease = store.get(ip(3));
        assert!(lease.is_locked());
        assert!(lease.is_expired_at(Utc::now()));

        assert_eq!(store.clean(), 1);
        assert!(!store.get(ip(3)).is_locked());
    }

    #[test]
    fn clean_keeps_live_leases_and_is_idempotent() {
        let expired = LeaseStore::new(TimeDelta::minutes(-1));
        assert!(expired.add(ip(1), "old", ""));

        let store = LeaseStore::new(TimeDelta::minutes(10));
        assert!(store.add(ip(2), "fresh", ""));

        assert_eq!(expired.clean(), 1);
        assert_eq!(store.clean(), 0);
        assert_eq!(store.clean(), 0);
        assert_eq!(expired.clean(), 0);
        assert_eq!(store.get(ip(2)).comment, "fresh");
    }

    #[test]
    fn delete_is_idempotent() {
        let store = LeaseStore::new(TimeDelta::minutes(10));
        assert!(store.add(ip(4), "tmp", ""));
        store.delete(ip(4));
        store.delete(ip(4));
        assert!(store.is_empty());
        assert!(store.add(ip(4), "again", ""));
    }

    #[test]
    fn snapshot_is_sorted() {
        let store = LeaseStore::new(TimeDelta::minutes(10));
        for d in [9, 2, 5] {
            assert!(store.add(ip(d), "x", ""));
        }
        let addrs: Vec<Ipv4Addr> = store.snapshot().into_iter().map(|(a, _)| a).collect();
        assert_eq!(addrs, vec![ip(2), ip(5), ip(9)]);
    }
}

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::TimeDelta;
use netmgmt_core::allocator::ReserveError;
use netmgmt_core::inventory::{Inventory, InventoryError};

use crate::support::{self, NETDEF, addr, named};

const POOL: &str = r#"
- name: pool
  cidr: 10.1.0.0/28
- name: legacy
  cidr: 10.2.0.0/29
  managed: false
"#;

#[tokio::test]
async fn full_network_reserves_nothing() {
    let inventory = support::inventory(
        support::load(NETDEF),
        &["10.0.0.1"],
        named(&[("10.0.0.2", "fw.example", "")]),
        TimeDelta::minutes(30),
    );

    let err = inventory.reserve("tiny", "one more", "").await.unwrap_err();
    assert!(matches!(
        err,
        InventoryError::Reserve(ReserveError::NoFreeAddress(ref name)) if name == "tiny"
    ));
    assert!(err.is_retryable());
    assert!(inventory.leases().is_empty());
}

#[tokio::test]
async fn reservation_avoids_used_and_unmanaged_addresses() {
    let inventory = support::inventory(
        support::load(NETDEF),
        &["192.168.10.1", "192.168.10.2", "192.168.10.3"],
        named(&[
            ("192.168.10.4", "a.office.example", ""),
            ("192.168.10.5", "b.office.example", ""),
            ("192.168.10.6", "c.office.example", ""),
            ("192.168.10.7", "d.office.example", ""),
        ]),
        TimeDelta::minutes(30),
    );

    let reserved = inventory.reserve("office", "laptop", "it").await.unwrap();
    assert_eq!(reserved, addr("192.168.10.8"));
    assert!(matches!(
        inventory.reserve("office", "laptop 2", "it").await,
        Err(InventoryError::Reserve(ReserveError::NoFreeAddress(_)))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_get_distinct_addresses() {
    let inventory = Arc::new(support::inventory(
        support::load(POOL),
        &[],
        HashMap::new(),
        TimeDelta::minutes(30),
    ));

    let mut tasks = Vec::new();
    for n in 0..14 {
        let inventory = Arc::clone(&inventory);
        tasks.push(tokio::spawn(async move {
            reserve_with_retries(&inventory, &format!("worker {n}")).await
        }));
    }

    let mut reserved: HashSet<Ipv4Addr> = HashSet::new();
    for task in tasks {
        assert!(reserved.insert(task.await.unwrap()));
    }
    assert_eq!(reserved.len(), 14);
    assert_eq!(inventory.leases().len(), 14);

    assert!(matches!(
        inventory.reserve("pool", "one too many", "").await,
        Err(InventoryError::Reserve(ReserveError::NoFreeAddress(_)))
    ));
}

#[tokio::test]
async fn unmanaged_and_unknown_networks_are_refused() {
    let inventory = support::inventory(support::load(POOL), &[], HashMap::new(), TimeDelta::minutes(30));

    let err = inventory.reserve("legacy", "vm", "").await.unwrap_err();
    assert!(matches!(err, InventoryError::Reserve(ReserveError::NotManaged(_))));
    assert!(!err.is_retryable());

    assert!(matches!(
        inventory.reserve("nowhere", "vm", "").await,
        Err(InventoryError::UnknownNetwork(_))
    ));
}

async fn reserve_with_retries(inventory: &Inventory, comment: &str) -> Ipv4Addr {
    for _ in 0..100 {
        match inventory.reserve("pool", comment, "").await {
            Ok(addr) => return addr,
            Err(e) if e.is_retryable() => continue,
            Err(e) => panic!("reservation failed: {e}"),
        }
    }
    panic!("no reservation after 100 attempts");
}

use std::collections::HashMap;
use std::net::Ipv4Addr;

use chrono::TimeDelta;
use netmgmt_common::network::record::{Unmanaged, Utilization};
use netmgmt_core::scanner::ScanScope;

use crate::support::{self, NETDEF, addr, named};

#[test]
fn definition_file_round_trip() {
    let networks = support::load(NETDEF);

    assert_eq!(networks.len(), 3);
    let office = &networks[0];
    assert_eq!(office.gateway, Some(addr("192.168.10.1")));
    assert_eq!(office.vlan.id, 110);
    assert_eq!(office.expand_managed().unwrap().len(), 8);
    assert_eq!(office.expand_detailed().unwrap().len(), 14);
    assert!(networks.iter().all(|n| n.managed));
    assert_eq!(networks[1].foreign_ranges[0].description, "storage team");
}

#[tokio::test]
async fn detailed_scan_of_office() {
    let inventory = support::inventory(
        support::load(NETDEF),
        &["192.168.10.1", "192.168.10.3", "192.168.10.10"],
        named(&[("192.168.10.4", "printer.office.example", "2nd floor")]),
        TimeDelta::minutes(30),
    );

    let report = inventory.scan_network("office", ScanScope::Detailed).await.unwrap();

    assert_eq!(report.records.len(), 14);
    assert_eq!(
        report.utilization,
        Utilization {
            total: 14,
            used: 4,
            free: 10,
            used_percent: 28,
            free_percent: 71
        }
    );

    let printer = report.records.iter().find(|r| r.ip == addr("192.168.10.4")).unwrap();
    assert_eq!(printer.name, "printer.office.example");
    assert_eq!(printer.desc, "2nd floor");
    assert!(!printer.free);

    let dhcp_client = report.records.iter().find(|r| r.ip == addr("192.168.10.10")).unwrap();
    assert_eq!(dhcp_client.unmanaged, Some(Unmanaged::Dhcp));
    assert!(dhcp_client.pingable);

    let cached = inventory.network("office").await.unwrap().utilization;
    assert_eq!(cached, report.utilization);
}

#[tokio::test]
async fn managed_scan_skips_dhcp_pool() {
    let inventory = support::inventory(
        support::load(NETDEF),
        &["192.168.10.1", "192.168.10.3", "192.168.10.10"],
        named(&[("192.168.10.4", "printer.office.example", "")]),
        TimeDelta::minutes(30),
    );

    let report = inventory.scan_network("office", ScanScope::Managed).await.unwrap();

    assert_eq!(report.records.len(), 8);
    assert_eq!(report.utilization.used, 3);
    assert_eq!(report.utilization.used_percent, 37);
    assert_eq!(report.utilization.free_percent, 62);
    assert!(report.records.iter().all(|r| r.unmanaged.is_none()));
    assert_eq!(
        inventory.network("office").await.unwrap().utilization,
        Utilization::default()
    );
}

#[tokio::test]
async fn report_serializes_unmanaged_reason() {
    let inventory = support::inventory(support::load(NETDEF), &[], HashMap::new(), TimeDelta::minutes(30));

    let report = inventory.scan_network("servers", ScanScope::Detailed).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["records"][4]["ip"], "10.20.0.5");
    assert_eq!(json["records"][4]["unmanaged"], "Foreign Range: storage team");
    assert_eq!(json["records"][0]["unmanaged"], serde_json::Value::Null);
    assert_eq!(json["utilization"]["free_percent"], 100);
}

#[tokio::test]
async fn stale_lease_visible_until_next_scan() {
    let inventory = support::inventory(
        support::load(NETDEF),
        &["10.0.0.1"],
        HashMap::new(),
        TimeDelta::minutes(-1),
    );

    let reserved: Ipv4Addr = inventory.reserve("tiny", "short lived", "ci").await.unwrap();
    assert_eq!(reserved, addr("10.0.0.2"));

    let stale = inventory.leases().get(reserved);
    assert!(stale.is_locked());
    assert_eq!(stale.comment, "short lived");

    let report = inventory.scan_network("tiny", ScanScope::Managed).await.unwrap();
    let record = report.records.iter().find(|r| r.ip == reserved).unwrap();
    assert!(record.free);
    assert!(inventory.leases().is_empty());
}

#[tokio::test]
async fn node_lookup_by_address() {
    let inventory = support::inventory(support::load(NETDEF), &[], HashMap::new(), TimeDelta::minutes(30));

    let (found, network) = inventory.locate_node("10.20.0.3").await.unwrap().unwrap();
    assert_eq!(found, addr("10.20.0.3"));
    assert_eq!(network.name, "servers");

    let (_, network) = inventory.locate_node("192.168.10.12").await.unwrap().unwrap();
    assert_eq!(network.name, "office");

    assert!(inventory.locate_node("8.8.8.8").await.unwrap().is_none());
}

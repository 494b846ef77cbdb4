use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use netmgmt_common::network::definition::{self, Network};
use netmgmt_core::inventory::Inventory;
use netmgmt_core::lease::LeaseStore;
use netmgmt_core::scanner::{Identity, Pinger, ProbeEngine, ProbeSettings, Resolver};

pub const NETDEF: &str = r#"
- name: office
  description: Office clients
  cidr: 192.168.10.0/28
  dc: fra1
  gateway: 192.168.10.1
  vlan:
    name: clients
    id: 110
  dhcp:
    - start: 192.168.10.9
      end: 192.168.10.14
- name: servers
  cidr: 10.20.0.0/29
  foreign_ranges:
    - description: storage team
      range:
        start: 10.20.0.5
        end: 10.20.0.6
- name: tiny
  cidr: 10.0.0.0/30
"#;

#[derive(Default)]
pub struct StaticPinger(pub HashSet<Ipv4Addr>);

#[async_trait]
impl Pinger for StaticPinger {
    async fn ping(&self, addr: Ipv4Addr) -> anyhow::Result<bool> {
        Ok(self.0.contains(&addr))
    }
}

#[derive(Default)]
pub struct StaticResolver(pub HashMap<Ipv4Addr, Identity>);

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, addr: Ipv4Addr) -> anyhow::Result<Option<Identity>> {
        Ok(self.0.get(&addr).cloned())
    }
}

pub fn addr(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

pub fn named(entries: &[(&str, &str, &str)]) -> HashMap<Ipv4Addr, Identity> {
    entries
        .iter()
        .map(|(ip, hostname, description)| {
            let identity = Identity {
                hostname: hostname.to_string(),
                description: description.to_string(),
            };
            (addr(ip), identity)
        })
        .collect()
}

/// Writes `contents` to a temporary definition file and loads it back.
pub fn load(contents: &str) -> Vec<Network> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    definition::load_networks(file.path()).unwrap()
}

pub fn inventory(
    networks: Vec<Network>,
    alive: &[&str],
    names: HashMap<Ipv4Addr, Identity>,
    lease_duration: TimeDelta,
) -> Inventory {
    let engine = ProbeEngine::new(
        Arc::new(StaticPinger(alive.iter().map(|ip| addr(ip)).collect())),
        Arc::new(StaticResolver(names)),
        Arc::new(LeaseStore::new(lease_duration)),
        ProbeSettings {
            concurrency: 8,
            no_dns: false,
            no_ping: false,
        },
    );
    Inventory::new(networks, engine)
}

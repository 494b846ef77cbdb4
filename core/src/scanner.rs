//! The **probe engine**: finds out which addresses of a candidate set are in use.
//!
//! A scan runs four phases, strictly one after another, over one shared result map:
//!
//! 1. **Identity**: reverse DNS for every address ([`Resolver`]).
//! 2. **Liveness**: an echo probe to every address ([`Pinger`]).
//! 3. **Leases**: sweep expired leases, then attach the current lease to each record.
//! 4. **Utilization**: mark free records and tally the figures.
//!
//! Phases 1 and 2 fan out one task per address, bounded by a semaphore, and end
//! at a join barrier. Probe failures are logged and recorded as negative results.
//! They never abort a scan.
//!
//! The probe strategies sit behind the [`Pinger`] and [`Resolver`] traits, so the
//! engine does not care whether echo probes use a raw socket or a TCP handshake.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use netmgmt_common::config::Config;
use netmgmt_common::network::definition::Network;
use netmgmt_common::network::record::{AddressRecord, Candidate, Utilization};

use crate::lease::LeaseStore;

pub mod ping;
pub mod resolver;

/// Decides whether a single address answers.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, addr: Ipv4Addr) -> anyhow::Result<bool>;
}

/// What reverse DNS knows about an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub hostname: String,
    pub description: String,
}

/// Looks up the identity of a single address. `Ok(None)` means it has no name.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, addr: Ipv4Addr) -> anyhow::Result<Option<Identity>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub concurrency: usize,
    pub no_dns: bool,
    pub no_ping: bool,
}

impl From<&Config> for ProbeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            concurrency: cfg.concurrency.max(1),
            no_dns: cfg.no_dns,
            no_ping: cfg.no_ping,
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Which addresses of a network a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// Every usable address, DHCP and foreign ones tagged as unmanaged.
    Detailed,
    /// Only the addresses this system may hand out.
    Managed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub records: Vec<AddressRecord>,
    pub utilization: Utilization,
}

impl ScanReport {
    pub fn free(&self) -> impl Iterator<Item = &AddressRecord> {
        self.records.iter().filter(|record| !record.used())
    }
}

type SharedResults = Arc<RwLock<HashMap<Ipv4Addr, AddressRecord>>>;

pub struct ProbeEngine {
    pinger: Arc<dyn Pinger>,
    resolver: Arc<dyn Resolver>,
    leases: Arc<LeaseStore>,
    settings: ProbeSettings,
}

impl ProbeEngine {
    pub fn new(
        pinger: Arc<dyn Pinger>,
        resolver: Arc<dyn Resolver>,
        leases: Arc<LeaseStore>,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            pinger,
            resolver,
            leases,
            settings,
        }
    }

    pub fn leases(&self) -> &Arc<LeaseStore> {
        &self.leases
    }

    /// Expands `network` according to `scope` and scans the result.
    pub async fn scan_network(
        &self,
        network: &Network,
        scope: ScanScope,
    ) -> anyhow::Result<ScanReport> {
        let candidates: Vec<Candidate> = match scope {
            ScanScope::Detailed => network.expand_detailed()?,
            ScanScope::Managed => network
                .expand_managed()?
                .into_iter()
                .map(Candidate::from)
                .collect(),
        };
        debug!(
            "Scanning {} candidate(s) of network {}",
            candidates.len(),
            network.name
        );
        Ok(self.scan(candidates).await)
    }

    /// Runs all four phases over `candidates`. Always completes.
    pub async fn scan(&self, candidates: Vec<Candidate>) -> ScanReport {
        let addrs: Vec<Ipv4Addr> = candidates.iter().map(|c| c.addr).collect();
        let results: SharedResults = Arc::new(RwLock::new(
            candidates
                .into_iter()
                .map(|candidate| (candidate.addr, AddressRecord::new(candidate)))
                .collect(),
        ));

        if !self.settings.no_dns {
            self.resolve_identities(&addrs, &results).await;
        }
        if !self.settings.no_ping {
            self.probe_liveness(&addrs, &results).await;
        }
        self.annotate_leases(&results).await;

        let mut records: Vec<AddressRecord> = {
            let mut guard = results.write().await;
            guard.drain().map(|(_, record)| record).collect()
        };
        records.sort_by_key(|record| record.ip);

        let utilization: Utilization = tally(&mut records);
        ScanReport {
            records,
            utilization,
        }
    }

    async fn resolve_identities(&self, addrs: &[Ipv4Addr], results: &SharedResults) {
        debug!("Resolving {} address(es)", addrs.len());
        self.fan_out(addrs, |addr| {
            let resolver = Arc::clone(&self.resolver);
            let results = Arc::clone(results);
            async move {
                match resolver.resolve(addr).await {
                    Ok(Some(identity)) => {
                        if let Some(record) = results.write().await.get_mut(&addr) {
                            record.name = identity.hostname;
                            record.desc = identity.description;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => debug!("Reverse lookup of {addr} failed: {e:#}"),
                }
            }
        })
        .await;
    }

    async fn probe_liveness(&self, addrs: &[Ipv4Addr], results: &SharedResults) {
        debug!("Probing {} address(es)", addrs.len());
        self.fan_out(addrs, |addr| {
            let pinger = Arc::clone(&self.pinger);
            let results = Arc::clone(results);
            async move {
                match pinger.ping(addr).await {
                    Ok(true) => {
                        if let Some(record) = results.write().await.get_mut(&addr) {
                            record.pingable = true;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => debug!("Echo probe to {addr} failed: {e:#}"),
                }
            }
        })
        .await;
    }

    async fn annotate_leases(&self, results: &SharedResults) {
        self.leases.clean();
        let mut guard = results.write().await;
        for (addr, record) in guard.iter_mut() {
            record.lock = self.leases.get(*addr);
        }
    }

    /// Spawns `probe(addr)` for every address, at most `concurrency` at a time,
    /// and waits for all of them.
    async fn fan_out<F, Fut>(&self, addrs: &[Ipv4Addr], probe: F)
    where
        F: Fn(Ipv4Addr) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks: JoinSet<()> = JoinSet::new();

        for addr in addrs.iter().copied() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let task = probe(addr);
            tasks.spawn(async move {
                let _permit = permit;
                task.await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Probe task did not complete: {e}");
            }
        }
    }
}

/// Marks every record free or used and returns the resulting figures.
fn tally(records: &mut [AddressRecord]) -> Utilization {
    for record in records.iter_mut() {
        record.free = !record.used();
    }
    Utilization::tally(records.iter())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

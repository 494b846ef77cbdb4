use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use netmgmt_common::config::Config;
use netmgmt_common::network::definition::{self, Network};

use crate::allocator::{self, ReserveError};
use crate::lease::LeaseStore;
use crate::scanner::ping::default_pinger;
use crate::scanner::resolver::{DnsResolver, lookup_node};
use crate::scanner::{ProbeEngine, ProbeSettings, ScanReport, ScanScope};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("unknown network {0:?}")]
    UnknownNetwork(String),

    #[error(transparent)]
    Reserve(#[from] ReserveError),
}

impl InventoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Reserve(e) if e.is_retryable())
    }
}

/// The loaded networks plus the engine that scans them.
///
/// An inventory built by [`Inventory::load`] opens its probes on first use, so
/// lookups that never scan do not touch raw sockets.
pub struct Inventory {
    networks: RwLock<Vec<Network>>,
    engine: OnceLock<ProbeEngine>,
    cfg: Option<Config>,
}

impl Inventory {
    pub fn new(networks: Vec<Network>, engine: ProbeEngine) -> Self {
        Self {
            networks: RwLock::new(networks),
            engine: OnceLock::from(engine),
            cfg: None,
        }
    }

    /// Loads the definition file. The probes `cfg` asks for are wired up lazily.
    pub fn load(cfg: &Config) -> anyhow::Result<Self> {
        let networks: Vec<Network> = definition::load_networks(&cfg.file)
            .with_context(|| format!("loading network definitions from {}", cfg.file.display()))?;
        info!("Loaded {} network(s) from {}", networks.len(), cfg.file.display());

        Ok(Self {
            networks: RwLock::new(networks),
            engine: OnceLock::new(),
            cfg: Some(cfg.clone()),
        })
    }

    /// The probe engine, built from the loaded configuration on first call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn engine(&self) -> &ProbeEngine {
        self.engine.get_or_init(|| {
            let cfg: Config = self.cfg.clone().unwrap_or_default();
            debug!("Starting probes");
            ProbeEngine::new(
                default_pinger(&cfg),
                Arc::new(DnsResolver::from_config(&cfg)),
                Arc::new(LeaseStore::new(cfg.lease_duration())),
                ProbeSettings::from(&cfg),
            )
        })
    }

    pub fn leases(&self) -> &Arc<LeaseStore> {
        self.engine().leases()
    }

    pub async fn networks(&self) -> Vec<Network> {
        self.networks.read().await.clone()
    }

    pub async fn network(&self, name: &str) -> Result<Network, InventoryError> {
        self.networks
            .read()
            .await
            .iter()
            .find(|network| network.name == name)
            .cloned()
            .ok_or_else(|| InventoryError::UnknownNetwork(name.to_string()))
    }

    /// Scans one network. A detailed scan also refreshes its cached utilization.
    pub async fn scan_network(&self, name: &str, scope: ScanScope) -> anyhow::Result<ScanReport> {
        let network: Network = self.network(name).await?;
        let report: ScanReport = self.engine().scan_network(&network, scope).await?;

        if scope == ScanScope::Detailed {
            let mut networks = self.networks.write().await;
            if let Some(cached) = networks.iter_mut().find(|network| network.name == name) {
                cached.utilization = report.utilization;
            }
        }
        Ok(report)
    }

    pub async fn reserve(&self, name: &str, comment: &str, owner: &str) -> Result<Ipv4Addr, InventoryError> {
        let network: Network = self.network(name).await?;
        Ok(allocator::reserve(self.engine(), &network, comment, owner).await?)
    }

    pub fn release(&self, addr: Ipv4Addr) {
        self.leases().delete(addr);
    }

    /// First network whose block contains `addr`.
    pub async fn network_for(&self, addr: IpAddr) -> Option<Network> {
        self.networks
            .read()
            .await
            .iter()
            .find(|network| network.contains(addr))
            .cloned()
    }

    /// Resolves `node` and returns the first of its addresses that belongs to a
    /// known network, together with that network.
    pub async fn locate_node(&self, node: &str) -> anyhow::Result<Option<(Ipv4Addr, Network)>> {
        let addrs: Vec<Ipv4Addr> = lookup_node(node).await?;
        debug!("{node} resolves to {addrs:?}");

        for addr in addrs {
            if let Some(network) = self.network_for(IpAddr::V4(addr)).await {
                return Ok(Some((addr, network)));
            }
        }
        Ok(None)
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

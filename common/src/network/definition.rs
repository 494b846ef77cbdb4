//! # Network Definitions
//!
//! The in-memory form of the network definition file, plus the expansions that
//! turn one network into scan candidates:
//!
//! * [`Network::expand`]: every address of the block.
//! * [`Network::expand_managed`]: only addresses this system may hand out.
//! * [`Network::expand_detailed`]: managed addresses plus DHCP and foreign
//!   addresses, the latter tagged with why they are excluded.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use pnet::ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DefinitionError, RangeError};
use crate::network::range::{self, Ipv4Range};
use crate::network::record::{Candidate, Unmanaged, Utilization};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: i64,
}

/// A sub-range managed by someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignRange {
    #[serde(default)]
    pub description: String,
    pub range: Ipv4Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cidr: String,
    #[serde(default)]
    pub dc: String,
    #[serde(default)]
    pub gateway: Option<Ipv4Addr>,
    #[serde(default)]
    pub dns: Vec<Ipv4Addr>,
    #[serde(default)]
    pub vlan: Vlan,
    #[serde(default)]
    pub dhcp: Vec<Ipv4Range>,
    #[serde(default)]
    pub foreign_ranges: Vec<ForeignRange>,
    /// Reservations are refused on networks that are not managed.
    #[serde(default = "default_managed")]
    pub managed: bool,
    /// Figures of the most recent detailed scan.
    #[serde(default)]
    pub utilization: Utilization,
}

fn default_managed() -> bool {
    true
}

impl Network {
    pub fn new(name: &str, cidr: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            cidr: cidr.to_string(),
            dc: String::new(),
            gateway: None,
            dns: Vec::new(),
            vlan: Vlan::default(),
            dhcp: Vec::new(),
            foreign_ranges: Vec::new(),
            managed: true,
            utilization: Utilization::default(),
        }
    }

    pub fn block(&self) -> Result<Ipv4Network, RangeError> {
        range::parse_cidr(&self.cidr)
    }

    /// CIDR membership. A network with a malformed block contains nothing.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (addr, self.block()) {
            (IpAddr::V4(v4), Ok(block)) => block.contains(v4),
            _ => false,
        }
    }

    /// Every address of the block, network and broadcast included.
    pub fn expand(&self) -> Result<Vec<Ipv4Addr>, RangeError> {
        range::expand_cidr(&self.cidr)
    }

    /// Usable addresses not carved out by a DHCP or foreign range.
    pub fn expand_managed(&self) -> Result<Vec<Ipv4Addr>, RangeError> {
        let excluded: HashMap<Ipv4Addr, Unmanaged> = self.exclusions()?;
        Ok(self
            .expand_usable()?
            .into_iter()
            .filter(|addr| !excluded.contains_key(addr))
            .collect())
    }

    /// Usable addresses with DHCP and foreign ones kept, but tagged.
    ///
    /// When ranges overlap, the first tag wins: DHCP ranges are applied before
    /// foreign ranges, each in definition order.
    pub fn expand_detailed(&self) -> Result<Vec<Candidate>, RangeError> {
        let mut excluded: HashMap<Ipv4Addr, Unmanaged> = self.exclusions()?;
        Ok(self
            .expand_usable()?
            .into_iter()
            .map(|addr| Candidate {
                addr,
                unmanaged: excluded.remove(&addr),
            })
            .collect())
    }

    /// Checks the block parses and that every exclusion range is ordered and inside it.
    pub fn validate(&self) -> Result<(), RangeError> {
        let block: Ipv4Network = self.block()?;
        let foreign = self.foreign_ranges.iter().map(|fr| &fr.range);

        for rng in self.dhcp.iter().chain(foreign) {
            rng.ensure_ordered()?;
            if !block.contains(rng.start_addr) || !block.contains(rng.end_addr) {
                return Err(RangeError::OutsideBlock {
                    start: rng.start_addr,
                    end: rng.end_addr,
                    cidr: self.cidr.clone(),
                });
            }
        }
        Ok(())
    }

    fn expand_usable(&self) -> Result<Vec<Ipv4Addr>, RangeError> {
        let block: Ipv4Network = self.block()?;
        let (network_addr, broadcast_addr) = (block.network(), block.broadcast());

        Ok(self
            .expand()?
            .into_iter()
            .filter(|addr| *addr != network_addr && *addr != broadcast_addr)
            .collect())
    }

    fn exclusions(&self) -> Result<HashMap<Ipv4Addr, Unmanaged>, RangeError> {
        let mut excluded: HashMap<Ipv4Addr, Unmanaged> = HashMap::new();

        for rng in &self.dhcp {
            for addr in rng.expand()? {
                excluded.entry(addr).or_insert(Unmanaged::Dhcp);
            }
        }

        for foreign in &self.foreign_ranges {
            for addr in foreign.range.expand()? {
                excluded
                    .entry(addr)
                    .or_insert_with(|| Unmanaged::Foreign(foreign.description.clone()));
            }
        }

        Ok(excluded)
    }
}

/// Serialization formats accepted for the definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, DefinitionError> {
        let ext: String = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            _ => Err(DefinitionError::UnsupportedFormat(ext)),
        }
    }
}

/// Reads and validates the network definitions at `path`.
pub fn load_networks(path: &Path) -> Result<Vec<Network>, DefinitionError> {
    let format: Format = Format::from_path(path)?;
    let data: String = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let networks: Vec<Network> = parse_networks(&data, format)?;
    debug!("Loaded {} network(s) from {}", networks.len(), path.display());
    Ok(networks)
}

/// Parses and validates network definitions from an in-memory document.
pub fn parse_networks(data: &str, format: Format) -> Result<Vec<Network>, DefinitionError> {
    let networks: Vec<Network> = match format {
        Format::Yaml => serde_yaml::from_str(data)?,
        Format::Json => serde_json::from_str(data)?,
    };

    let mut seen: HashSet<&str> = HashSet::new();
    for network in &networks {
        if !seen.insert(network.name.as_str()) {
            return Err(DefinitionError::DuplicateName(network.name.clone()));
        }
        network
            .validate()
            .map_err(|source| DefinitionError::Invalid {
                network: network.name.clone(),
                source,
            })?;
    }

    Ok(networks)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

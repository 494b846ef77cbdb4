//! Claims one free address of a network.
//!
//! A reservation is scan, pick, then lease. The scan and the lease are not one
//! atomic step: a concurrent caller may lease the picked address in between, in
//! which case the attempt fails with [`ReserveError::LostRace`] and the caller
//! runs a fresh attempt.

use std::net::Ipv4Addr;

use thiserror::Error;
use tracing::{debug, info};

use netmgmt_common::error::RangeError;
use netmgmt_common::network::definition::Network;
use netmgmt_common::network::record::{AddressRecord, Candidate};

use crate::scanner::{ProbeEngine, ScanReport};

#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("a reservation needs a comment")]
    MissingComment,

    #[error("network {0} is not managed by this inventory")]
    NotManaged(String),

    #[error("no free address left in network {0}")]
    NoFreeAddress(String),

    #[error("{addr} was leased by someone else in the meantime")]
    LostRace { addr: Ipv4Addr },

    #[error(transparent)]
    Range(#[from] RangeError),
}

impl ReserveError {
    /// Whether a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoFreeAddress(_) | Self::LostRace { .. })
    }
}

/// Scans the managed addresses of `network` and leases one that looks free.
pub async fn reserve(
    engine: &ProbeEngine,
    network: &Network,
    comment: &str,
    owner: &str,
) -> Result<Ipv4Addr, ReserveError> {
    if comment.trim().is_empty() {
        return Err(ReserveError::MissingComment);
    }
    if !network.managed {
        return Err(ReserveError::NotManaged(network.name.clone()));
    }

    let candidates: Vec<Candidate> = network
        .expand_managed()?
        .into_iter()
        .map(Candidate::from)
        .collect();
    let report: ScanReport = engine.scan(candidates).await;
    debug!(
        "{} of {} managed address(es) in {} look free",
        report.utilization.free, report.utilization.total, network.name
    );

    let free: Vec<&AddressRecord> = report.free().collect();
    if free.is_empty() {
        return Err(ReserveError::NoFreeAddress(network.name.clone()));
    }

    let addr: Ipv4Addr = free[rand::random_range(0..free.len())].ip;
    if !engine.leases().add(addr, comment, owner) {
        return Err(ReserveError::LostRace { addr });
    }

    info!("Reserved {addr} in {} for {comment:?}", network.name);
    Ok(addr)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

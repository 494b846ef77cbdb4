//! # Scan Records
//!
//! Per-address results of an inventory scan and the utilization figures
//! derived from them.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::network::lease::Lease;

/// Why an address inside a block is not handed out by this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Unmanaged {
    Dhcp,
    Foreign(String),
}

const FOREIGN_PREFIX: &str = "Foreign Range: ";

impl fmt::Display for Unmanaged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unmanaged::Dhcp => write!(f, "DHCP"),
            Unmanaged::Foreign(description) => write!(f, "{FOREIGN_PREFIX}{description}"),
        }
    }
}

impl From<Unmanaged> for String {
    fn from(reason: Unmanaged) -> Self {
        reason.to_string()
    }
}

impl TryFrom<String> for Unmanaged {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "DHCP" {
            return Ok(Unmanaged::Dhcp);
        }
        value
            .strip_prefix(FOREIGN_PREFIX)
            .map(|description| Unmanaged::Foreign(description.to_string()))
            .ok_or_else(|| format!("unknown unmanaged reason: {value}"))
    }
}

/// One address queued for a scan, optionally tagged with a known exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub addr: Ipv4Addr,
    pub unmanaged: Option<Unmanaged>,
}

impl From<Ipv4Addr> for Candidate {
    fn from(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            unmanaged: None,
        }
    }
}

/// Everything a scan learned about one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub ip: Ipv4Addr,
    pub name: String,
    pub desc: String,
    pub pingable: bool,
    pub lock: Lease,
    pub free: bool,
    pub unmanaged: Option<Unmanaged>,
}

impl AddressRecord {
    pub fn new(candidate: Candidate) -> Self {
        Self {
            ip: candidate.addr,
            name: String::new(),
            desc: String::new(),
            pingable: false,
            lock: Lease::default(),
            free: false,
            unmanaged: candidate.unmanaged,
        }
    }

    /// An address is in use when it answers, has a name, or is reserved.
    pub fn used(&self) -> bool {
        self.pingable || !self.name.is_empty() || self.lock.is_locked()
    }
}

/// Aggregate pool statistics for one network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utilization {
    pub total: usize,
    pub used: usize,
    pub free: usize,
    pub used_percent: usize,
    pub free_percent: usize,
}

impl Utilization {
    /// Counts used and free records. Percentages are floored, so they may sum to
    /// less than 100. An empty record set yields all zeros.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a AddressRecord>) -> Self {
        let (total, used) = records
            .into_iter()
            .fold((0usize, 0usize), |(total, used), record| {
                (total + 1, used + usize::from(record.used()))
            });

        if total == 0 {
            return Self::default();
        }

        let free: usize = total - used;
        Self {
            total,
            used,
            free,
            used_percent: used * 100 / total,
            free_percent: free * 100 / total,
        }
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
    use chrono::Utc;

    fn record(last: u8) -> AddressRecord {
        AddressRecord::new(Candidate::from(Ipv4Addr::new(10, 0, 0, last)))
    }

    #[test]
    fn used_rule() {
        let mut rec = record(1);
        assert!(!rec.used());

        rec.pingable = true;
        assert!(rec.used());

        let mut rec = record(2);
        rec.name = "db01.example.org".into();
        assert!(rec.used());

        let mut rec = record(3);
        rec.lock = Lease::new("reserved", "", Utc::now());
        assert!(rec.used());

        // a description alone does not mark an address as used
        let mut rec = record(4);
        rec.desc = "rack 4".into();
        assert!(!rec.used());
    }

    #[test]
    fn tally_floors_percentages() {
        let mut records: Vec<AddressRecord> = (1..=3).map(record).collect();
        records[0].pingable = true;

        let util = Utilization::tally(&records);
        assert_eq!(util.total, 3);
        assert_eq!(util.used, 1);
        assert_eq!(util.free, 2);
        assert_eq!(util.used_percent, 33);
        assert_eq!(util.free_percent, 66);
        assert_eq!(util.used + util.free, util.total);
    }

    #[test]
    fn tally_exact_division_sums_to_hundred() {
        let mut records: Vec<AddressRecord> = (1..=4).map(record).collect();
        records[0].pingable = true;

        let util = Utilization::tally(&records);
        assert_eq!(util.used_percent, 25);
        assert_eq!(util.free_percent, 75);
    }

    #[test]
    fn tally_of_nothing_is_zero() {
        assert_eq!(Utilization::tally(&[]), Utilization::default());
    }

    #[test]
    fn unmanaged_reason_text() {
        assert_eq!(Unmanaged::Dhcp.to_string(), "DHCP");
        assert_eq!(
            Unmanaged::Foreign("Storage team".into()).to_string(),
            "Foreign Range: Storage team"
        );
        assert_eq!(
            Unmanaged::try_from("Foreign Range: lab".to_string()),
            Ok(Unmanaged::Foreign("lab".into()))
        );
        assert!(Unmanaged::try_from("bogus".to_string()).is_err());
    }
}

//! # IPv4 Range Algebra
//!
//! Pure functions over IPv4 addresses: stepping to the next address, expanding
//! closed ranges and CIDR blocks into ordered address lists.
//!
//! Expansion always walks [`successor`], so every list produced here is strictly
//! increasing. Nothing in this module wraps around the top of the address space.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Represents a closed range of IPv4 addresses, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Range {
    #[serde(rename = "start")]
    pub start_addr: Ipv4Addr,
    #[serde(rename = "end")]
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Expands the range into every address it covers, in order.
    ///
    /// Fails with [`RangeError::EndBeforeStart`] instead of yielding an empty list
    /// when the range is reversed.
    pub fn expand(&self) -> Result<Vec<Ipv4Addr>, RangeError> {
        expand_range(self.start_addr, self.end_addr)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start_addr <= addr && addr <= self.end_addr
    }

    /// Number of addresses covered. A reversed range covers none.
    pub fn size(&self) -> u64 {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        if end < start {
            0
        } else {
            u64::from(end - start) + 1
        }
    }

    pub fn ensure_ordered(&self) -> Result<(), RangeError> {
        if self.end_addr < self.start_addr {
            return Err(RangeError::EndBeforeStart {
                start: self.start_addr,
                end: self.end_addr,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_addr, self.end_addr)
    }
}

/// Returns the address following `addr`, carrying into the higher octets.
///
/// `255.255.255.255` has no successor.
pub fn successor(addr: Ipv4Addr) -> Option<Ipv4Addr> {
    u32::from(addr).checked_add(1).map(Ipv4Addr::from)
}

/// Expands `start..=end` by repeated [`successor`] steps.
pub fn expand_range(start: Ipv4Addr, end: Ipv4Addr) -> Result<Vec<Ipv4Addr>, RangeError> {
    Ipv4Range::new(start, end).ensure_ordered()?;

    let mut addrs: Vec<Ipv4Addr> = vec![start];
    let mut cursor: Ipv4Addr = start;
    while cursor != end {
        // end >= start, so the walk reaches end before running out of addresses
        let Some(next) = successor(cursor) else {
            break;
        };
        addrs.push(next);
        cursor = next;
    }
    Ok(addrs)
}

/// Parses an IPv4 block in `address/prefix` notation.
pub fn parse_cidr(cidr: &str) -> Result<Ipv4Network, RangeError> {
    let invalid = |reason: String| RangeError::InvalidCidr {
        cidr: cidr.to_string(),
        reason,
    };

    let Some((ip_str, prefix_str)) = cidr.trim().split_once('/') else {
        return Err(invalid("missing '/prefix'".to_string()));
    };

    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| invalid(format!("bad address '{ip_str}': {e}")))?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| invalid(format!("bad prefix '{prefix_str}': {e}")))?;

    Ipv4Network::new(ipv4_addr, prefix).map_err(|e| invalid(e.to_string()))
}

/// Expands a CIDR block into every address it contains, network and broadcast included.
pub fn expand_cidr(cidr: &str) -> Result<Vec<Ipv4Addr>, RangeError> {
    let block: Ipv4Network = parse_cidr(cidr)?;
    let block_len: usize = 1usize << (32 - u32::from(block.prefix()));

    let mut addrs: Vec<Ipv4Addr> = Vec::with_capacity(block_len);
    let mut cursor: Option<Ipv4Addr> = Some(block.network());
    while let Some(addr) = cursor.filter(|addr| block.contains(*addr)) {
        addrs.push(addr);
        cursor = successor(addr);
    }
    Ok(addrs)
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
    use std::net::Ipv4Addr;

    #[test]
    fn successor_increments_last_octet() {
        assert_eq!(
            successor(Ipv4Addr::new(10, 0, 0, 1)),
            Some(Ipv4Addr::new(10, 0, 0, 2))
        );
    }

    #[test]
    fn successor_carries_into_higher_octets() {
        assert_eq!(
            successor(Ipv4Addr::new(10, 0, 0, 255)),
            Some(Ipv4Addr::new(10, 0, 1, 0))
        );
        assert_eq!(
            successor(Ipv4Addr::new(10, 255, 255, 255)),
            Some(Ipv4Addr::new(11, 0, 0, 0))
        );
    }

    #[test]
    fn successor_stops_at_top_of_space() {
        assert_eq!(successor(Ipv4Addr::BROADCAST), None);
    }

    #[test]
    fn expand_range_is_inclusive() {
        let addrs = expand_range(Ipv4Addr::new(10, 0, 0, 254), Ipv4Addr::new(10, 0, 1, 1)).unwrap();
        assert_eq!(
            addrs,
            vec![
                Ipv4Addr::new(10, 0, 0, 254),
                Ipv4Addr::new(10, 0, 0, 255),
                Ipv4Addr::new(10, 0, 1, 0),
                Ipv4Addr::new(10, 0, 1, 1),
            ]
        );
    }

    #[test]
    fn expand_range_single_address() {
        let ip = Ipv4Addr::new(192, 168, 1, 7);
        assert_eq!(expand_range(ip, ip).unwrap(), vec![ip]);
    }

    #[test]
    fn expand_range_reaches_top_of_space() {
        let addrs = expand_range(Ipv4Addr::new(255, 255, 255, 254), Ipv4Addr::BROADCAST).unwrap();
        assert_eq!(addrs.len(), 2);
    }

    #[test]
    fn expand_range_rejects_reversed_range() {
        let start = Ipv4Addr::new(10, 0, 0, 5);
        let end = Ipv4Addr::new(10, 0, 0, 1);
        assert_eq!(
            expand_range(start, end),
            Err(RangeError::EndBeforeStart { start, end })
        );
    }

    #[test]
    fn test_ipv4range_expand_and_size_agree() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 255));
        assert_eq!(range.expand().unwrap().len(), 255);
        assert_eq!(range.size(), 255);

        let reversed = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(reversed.size(), 0);
        assert!(reversed.expand().is_err());
    }

    #[test]
    fn test_ipv4range_contains() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 10), Ipv4Addr::new(10, 0, 0, 20));
        assert!(range.contains(Ipv4Addr::new(10, 0, 0, 10)));
        assert!(range.contains(Ipv4Addr::new(10, 0, 0, 20)));
        assert!(!range.contains(Ipv4Addr::new(10, 0, 0, 21)));
    }

    #[test]
    fn expand_cidr_count_and_order() {
        for (cidr, prefix) in [("10.1.2.3/24", 24u32), ("10.0.0.0/30", 30), ("192.168.4.0/22", 22)] {
            let addrs = expand_cidr(cidr).unwrap();
            assert_eq!(addrs.len(), 1usize << (32 - prefix), "{cidr}");
            assert!(addrs.windows(2).all(|w| w[0] < w[1]), "{cidr} not increasing");

            let block = parse_cidr(cidr).unwrap();
            assert_eq!(addrs.first(), Some(&block.network()));
            assert_eq!(addrs.last(), Some(&block.broadcast()));
        }
    }

    #[test]
    fn expand_cidr_host_routes() {
        assert_eq!(
            expand_cidr("10.0.0.9/32").unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 9)]
        );
        assert_eq!(expand_cidr("10.0.0.9/31").unwrap().len(), 2);
        assert_eq!(
            expand_cidr("255.255.255.254/31").unwrap(),
            vec![Ipv4Addr::new(255, 255, 255, 254), Ipv4Addr::BROADCAST]
        );
    }

    #[test]
    fn parse_cidr_rejects_garbage() {
        assert!(parse_cidr("10.0.0.0").is_err());
        assert!(parse_cidr("10.0.0.0/33").is_err());
        assert!(parse_cidr("fe80::/64").is_err());
        assert!(parse_cidr("not-a-block/24").is_err());
        assert!(parse_cidr(" 10.0.0.0/8 ").is_ok());
    }
}

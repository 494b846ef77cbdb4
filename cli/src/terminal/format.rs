use crate::terminal::colors;
use colored::*;
use netmgmt_common::network::definition::{ForeignRange, Vlan};
use netmgmt_common::network::range::Ipv4Range;
use netmgmt_common::network::record::{AddressRecord, Utilization};

const BAR_WIDTH: usize = 20;

/// Short status word of one scanned address.
pub fn record_status(record: &AddressRecord) -> ColoredString {
    if record.lock.is_locked() {
        return "leased".color(colors::LEASED);
    }
    if record.used() {
        return "used".color(colors::USED);
    }
    match &record.unmanaged {
        Some(reason) => reason.to_string().color(colors::UNMANAGED),
        None => "free".color(colors::FREE),
    }
}

/// `[██████░░░░] 60% used (6/10)`
pub fn utilization_bar(utilization: &Utilization) -> String {
    let filled: usize = utilization.used_percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {}% used ({}/{})",
        "█".repeat(filled).color(colors::USED),
        "░".repeat(BAR_WIDTH - filled).color(colors::FREE),
        utilization.used_percent,
        utilization.used,
        utilization.total
    )
}

pub fn cidr(cidr: &str) -> String {
    match cidr.split_once('/') {
        Some((addr, prefix)) => format!(
            "{}{}{}",
            addr.color(colors::IPV4_ADDR),
            "/".color(colors::SEPARATOR),
            prefix.color(colors::IPV4_PREFIX)
        ),
        None => cidr.color(colors::USED).to_string(),
    }
}

pub fn vlan(vlan: &Vlan) -> String {
    match (vlan.name.is_empty(), vlan.id) {
        (true, 0) => "-".to_string(),
        (true, id) => id.to_string(),
        (false, id) => format!("{} ({id})", vlan.name),
    }
}

pub fn ranges(ranges: &[Ipv4Range]) -> String {
    if ranges.is_empty() {
        return "-".to_string();
    }
    ranges
        .iter()
        .map(|range| format!("{range} ({})", range.size()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn foreign_ranges(ranges: &[ForeignRange]) -> String {
    if ranges.is_empty() {
        return "-".to_string();
    }
    ranges
        .iter()
        .map(|foreign| format!("{} ({}, {})", foreign.range, foreign.range.size(), foreign.description))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
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

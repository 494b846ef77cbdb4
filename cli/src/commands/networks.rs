use colored::*;
use netmgmt_common::network::definition::Network;
use netmgmt_core::inventory::Inventory;
use netmgmt_core::scanner::ScanScope;
use tracing::{Instrument, warn};

use crate::terminal::{colors, format, print, spinner};

pub async fn networks(inventory: &Inventory, scan: bool) -> anyhow::Result<()> {
    if scan {
        for network in inventory.networks().await {
            let span = spinner::spinner_span(format!("Scanning {}", network.name));
            if let Err(e) = inventory
                .scan_network(&network.name, ScanScope::Detailed)
                .instrument(span)
                .await
            {
                warn!("Could not scan {}: {e:#}", network.name);
            }
        }
    }

    let networks: Vec<Network> = inventory.networks().await;
    print::header("networks");
    if networks.is_empty() {
        print::no_results();
        return Ok(());
    }

    for (idx, network) in networks.iter().enumerate() {
        print::tree_head(idx, &network.name);
        print::as_tree_one_level(summary(network));
    }
    print::end_of_program();
    Ok(())
}

fn summary(network: &Network) -> Vec<(String, ColoredString)> {
    let usage: ColoredString = if network.utilization.total == 0 {
        "not scanned".color(colors::SEPARATOR)
    } else {
        format::utilization_bar(&network.utilization).normal()
    };

    let mut rows: Vec<(String, ColoredString)> = vec![
        ("CIDR".to_string(), format::cidr(&network.cidr).normal()),
        ("VLAN".to_string(), format::vlan(&network.vlan).normal()),
    ];
    if !network.dc.is_empty() {
        rows.push(("DC".to_string(), network.dc.normal()));
    }
    if !network.managed {
        rows.push(("Managed".to_string(), "no".color(colors::UNMANAGED)));
    }
    rows.push(("Usage".to_string(), usage));
    rows
}

use colored::*;
use netmgmt_core::inventory::Inventory;

use crate::terminal::{colors, format, print};

pub async fn node(inventory: &Inventory, node: &str) -> anyhow::Result<()> {
    print::header(&format!("node {node}"));

    let Some((addr, network)) = inventory.locate_node(node).await? else {
        print::no_results();
        return Ok(());
    };

    print::set_key_width(["Address", "Network", "CIDR", "VLAN"]);
    print::aligned_line("Address", addr.to_string().color(colors::IPV4_ADDR));
    print::aligned_line("Network", network.name.color(colors::PRIMARY));
    print::aligned_line("CIDR", format::cidr(&network.cidr).normal());
    print::aligned_line("VLAN", format::vlan(&network.vlan));
    print::end_of_program();
    Ok(())
}

use colored::*;
use netmgmt_common::network::definition::Network;
use netmgmt_core::inventory::Inventory;

use crate::terminal::{colors, format, print};

const KEYS: &[&str] = &[
    "Name",
    "Description",
    "CIDR",
    "Datacenter",
    "Gateway",
    "DNS",
    "VLAN",
    "DHCP",
    "Foreign",
    "Managed",
    "Usable",
    "Assignable",
];

pub async fn show(inventory: &Inventory, name: &str) -> anyhow::Result<()> {
    let network: Network = inventory.network(name).await?;
    let usable: usize = network.expand_detailed()?.len();
    let assignable: usize = network.expand_managed()?.len();

    print::header(&format!("network {name}"));
    print::set_key_width(KEYS.iter().copied());

    print::aligned_line("Name", network.name.color(colors::PRIMARY));
    print::aligned_line("Description", format::or_dash(&network.description));
    print::aligned_line("CIDR", format::cidr(&network.cidr).normal());
    print::aligned_line("Datacenter", format::or_dash(&network.dc));
    print::aligned_line(
        "Gateway",
        network
            .gateway
            .map_or_else(|| "-".to_string(), |gw| gw.to_string()),
    );
    print::aligned_line(
        "DNS",
        format::or_dash(
            &network
                .dns
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
    );
    print::aligned_line("VLAN", format::vlan(&network.vlan));
    print::aligned_line("DHCP", format::ranges(&network.dhcp));
    print::aligned_line("Foreign", format::foreign_ranges(&network.foreign_ranges));
    print::aligned_line("Managed", if network.managed { "yes" } else { "no" });
    print::aligned_line("Usable", usable.to_string());
    print::aligned_line("Assignable", assignable.to_string().color(colors::FREE));
    print::end_of_program();
    Ok(())
}

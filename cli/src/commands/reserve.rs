use std::net::Ipv4Addr;

use colored::*;
use netmgmt_common::network::lease::Lease;
use netmgmt_core::inventory::Inventory;
use serde_json::json;
use tracing::{Instrument, warn};

use crate::terminal::{colors, format, print, spinner};

pub struct Request<'a> {
    pub network: &'a str,
    pub comment: &'a str,
    pub owner: &'a str,
    pub count: u32,
    pub retries: u32,
}

pub async fn reserve(inventory: &Inventory, request: &Request<'_>, json: bool) -> anyhow::Result<()> {
    let mut reserved: Vec<(Ipv4Addr, Lease)> = Vec::new();
    for _ in 0..request.count {
        let addr: Ipv4Addr = reserve_one(inventory, request).await?;
        reserved.push((addr, inventory.leases().get(addr)));
    }

    if json {
        let body: Vec<serde_json::Value> = reserved
            .iter()
            .map(|(addr, lease)| json!({ "ip": addr, "network": request.network, "lock": lease }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    print::header("reservation");
    for (idx, (addr, lease)) in inventory.leases().snapshot().iter().enumerate() {
        print::tree_head(idx, &addr.to_string());
        print::as_tree_one_level(vec![
            ("Comment".to_string(), lease.comment.color(colors::PRIMARY)),
            ("Owner".to_string(), format::or_dash(&lease.owner).normal()),
            ("Until".to_string(), lease.locked_until.to_rfc3339().normal()),
        ]);
    }
    print::aligned_line(
        "Held for",
        format!("{} min", inventory.leases().duration().num_minutes()),
    );
    print::end_of_program();
    Ok(())
}

/// One reservation, with a fresh scan for every retry.
async fn reserve_one(inventory: &Inventory, request: &Request<'_>) -> anyhow::Result<Ipv4Addr> {
    let mut attempt: u32 = 0;
    loop {
        let span = spinner::spinner_span(format!("Looking for a free address in {}", request.network));
        match inventory
            .reserve(request.network, request.comment, request.owner)
            .instrument(span)
            .await
        {
            Ok(addr) => return Ok(addr),
            Err(e) if e.is_retryable() && attempt < request.retries => {
                attempt += 1;
                warn!("{e}, retrying ({attempt}/{})", request.retries);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

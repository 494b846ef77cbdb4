use colored::*;
use console::{Alignment, pad_str};
use netmgmt_core::inventory::Inventory;
use netmgmt_core::scanner::{ScanReport, ScanScope};
use tracing::Instrument;

use crate::terminal::{colors, format, print, spinner};

const IP_WIDTH: usize = 15;
const STATUS_WIDTH: usize = 24;
const NAME_WIDTH: usize = 28;

pub async fn scan(inventory: &Inventory, name: &str, managed: bool, json: bool) -> anyhow::Result<()> {
    let scope: ScanScope = if managed {
        ScanScope::Managed
    } else {
        ScanScope::Detailed
    };

    let span = spinner::spinner_span(format!("Scanning {name}"));
    let report: ScanReport = inventory.scan_network(name, scope).instrument(span).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print::header(&format!("inventory of {name}"));
    if report.records.is_empty() {
        print::no_results();
        return Ok(());
    }

    for record in &report.records {
        let detail: String = if record.lock.is_locked() {
            format!("{} ({})", record.lock.comment, format::or_dash(&record.lock.owner))
        } else {
            record.desc.clone()
        };
        print::print(&format!(
            "{} {} {} {}",
            pad_str(&record.ip.to_string(), IP_WIDTH, Alignment::Left, None).color(colors::IPV4_ADDR),
            pad_str(&format::record_status(record).to_string(), STATUS_WIDTH, Alignment::Left, None),
            pad_str(&record.name, NAME_WIDTH, Alignment::Left, Some("…")).color(colors::PRIMARY),
            detail.color(colors::TEXT_DEFAULT)
        ));
    }

    print::centerln(&format::utilization_bar(&report.utilization));
    print::end_of_program();
    Ok(())
}

use netmgmt_common::config::Config;

use crate::terminal::{format, print};

pub fn config(cfg: &Config) -> anyhow::Result<()> {
    let resolvers: String = cfg
        .resolvers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    print::header("configuration");
    print::set_key_width(["Handshake port"]);
    print::aligned_line("File", cfg.file.display().to_string());
    print::aligned_line("Lock duration", format!("{} min", cfg.lease_duration));
    print::aligned_line("Concurrency", cfg.concurrency.to_string());
    print::aligned_line("Timeout", format!("{} ms", cfg.probe_timeout.as_millis()));
    print::aligned_line("Resolvers", format::or_dash(&resolvers));
    print::aligned_line("Handshake port", cfg.handshake_port.to_string());
    print::aligned_line("Reverse DNS", if cfg.no_dns { "off" } else { "on" });
    print::aligned_line("Liveness", if cfg.no_ping { "off" } else { "on" });
    print::end_of_program();
    Ok(())
}

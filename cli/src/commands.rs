pub mod config;
pub mod networks;
pub mod node;
pub mod reserve;
pub mod scan;
pub mod show;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use netmgmt_common::config::Config;

const DNS_PORT: u16 = 53;

#[derive(Parser)]
#[command(name = "netmgmt", version)]
#[command(about = "Inventory and reservation of IPv4 address pools.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub options: Options,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every network with its cached utilization
    #[command(alias = "n")]
    Networks {
        /// Run a detailed scan of every network first
        #[arg(long)]
        scan: bool,
    },
    /// Show the definition of one network
    Show { network: String },
    /// Scan a network and print its address inventory
    #[command(alias = "s")]
    Scan {
        network: String,
        /// Only the addresses this system hands out
        #[arg(long)]
        managed: bool,
        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Reserve free addresses of a network
    ///
    /// Leases live only as long as this invocation: they keep addresses apart
    /// within one `--count` run and are gone once the command exits.
    #[command(alias = "r")]
    Reserve {
        network: String,
        /// What the address is for
        #[arg(short, long)]
        comment: String,
        /// Who asked for it
        #[arg(short, long, default_value = "")]
        owner: String,
        /// Addresses to reserve
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        /// Fresh attempts after a lost race or a full network
        #[arg(long, default_value_t = 3)]
        retries: u32,
        /// Print the reservations as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Find the network a host name or address belongs to
    Node { node: String },
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug)]
pub struct Options {
    /// Network definition file (.yaml, .yml or .json)
    #[arg(short, long, global = true, env = "NETMGMT_FILE", default_value = "data/netdef.yaml")]
    pub file: PathBuf,

    /// Minutes a reservation holds its address
    #[arg(
        long = "lock-duration",
        global = true,
        env = "NETMGMT_LOCK_DURATION",
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub lock_duration: u32,

    /// Probe tasks in flight per scan phase
    #[arg(
        long,
        global = true,
        env = "NETMGMT_CONCURRENCY",
        default_value_t = 256,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub concurrency: usize,

    /// Milliseconds a single probe waits for its reply
    #[arg(
        long,
        global = true,
        env = "NETMGMT_TIMEOUT",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// DNS server for reverse lookups, repeatable (default: system resolvers)
    #[arg(
        long = "resolver",
        global = true,
        env = "NETMGMT_RESOLVERS",
        value_delimiter = ',',
        value_parser = parse_resolver
    )]
    pub resolvers: Vec<SocketAddr>,

    /// TCP port probed when raw ICMP is unavailable
    #[arg(long, global = true, env = "NETMGMT_HANDSHAKE_PORT", default_value_t = 443)]
    pub handshake_port: u16,

    /// Skip reverse DNS lookups
    #[arg(long, global = true, env = "NETMGMT_NO_DNS")]
    pub no_dns: bool,

    /// Skip liveness probes
    #[arg(long, global = true, env = "NETMGMT_NO_PING")]
    pub no_ping: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Options {
    pub fn config(&self) -> Config {
        Config {
            file: self.file.clone(),
            lease_duration: self.lock_duration,
            concurrency: self.concurrency,
            probe_timeout: Duration::from_millis(self.timeout),
            resolvers: self.resolvers.clone(),
            handshake_port: self.handshake_port,
            no_dns: self.no_dns,
            no_ping: self.no_ping,
        }
    }
}

/// Accepts `addr:port` or a bare address on port 53.
fn parse_resolver(value: &str) -> Result<SocketAddr, String> {
    if let Ok(socket_addr) = value.parse::<SocketAddr>() {
        return Ok(socket_addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| format!("{value:?} is neither an address nor address:port"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

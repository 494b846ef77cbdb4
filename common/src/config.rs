use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path of the network definition file (`.yaml`, `.yml` or `.json`).
    pub file: PathBuf,

    /// How long a reservation holds its address, in minutes.
    pub lease_duration: u32,

    /// Upper bound of probe tasks in flight during one scan phase.
    pub concurrency: usize,

    /// Time a single echo or DNS probe may wait for its reply.
    pub probe_timeout: Duration,

    /// DNS servers used for reverse lookups. Empty means the system resolvers.
    pub resolvers: Vec<SocketAddr>,

    /// TCP port knocked on when echo probes cannot be sent.
    pub handshake_port: u16,

    /// Skips the reverse DNS phase of every scan.
    pub no_dns: bool,

    /// Skips the liveness phase of every scan.
    pub no_ping: bool,
}

impl Config {
    pub fn lease_duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.lease_duration))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("data/netdef.yaml"),
            lease_duration: 30,
            concurrency: 256,
            probe_timeout: Duration::from_millis(1_000),
            resolvers: Vec::new(),
            handshake_port: 443,
            no_dns: false,
            no_ping: false,
        }
    }
}

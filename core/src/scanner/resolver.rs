use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use netmgmt_common::config::Config;
use netmgmt_protocols::dns::{self, DnsAnswer};

use super::{Identity, Resolver};

const DNS_PORT: u16 = 53;
const RESOLV_CONF: &str = "/etc/resolv.conf";
const FALLBACK_SERVER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), DNS_PORT);
const MAX_DNS_PAYLOAD: usize = 4096;

type ReplyParser = fn(&[u8]) -> anyhow::Result<DnsAnswer>;

/// Reverse lookups over plain UDP.
///
/// Servers are tried in order, each with the full probe timeout. The first
/// server that answers decides the result, including a name error.
pub struct DnsResolver {
    servers: Vec<SocketAddr>,
    timeout: Duration,
    id_counter: AtomicU16,
}

impl DnsResolver {
    pub fn new(servers: Vec<SocketAddr>, probe_timeout: Duration) -> Self {
        Self {
            servers,
            timeout: probe_timeout,
            id_counter: AtomicU16::new(rand::random()),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let servers: Vec<SocketAddr> = if cfg.resolvers.is_empty() {
            system_nameservers()
        } else {
            cfg.resolvers.clone()
        };
        debug!("Using DNS server(s) {servers:?}");
        Self::new(servers, cfg.probe_timeout)
    }

    async fn query<B>(&self, build: B, parse: ReplyParser) -> anyhow::Result<Vec<String>>
    where
        B: Fn(u16) -> anyhow::Result<Vec<u8>> + Send + Sync,
    {
        let mut last_error: Option<anyhow::Error> = None;

        for server in &self.servers {
            let id: u16 = self.next_id();
            let packet: Vec<u8> = build(id)?;
            match timeout(self.timeout, exchange(*server, &packet, id, parse)).await {
                Ok(Ok(records)) => return Ok(records),
                Ok(Err(e)) => {
                    debug!("DNS server {server} failed: {e:#}");
                    last_error = Some(e);
                }
                Err(_elapsed) => {
                    debug!("DNS server {server} did not answer in time");
                    last_error = Some(anyhow!("no answer from {server}"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("no DNS servers configured")))
    }

    fn next_id(&self) -> u16 {
        self.id_counter.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl Resolver for DnsResolver {
    async fn resolve(&self, addr: Ipv4Addr) -> anyhow::Result<Option<Identity>> {
        let names: Vec<String> = self
            .query(|id| dns::create_ptr_packet(&addr, id), dns::get_hostnames)
            .await?;
        let Some(hostname) = names.into_iter().next() else {
            return Ok(None);
        };

        let description: String = match self
            .query(|id| dns::create_txt_packet(&hostname, id), dns::get_txt)
            .await
        {
            Ok(strings) => strings.join(", "),
            Err(e) => {
                debug!("TXT lookup of {hostname} failed: {e:#}");
                String::new()
            }
        };

        Ok(Some(Identity {
            hostname,
            description,
        }))
    }
}

/// Sends one query and waits for the reply with the matching id.
async fn exchange(
    server: SocketAddr,
    packet: &[u8],
    id: u16,
    parse: ReplyParser,
) -> anyhow::Result<Vec<String>> {
    let local: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).await.context("binding DNS socket")?;
    socket
        .connect(server)
        .await
        .with_context(|| format!("connecting to {server}"))?;
    socket.send(packet).await.context("sending DNS query")?;

    let mut buffer = [0u8; MAX_DNS_PAYLOAD];
    loop {
        let len: usize = socket.recv(&mut buffer).await.context("receiving DNS reply")?;
        let answer: DnsAnswer = parse(&buffer[..len])?;
        if answer.id == id {
            return Ok(answer.records);
        }
        debug!("Dropping DNS reply with stale id {}", answer.id);
    }
}

/// The `nameserver` entries of the system resolver configuration.
pub fn system_nameservers() -> Vec<SocketAddr> {
    let servers: Vec<SocketAddr> = std::fs::read_to_string(RESOLV_CONF)
        .map(|contents| parse_resolv_conf(&contents))
        .unwrap_or_default();

    if servers.is_empty() {
        debug!("No usable nameserver in {RESOLV_CONF}, falling back to {FALLBACK_SERVER}");
        return vec![FALLBACK_SERVER];
    }
    servers
}

fn parse_resolv_conf(contents: &str) -> Vec<SocketAddr> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => addr.parse::<IpAddr>().ok(),
                _ => None,
            }
        })
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .collect()
}

/// Forward resolution of a node. An IPv4 literal is taken as is.
pub async fn lookup_node(node: &str) -> anyhow::Result<Vec<Ipv4Addr>> {
    if let Ok(addr) = node.parse::<Ipv4Addr>() {
        return Ok(vec![addr]);
    }

    let resolved = tokio::net::lookup_host((node, 0))
        .await
        .with_context(|| format!("resolving {node}"))?;

    let mut addrs: Vec<Ipv4Addr> = Vec::new();
    for socket_addr in resolved {
        if let IpAddr::V4(addr) = socket_addr.ip()
            && !addrs.contains(&addr)
        {
            addrs.push(addr);
        }
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

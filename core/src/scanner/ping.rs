use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pnet::packet::icmp::IcmpPacket;
use pnet::transport::TransportSender;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use netmgmt_common::config::Config;
use netmgmt_protocols::icmp;

use super::Pinger;
use crate::network::tcp::handshake_probe;
use crate::network::transport::{self, TransportHandle};

type Waiters = Arc<Mutex<HashMap<(Ipv4Addr, u16), oneshot::Sender<()>>>>;

/// Picks the liveness strategy the current process can use.
///
/// Raw ICMP needs privileges. Without them every probe becomes a TCP handshake
/// on the configured port, which misses hosts that drop that port silently.
pub fn default_pinger(cfg: &Config) -> Arc<dyn Pinger> {
    if is_root::is_root() {
        match IcmpPinger::new(cfg.probe_timeout) {
            Ok(pinger) => return Arc::new(pinger),
            Err(e) => warn!("Could not open raw ICMP socket ({e:#}), falling back to TCP handshakes"),
        }
    } else {
        warn!(
            "Not running as root, probing liveness with TCP handshakes on port {}",
            cfg.handshake_port
        );
    }
    Arc::new(HandshakePinger::new(cfg.handshake_port, cfg.probe_timeout))
}

/// Echo probes over one shared raw socket.
///
/// A router task reads every incoming ICMP message and wakes the probe waiting
/// for that `(source, sequence)` pair. Replies carrying another identifier belong
/// to some other process and are ignored.
pub struct IcmpPinger {
    sender: Arc<Mutex<TransportSender>>,
    waiters: Waiters,
    identifier: u16,
    sequence: AtomicU16,
    timeout: Duration,
}

impl IcmpPinger {
    /// Must be called from within a tokio runtime.
    pub fn new(probe_timeout: Duration) -> anyhow::Result<Self> {
        let TransportHandle { tx, rx } = transport::start_icmp_capture()?;
        let identifier: u16 = rand::random();
        let waiters: Waiters = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(route_replies(rx, Arc::clone(&waiters), identifier));

        Ok(Self {
            sender: tx,
            waiters,
            identifier,
            sequence: AtomicU16::new(0),
            timeout: probe_timeout,
        })
    }

    async fn send_request(&self, addr: Ipv4Addr, sequence: u16) -> anyhow::Result<()> {
        let packet: Vec<u8> = icmp::create_echo_request(self.identifier, sequence)?;
        let sender = Arc::clone(&self.sender);

        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let echo = IcmpPacket::new(&packet).context("wrapping echo request")?;
            let mut sender = sender.lock().unwrap_or_else(PoisonError::into_inner);
            sender
                .send_to(echo, IpAddr::V4(addr))
                .with_context(|| format!("sending echo request to {addr}"))?;
            Ok(())
        })
        .await
        .context("echo sender task")?
    }
}

#[async_trait]
impl Pinger for IcmpPinger {
    async fn ping(&self, addr: Ipv4Addr) -> anyhow::Result<bool> {
        let sequence: u16 = self.sequence.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.waiters).insert((addr, sequence), tx);

        if let Err(e) = self.send_request(addr, sequence).await {
            lock(&self.waiters).remove(&(addr, sequence));
            return Err(e);
        }

        let answered: bool = matches!(timeout(self.timeout, rx).await, Ok(Ok(())));
        if !answered {
            lock(&self.waiters).remove(&(addr, sequence));
        }
        Ok(answered)
    }
}

/// Wakes the probe waiting on each echo reply until `rx` closes.
async fn route_replies(
    mut rx: mpsc::UnboundedReceiver<(Vec<u8>, IpAddr)>,
    waiters: Waiters,
    identifier: u16,
) {
    while let Some((bytes, source)) = rx.recv().await {
        let IpAddr::V4(source) = source else {
            continue;
        };
        let Some(reply) = icmp::get_echo_reply(&bytes) else {
            continue;
        };
        if reply.identifier != identifier {
            continue;
        }
        if let Some(waiter) = lock(&waiters).remove(&(source, reply.sequence)) {
            let _ = waiter.send(());
        }
    }
    debug!("ICMP reply router stopped");
}

/// Liveness by TCP connect. A refused connection also counts as alive.
#[derive(Debug, Clone, Copy)]
pub struct HandshakePinger {
    port: u16,
    timeout: Duration,
}

impl HandshakePinger {
    pub fn new(port: u16, probe_timeout: Duration) -> Self {
        Self {
            port,
            timeout: probe_timeout,
        }
    }
}

#[async_trait]
impl Pinger for HandshakePinger {
    async fn ping(&self, addr: Ipv4Addr) -> anyhow::Result<bool> {
        Ok(handshake_probe(IpAddr::V4(addr), self.port, self.timeout).await)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pnet::{
    packet::{Packet, ip::IpNextHeaderProtocols},
    transport::{self, TransportChannelType, TransportProtocol, TransportReceiver, TransportSender},
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));

pub struct TransportHandle {
    pub tx: Arc<Mutex<TransportSender>>,
    pub rx: mpsc::UnboundedReceiver<Captured>,
}

/// Opens a raw ICMP channel and forwards every received message to `rx`.
///
/// The listener runs on its own thread. It stops on the first receive error, or
/// within one poll interval of the receiving side being dropped. Opening the
/// channel requires privileges.
pub fn start_icmp_capture() -> anyhow::Result<TransportHandle> {
    let (tx, mut rx_socket) = open_channel(CHANNEL_TYPE_ICMP)?;
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let mut iterator = transport::icmp_packet_iter(&mut rx_socket);
        forward_packets(
            || {
                iterator
                    .next_with_timeout(POLL_INTERVAL)
                    .map(|received| received.map(|(packet, source)| (packet.packet().to_vec(), source)))
            },
            &queue_tx,
        );
        debug!("ICMP capture thread exiting");
    });

    Ok(TransportHandle {
        tx: Arc::new(Mutex::new(tx)),
        rx: queue_rx,
    })
}

pub type Captured = (Vec<u8>, IpAddr);

/// Pumps `next` into `queue_tx`. `next` returning `Ok(None)` means the poll
/// interval passed without a packet.
fn forward_packets<F>(mut next: F, queue_tx: &mpsc::UnboundedSender<Captured>)
where
    F: FnMut() -> io::Result<Option<Captured>>,
{
    while !queue_tx.is_closed() {
        match next() {
            Ok(Some(captured)) => {
                if queue_tx.send(captured).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("ICMP capture stopped: {e}");
                break;
            }
        }
    }
}

fn open_channel(
    channel_type: TransportChannelType,
) -> anyhow::Result<(TransportSender, TransportReceiver)> {
    let (tx, rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, channel_type)?;
    Ok((tx, rx))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

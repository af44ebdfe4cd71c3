//! ## Handles UDP logic for the order protocol
//!
//! Two sockets per node:
//! - the *local* socket, bound to this machine's address on [config::LOCAL_PORT]. Every frame is
//!   sent from it, and peers may answer it directly.
//! - the *broadcast* socket, bound to `0.0.0.0:`[config::BROADCAST_PORT]. Every node hears every
//!   broadcast frame here, its own included.
//!
//! Both sockets feed one listener channel. Frames with the wrong length are dropped without a
//! look, corrupt frames are logged and dropped; only valid [OrderMessage]s reach the control loop.

use crate::config;
use crate::print;
use super::frame::{self, FRAME_LEN};
use super::OrderMessage;

use anyhow::Context;
use local_ip_address::local_ip;
use socket2::{Domain, Socket, Type};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// The two bound sockets of a node, plus where broadcasts go
pub struct Sockets {
    /// Unicast socket every frame is sent from
    pub local: Arc<UdpSocket>,
    /// Socket receiving broadcast frames
    pub broadcast: Arc<UdpSocket>,
    /// `255.255.255.255:BROADCAST_PORT`
    pub broadcast_addr: SocketAddr,
}

/// Builds a reusable, broadcast-enabled, non-blocking UDP socket bound to `addr`
fn reusable_udp_socket(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    socket.set_nonblocking(true)?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

/// Resolves addresses and binds both sockets.
///
/// Any failure here is a transport setup failure, and the caller is expected to exit.
/// Must be called from within a tokio runtime.
pub fn bind_sockets() -> anyhow::Result<Sockets> {
    let ip = local_ip().context("Could not resolve the local IP address")?;
    let ip = match ip {
        IpAddr::V4(v4) => IpAddr::V4(v4),
        IpAddr::V6(v6) => anyhow::bail!("Local address {} is not IPv4", v6),
    };

    let local_addr = SocketAddr::new(ip, config::LOCAL_PORT);
    let broadcast_listen_addr: SocketAddr = format!("{}:{}", config::BC_LISTEN_ADDR, config::BROADCAST_PORT)
        .parse()
        .context("Invalid broadcast listen address")?;
    let broadcast_addr: SocketAddr = format!("{}:{}", config::BC_ADDR, config::BROADCAST_PORT)
        .parse()
        .context("Invalid broadcast address")?;

    let local = reusable_udp_socket(local_addr)
        .with_context(|| format!("Could not bind local socket on {}", local_addr))?;
    let broadcast = reusable_udp_socket(broadcast_listen_addr)
        .with_context(|| format!("Could not bind broadcast socket on {}", broadcast_listen_addr))?;

    print::ok(format!("UDP sockets bound: local {}, broadcast {}", local_addr, broadcast_listen_addr));
    Ok(Sockets {
        local: Arc::new(local),
        broadcast: Arc::new(broadcast),
        broadcast_addr,
    })
}

/// Starts and runs the UDP sender
///
/// ## Parameters
/// `socket`: the local socket
/// `broadcast_addr`: where frames go
/// `outbound_rx`: messages from the control loop
///
/// ## Behavior
/// Encodes every message and broadcasts it once. A failed send is logged and dropped:
/// the protocol tolerates lost frames.
///
/// ## Note
/// Returns when every sender of `outbound_rx` is gone, and should otherwise be spawned as a task
pub async fn start_udp_sender(
    socket: Arc<UdpSocket>,
    broadcast_addr: SocketAddr,
    mut outbound_rx: mpsc::Receiver<OrderMessage>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        let bytes = frame::encode(&msg);
        match socket.send_to(&bytes, broadcast_addr).await {
            Ok(_) => print::net(format!("Sent {}", msg)),
            Err(e) => print::err(format!("Failed to send {}: {}", msg, e)),
        }
    }
}

/// Starts and runs a UDP listener on one socket
///
/// ## Parameters
/// `socket`: the local or the broadcast socket
/// `inbound_tx`: where decoded messages go
///
/// ## Behavior
/// - Frames that are not exactly [FRAME_LEN] bytes are dropped without inspection
/// - Frames failing [frame::decode] are logged as warnings and dropped
/// - Valid messages are forwarded, including this node's own. The control loop filters those.
///
/// ## Note
/// Returns an error only if the socket itself fails, or `Ok` when the receiver is gone.
pub async fn start_udp_listener(
    socket: Arc<UdpSocket>,
    inbound_tx: mpsc::Sender<OrderMessage>,
) -> tokio::io::Result<()> {
    let mut buf = [0u8; config::UDP_BUFFER];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        if len != FRAME_LEN {
            continue;
        }
        match frame::decode(&buf[..len]) {
            Ok(msg) => {
                if inbound_tx.send(msg).await.is_err() {
                    return Ok(());
                }
            }
            Err(e) => print::warn(format!("Dropped frame from {}: {}", from, e)),
        }
    }
}

/// Spawns the sender and both listeners.
///
/// Returns the channel the control loop sends on, and the one it receives valid messages from.
pub fn start_transport(sockets: Sockets) -> (mpsc::Sender<OrderMessage>, mpsc::Receiver<OrderMessage>) {
    let (outbound_tx, outbound_rx) = mpsc::channel::<OrderMessage>(config::CHANNEL_CAPACITY);
    let (inbound_tx, inbound_rx) = mpsc::channel::<OrderMessage>(config::CHANNEL_CAPACITY);

    {
        let socket = sockets.local.clone();
        let broadcast_addr = sockets.broadcast_addr;
        tokio::spawn(async move {
            start_udp_sender(socket, broadcast_addr, outbound_rx).await;
        });
    }

    for (name, socket) in [("local", sockets.local), ("broadcast", sockets.broadcast)] {
        let inbound_tx = inbound_tx.clone();
        tokio::spawn(async move {
            print::info(format!("Listening for frames on the {} socket", name));
            if let Err(e) = start_udp_listener(socket, inbound_tx).await {
                print::err(format!("UDP listener on the {} socket stopped: {}", name, e));
            }
        });
    }

    (outbound_tx, inbound_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevio::Direction;
    use crate::network::OrderType;
    use std::time::Duration;

    async fn loopback() -> (Arc<UdpSocket>, Arc<UdpSocket>) {
        let a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        (Arc::new(a), Arc::new(b))
    }

    #[tokio::test]
    async fn listener_forwards_valid_frames_only() {
        let (tx_sock, rx_sock) = loopback().await;
        let target = rx_sock.local_addr().unwrap();
        let (inbound_tx, mut inbound_rx) = mpsc::channel(8);
        tokio::spawn(start_udp_listener(rx_sock, inbound_tx));

        let good = OrderMessage::new(OrderType::NewOrder, 2, 1, Direction::Up);
        let mut corrupt = frame::encode(&good);
        corrupt[4] ^= 0x01;

        tx_sock.send_to(b"NW0210", target).await.unwrap();
        tx_sock.send_to(&corrupt, target).await.unwrap();
        tx_sock.send_to(&frame::encode(&good), target).await.unwrap();

        let got = tokio::time::timeout(Duration::from_secs(2), inbound_rx.recv())
            .await
            .unwrap();
        assert_eq!(got, Some(good));
        assert!(inbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn sender_encodes_every_message() {
        let (tx_sock, rx_sock) = loopback().await;
        let target = rx_sock.local_addr().unwrap();
        let (outbound_tx, outbound_rx) = mpsc::channel(8);
        tokio::spawn(start_udp_sender(tx_sock, target, outbound_rx));

        let msg = OrderMessage::new(OrderType::CompletedOrder, 5, 3, Direction::Down);
        outbound_tx.send(msg).await.unwrap();

        let mut buf = [0u8; 32];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), rx_sock.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(len, FRAME_LEN);
        assert_eq!(frame::decode(&buf[..len]), Ok(msg));
    }
}

//! Datagram transport used by the reflection checks.
//!
//! A check sends exactly one datagram and waits for at most one reply, so the
//! transport surface is a single request/response exchange. Tests swap in
//! scripted exchanges instead of real sockets.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Largest datagram a reply can carry.
const RECV_BUFFER_SIZE: usize = 65_535;

#[derive(Debug)]
pub enum Exchange {
    Reply(Vec<u8>),
    /// Nothing arrived before the deadline.
    Silence,
}

#[async_trait]
pub trait UdpExchange: Send + Sync {
    /// Sends `payload` to `target` and waits up to `wait` for the answer.
    ///
    /// ICMP port-unreachable surfaces as `ConnectionRefused`.
    async fn exchange(&self, target: SocketAddr, payload: &[u8], wait: Duration) -> io::Result<Exchange>;
}

/// Real sockets: one ephemeral, connected UDP socket per exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioUdp;

#[async_trait]
impl UdpExchange for TokioUdp {
    async fn exchange(&self, target: SocketAddr, payload: &[u8], wait: Duration) -> io::Result<Exchange> {
        let local: SocketAddr = match target.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local).await?;
        // Connected so that only the target's replies are delivered.
        socket.connect(target).await?;
        socket.send(payload).await?;

        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        match tokio::time::timeout(wait, socket.recv(&mut buffer)).await {
            Ok(Ok(len)) => {
                buffer.truncate(len);
                Ok(Exchange::Reply(buffer))
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(Exchange::Silence),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

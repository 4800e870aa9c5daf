use std::net::SocketAddr;
use std::time::Duration;

use lift_common::error::ProbeError;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Opens a TCP connection, giving up after `limit`.
pub async fn connect(addr: SocketAddr, limit: Duration) -> Result<TcpStream, ProbeError> {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(ProbeError::ConnectFailure { addr, source }),
        Err(_elapsed) => Err(ProbeError::Timeout {
            addr,
            operation: "connect",
        }),
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

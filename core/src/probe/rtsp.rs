use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use lift_common::error::ProbeError;
use lift_protocols::rtsp;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use crate::network::tcp;

/// `Server` header tokens and the device they reveal, checked in order.
pub const RTSP_VENDORS: &[(&str, &str)] = &[
    ("Dahua", "Dahua RTSP Server"),
    ("Hikvision", "Hikvision RTSP Server"),
    ("H264DVR", "XiongMai H264DVR RTSP Server"),
    ("Boa", "Boa RTSP Server"),
];

const REPLY_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspBanner {
    pub server: Option<String>,
    pub device: Option<String>,
}

pub fn vendor_for(server: &str) -> Option<&'static str> {
    RTSP_VENDORS
        .iter()
        .find(|(token, _)| server.contains(token))
        .map(|(_, label)| *label)
}

/// Sends `OPTIONS` and reads the reply's `Server` header. The whole exchange
/// is bounded by `limit`.
pub async fn probe(ip: IpAddr, port: u16, limit: Duration) -> Result<RtspBanner, ProbeError> {
    let addr = SocketAddr::new(ip, port);

    let exchange = async {
        let mut stream = tcp::connect(addr, limit).await?;
        stream
            .write_all(&rtsp::options_request(ip, port))
            .await
            .map_err(|source| ProbeError::ConnectFailure { addr, source })?;

        let mut buffer = vec![0u8; REPLY_BUFFER_SIZE];
        let len = stream
            .read(&mut buffer)
            .await
            .map_err(|source| ProbeError::ConnectFailure { addr, source })?;
        Ok::<_, ProbeError>(String::from_utf8_lossy(&buffer[..len]).into_owned())
    };

    let reply = timeout(limit, exchange).await.map_err(|_| ProbeError::Timeout {
        addr,
        operation: "RTSP OPTIONS",
    })??;

    if !rtsp::is_rtsp_reply(&reply) {
        return Err(ProbeError::protocol("RTSP", "reply is not RTSP"));
    }

    let server = rtsp::server_header(&reply);
    let device = server.as_deref().and_then(vendor_for).map(str::to_string);
    Ok(RtspBanner { server, device })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

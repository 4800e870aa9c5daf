//! # RTSP
//!
//! `OPTIONS` needs no credentials and most cameras answer it with a `Server`
//! header naming the streaming stack.

use std::net::IpAddr;

pub fn options_request(addr: IpAddr, port: u16) -> Vec<u8> {
    let host = match addr {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    };
    format!("OPTIONS rtsp://{host}:{port} RTSP/1.0\r\nCSeq: 1\r\nUser-Agent: lift\r\n\r\n").into_bytes()
}

/// Whether the reply starts like an RTSP response.
pub fn is_rtsp_reply(response: &str) -> bool {
    response.trim_start().starts_with("RTSP/")
}

/// Value of the first `Server` header in the reply.
pub fn server_header(response: &str) -> Option<String> {
    response
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("server"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn options_request_names_the_target() {
        let v4 = options_request(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 554);
        assert!(v4.starts_with(b"OPTIONS rtsp://192.0.2.1:554 RTSP/1.0\r\nCSeq: 1\r\n"));

        let v6 = options_request(IpAddr::V6(Ipv6Addr::LOCALHOST), 8554);
        assert!(v6.starts_with(b"OPTIONS rtsp://[::1]:8554 RTSP/1.0"));
    }

    #[test]
    fn extracts_server_header() {
        let reply = "RTSP/1.0 200 OK\r\nCSeq: 1\r\nServer: Rtsp Server/2.0 (Dahua)\r\nPublic: OPTIONS, DESCRIBE\r\n\r\n";
        assert!(is_rtsp_reply(reply));
        assert_eq!(server_header(reply).as_deref(), Some("Rtsp Server/2.0 (Dahua)"));
    }

    #[test]
    fn missing_server_header_is_none() {
        let reply = "RTSP/1.0 401 Unauthorized\r\nCSeq: 1\r\n\r\n";
        assert_eq!(server_header(reply), None);
        assert!(!is_rtsp_reply("HTTP/1.1 400 Bad Request\r\n"));
    }
}

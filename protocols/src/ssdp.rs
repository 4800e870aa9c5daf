//! # SSDP
//!
//! Unicast `M-SEARCH` request and the header block of the answer.

use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::{Context, bail};

/// Search request aimed at a single host instead of the multicast group.
pub fn msearch_request(target: SocketAddr) -> Vec<u8> {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {target}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 1\r\n\
         ST: ssdp:all\r\n\r\n"
    )
    .into_bytes()
}

#[derive(Debug, Clone, Default)]
pub struct SsdpReply {
    pub status_line: String,
    /// Header names are upper-cased.
    pub headers: HashMap<String, String>,
}

impl SsdpReply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn server(&self) -> Option<&str> {
        self.header("SERVER")
    }
}

pub fn parse_reply(payload: &[u8]) -> anyhow::Result<SsdpReply> {
    let text = std::str::from_utf8(payload).context("SSDP reply is not UTF-8")?;
    let mut lines = text.lines();

    let status_line = lines.next().map(str::trim).unwrap_or_default();
    if !status_line.starts_with("HTTP/") && !status_line.starts_with("NOTIFY") {
        bail!("unexpected SSDP status line: {status_line:?}");
    }

    let headers = lines
        .map(str::trim)
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim().to_string()))
        .collect();

    Ok(SsdpReply {
        status_line: status_line.to_string(),
        headers,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

//! # NTP mode 7 (`ntpdc`) monlist
//!
//! `MON_GETLIST_1` asks a server for the list of recent clients. Servers that
//! still answer it send back many packets for one small request, which is the
//! amplification this module helps detect.
//!
//! Private-mode header layout:
//!
//! ```text
//!  0: R | M | VN(3) | Mode(3)
//!  1: A | Sequence(7)
//!  2: Implementation
//!  3: Request code
//!  4: Err(4) | Number of items (high 4 bits)
//!  5: Number of items (low 8 bits)
//!  6: MBZ(4) | Item size (high 4 bits)
//!  7: Item size (low 8 bits)
//! ```

use anyhow::bail;

pub const MODE_PRIVATE: u8 = 7;
pub const IMPL_XNTPD: u8 = 3;
pub const REQ_MON_GETLIST_1: u8 = 42;

const HEADER_LEN: usize = 8;

/// Version 2, mode 7, implementation XNTPD, request `MON_GETLIST_1`.
pub const MONLIST_REQUEST: [u8; 8] = [0x17, 0x00, IMPL_XNTPD, REQ_MON_GETLIST_1, 0x00, 0x00, 0x00, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSevenReply {
    pub request_code: u8,
    pub error: u8,
    pub items: u16,
    pub item_size: u16,
    pub more: bool,
}

impl ModeSevenReply {
    /// The server handed out its client list.
    pub fn lists_clients(&self) -> bool {
        self.request_code == REQ_MON_GETLIST_1 && self.error == 0 && self.items > 0
    }
}

pub fn monlist_request() -> Vec<u8> {
    MONLIST_REQUEST.to_vec()
}

pub fn parse_reply(payload: &[u8]) -> anyhow::Result<ModeSevenReply> {
    if payload.len() < HEADER_LEN {
        bail!("NTP reply too short: {} bytes", payload.len());
    }

    let flags = payload[0];
    if flags & 0x80 == 0 {
        bail!("NTP packet is not a response");
    }
    let mode = flags & 0x07;
    if mode != MODE_PRIVATE {
        bail!("unexpected NTP mode {mode}");
    }

    Ok(ModeSevenReply {
        request_code: payload[3],
        error: payload[4] >> 4,
        items: (u16::from(payload[4] & 0x0f) << 8) | u16::from(payload[5]),
        item_size: (u16::from(payload[6] & 0x0f) << 8) | u16::from(payload[7]),
        more: flags & 0x40 != 0,
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

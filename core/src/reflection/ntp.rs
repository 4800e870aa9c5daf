use std::net::SocketAddr;

use lift_common::error::ProbeError;
use lift_common::models::Attack;
use lift_protocols::ntp;

use super::{Assessment, ReflectionProbe};

/// `monlist` check against the mode 7 control interface.
#[derive(Debug, Clone, Copy)]
pub struct NtpProbe {
    port: u16,
}

impl NtpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl ReflectionProbe for NtpProbe {
    fn attack(&self) -> Attack {
        Attack::NtpMonlist
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn request(&self, _target: SocketAddr) -> Result<Vec<u8>, ProbeError> {
        Ok(ntp::monlist_request())
    }

    fn assess(&self, _request: &[u8], reply: &[u8]) -> Result<Assessment, ProbeError> {
        let reply = ntp::parse_reply(reply).map_err(|e| ProbeError::protocol("NTP", e.to_string()))?;

        if reply.lists_clients() {
            Ok(Assessment::vulnerable(format!("{} monlist entries", reply.items)))
        } else if reply.request_code != ntp::REQ_MON_GETLIST_1 {
            Ok(Assessment::not_vulnerable(format!(
                "answered request code {}",
                reply.request_code
            )))
        } else {
            Ok(Assessment::not_vulnerable(format!("monlist error {}", reply.error)))
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

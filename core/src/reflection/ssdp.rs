use std::net::SocketAddr;

use lift_common::error::ProbeError;
use lift_common::models::Attack;
use lift_protocols::ssdp;

use super::{Assessment, ReflectionProbe};

/// Any answer to a unicast `M-SEARCH` makes the host a reflector.
#[derive(Debug, Clone, Copy)]
pub struct SsdpProbe {
    port: u16,
}

impl SsdpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl ReflectionProbe for SsdpProbe {
    fn attack(&self) -> Attack {
        Attack::SsdpReflection
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn request(&self, target: SocketAddr) -> Result<Vec<u8>, ProbeError> {
        Ok(ssdp::msearch_request(target))
    }

    fn assess(&self, _request: &[u8], reply: &[u8]) -> Result<Assessment, ProbeError> {
        if reply.is_empty() {
            return Err(ProbeError::protocol("SSDP", "empty datagram"));
        }

        let detail = match ssdp::parse_reply(reply) {
            Ok(parsed) => parsed
                .server()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} byte reply without SERVER header", reply.len())),
            Err(_) => format!("{} byte non-SSDP reply", reply.len()),
        };
        Ok(Assessment::vulnerable(detail))
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

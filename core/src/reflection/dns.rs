use std::net::SocketAddr;

use lift_common::error::ProbeError;
use lift_common::models::Attack;
use lift_protocols::dns::{self, PROBE_NAME, Rcode};

use super::{Assessment, ReflectionProbe};

/// Open resolver check: one recursive `A` query for a public name.
#[derive(Debug, Clone, Copy)]
pub struct DnsProbe {
    port: u16,
}

impl DnsProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl ReflectionProbe for DnsProbe {
    fn attack(&self) -> Attack {
        Attack::DnsAmplification
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn request(&self, _target: SocketAddr) -> Result<Vec<u8>, ProbeError> {
        dns::create_query_packet(PROBE_NAME, rand::random())
            .map_err(|e| ProbeError::protocol("DNS", e.to_string()))
    }

    fn assess(&self, request: &[u8], reply: &[u8]) -> Result<Assessment, ProbeError> {
        let id = match request {
            [high, low, ..] => u16::from_be_bytes([*high, *low]),
            _ => return Err(ProbeError::protocol("DNS", "request too short")),
        };

        let reply = dns::parse_reply(reply, id).map_err(|e| ProbeError::protocol("DNS", e.to_string()))?;

        if reply.resolved() {
            return Ok(Assessment::vulnerable(format!(
                "resolved {PROBE_NAME} with {} answers",
                reply.answers
            )));
        }

        let detail = match reply.rcode {
            Rcode::Refused => "REFUSED".to_string(),
            Rcode::ServerFailure => "SERVFAIL".to_string(),
            Rcode::NoError => "no answers".to_string(),
            Rcode::Other(code) => format!("rcode {code}"),
        };
        Ok(Assessment::not_vulnerable(detail))
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

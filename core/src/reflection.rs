//! # Reflection Checks
//!
//! Tests whether a UDP service answers small unauthenticated requests with
//! replies an attacker could bounce at a spoofed victim.
//!
//! Every check walks the same three states:
//!
//! ```text
//! Idle --send request--> Sent --reply / silence / error--> Vulnerable | NotVulnerable | Error
//! ```
//!
//! The protocol specifics live behind [`ReflectionProbe`] and the socket
//! behind [`UdpExchange`], so the state machine is written once. A check
//! never fails: whatever goes wrong becomes an `Error` outcome, which is
//! reported like `NotVulnerable`.
//!
//! Dropping a running check closes its socket, which is how interrupts
//! cancel it.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use lift_common::error::ProbeError;
use lift_common::models::{Attack, ReflectionOutcome, ReflectionVerdict};
use tracing::debug;

use crate::network::udp::{Exchange, UdpExchange};

pub mod dns;
pub mod ntp;
pub mod ssdp;

pub use dns::DnsProbe;
pub use ntp::NtpProbe;
pub use ssdp::SsdpProbe;

/// What a probe concluded from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub vulnerable: bool,
    pub detail: String,
}

impl Assessment {
    pub fn vulnerable(detail: impl Into<String>) -> Self {
        Self {
            vulnerable: true,
            detail: detail.into(),
        }
    }

    pub fn not_vulnerable(detail: impl Into<String>) -> Self {
        Self {
            vulnerable: false,
            detail: detail.into(),
        }
    }
}

/// Protocol half of a reflection check.
pub trait ReflectionProbe: Send + Sync {
    fn attack(&self) -> Attack;

    /// Destination port of the request.
    fn port(&self) -> u16;

    /// Builds the single request datagram.
    fn request(&self, target: SocketAddr) -> Result<Vec<u8>, ProbeError>;

    /// Judges the reply to `request`. Malformed replies are a `ProtocolError`.
    fn assess(&self, request: &[u8], reply: &[u8]) -> Result<Assessment, ProbeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckState {
    Idle,
    Sent,
    Done(ReflectionOutcome),
}

pub struct ReflectionCheck<'a> {
    probe: &'a dyn ReflectionProbe,
    transport: &'a dyn UdpExchange,
    target: SocketAddr,
    wait: Duration,
    state: CheckState,
}

impl<'a> ReflectionCheck<'a> {
    pub fn new(
        probe: &'a dyn ReflectionProbe,
        transport: &'a dyn UdpExchange,
        ip: IpAddr,
        wait: Duration,
    ) -> Self {
        Self {
            probe,
            transport,
            target: SocketAddr::new(ip, probe.port()),
            wait,
            state: CheckState::Idle,
        }
    }

    pub fn state(&self) -> &CheckState {
        &self.state
    }

    /// Drives the check to a terminal state. Exactly one request is sent.
    pub async fn run(mut self) -> ReflectionVerdict {
        let request = match self.probe.request(self.target) {
            Ok(request) => request,
            Err(e) => return self.finish(ReflectionOutcome::Error(e.to_string()), String::new()),
        };

        self.transition(CheckState::Sent);
        let reply = self.transport.exchange(self.target, &request, self.wait).await;

        match reply {
            Ok(Exchange::Reply(bytes)) => match self.probe.assess(&request, &bytes) {
                Ok(Assessment { vulnerable: true, detail }) => {
                    self.finish(ReflectionOutcome::Vulnerable, detail)
                }
                Ok(Assessment { vulnerable: false, detail }) => {
                    self.finish(ReflectionOutcome::NotVulnerable, detail)
                }
                Err(e) => self.finish(ReflectionOutcome::Error(e.to_string()), String::new()),
            },
            Ok(Exchange::Silence) => {
                let detail = format!("no reply within {:?}", self.wait);
                self.finish(ReflectionOutcome::NotVulnerable, detail)
            }
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                self.finish(ReflectionOutcome::NotVulnerable, "port unreachable".to_string())
            }
            Err(e) => self.finish(ReflectionOutcome::Error(e.to_string()), String::new()),
        }
    }

    fn transition(&mut self, next: CheckState) {
        debug!(
            "{} check on {}: {:?} -> {:?}",
            self.probe.attack().protocol(),
            self.target,
            self.state,
            next
        );
        self.state = next;
    }

    fn finish(mut self, outcome: ReflectionOutcome, detail: String) -> ReflectionVerdict {
        self.transition(CheckState::Done(outcome.clone()));
        ReflectionVerdict::new(self.target.ip(), self.probe.attack(), outcome, detail)
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

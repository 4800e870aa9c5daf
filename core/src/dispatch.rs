//! # Probe Dispatcher
//!
//! Maps the target port and the mode flags onto the probes to run, in order.
//! Pure and stateless.

use std::fmt;

use lift_common::config::{DNS_PORT, HTTP_PORT, NTP_PORT, SSDP_PORT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// HTTP title/server matching on the target port.
    HttpFingerprint,
    /// Certificate matching, falling back to HTTP.
    TlsFingerprint,
    DnsReflection,
    NtpReflection,
    SsdpReflection,
}

impl ProbeKind {
    pub fn is_reflection(self) -> bool {
        matches!(
            self,
            ProbeKind::DnsReflection | ProbeKind::NtpReflection | ProbeKind::SsdpReflection
        )
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeKind::HttpFingerprint => "HTTP fingerprint",
            ProbeKind::TlsFingerprint => "TLS fingerprint",
            ProbeKind::DnsReflection => "DNS reflection",
            ProbeKind::NtpReflection => "NTP reflection",
            ProbeKind::SsdpReflection => "SSDP reflection",
        };
        f.write_str(name)
    }
}

const ALL_REFLECTIONS: [ProbeKind; 3] = [
    ProbeKind::DnsReflection,
    ProbeKind::SsdpReflection,
    ProbeKind::NtpReflection,
];

/// Probes for a target, in the order they run.
///
/// | port  | recurse | recon | probes                          |
/// |-------|---------|-------|---------------------------------|
/// | 80    | any     | no    | HTTP                            |
/// | other | no      | no    | TLS (HTTP fallback)             |
/// | 53    | yes     | no    | DNS                             |
/// | 123   | yes     | no    | NTP                             |
/// | 1900  | yes     | no    | SSDP                            |
/// | other | yes     | no    | DNS, SSDP, NTP                  |
/// | any   | any     | yes   | HTTP or TLS, then DNS, SSDP, NTP |
///
/// Port 80 is never a reflection target, so `-r` on it still fingerprints.
pub fn select(port: u16, recurse: bool, recon: bool) -> Vec<ProbeKind> {
    let fingerprint = if port == HTTP_PORT {
        ProbeKind::HttpFingerprint
    } else {
        ProbeKind::TlsFingerprint
    };

    match (recurse, recon) {
        (_, true) => std::iter::once(fingerprint).chain(ALL_REFLECTIONS).collect(),
        (false, false) => vec![fingerprint],
        (true, false) => match port {
            HTTP_PORT => vec![ProbeKind::HttpFingerprint],
            DNS_PORT => vec![ProbeKind::DnsReflection],
            NTP_PORT => vec![ProbeKind::NtpReflection],
            SSDP_PORT => vec![ProbeKind::SsdpReflection],
            _ => ALL_REFLECTIONS.to_vec(),
        },
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

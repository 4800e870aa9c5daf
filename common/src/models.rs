//! # Probe Models
//!
//! Values handed from the probe engine to whoever reports on a run.
//!
//! Every value here is created once, when the probe that produced it finishes,
//! and is never mutated afterwards.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::{DateTime, Utc};

/// Which family of probes a target is subjected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Identify the device behind the target port.
    Fingerprint,
    /// Test UDP services for reflection/amplification.
    Recurse,
    /// Both of the above.
    Recon,
}

impl ScanMode {
    /// Recon takes precedence when both flags are given.
    pub fn from_flags(recurse: bool, recon: bool) -> Self {
        match (recurse, recon) {
            (_, true) => Self::Recon,
            (true, false) => Self::Recurse,
            (false, false) => Self::Fingerprint,
        }
    }

    pub fn recurse(self) -> bool {
        matches!(self, Self::Recurse)
    }

    pub fn recon(self) -> bool {
        matches!(self, Self::Recon)
    }
}

/// A validated address, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Position of the entry in the input, used to order the status list.
    pub seq: usize,
    pub addr: IpAddr,
    pub port: u16,
    pub mode: ScanMode,
}

impl ProbeTarget {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

/// How a fingerprint was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    TlsCertificate,
    Http,
    Https,
    Rtsp,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::TlsCertificate => "TLS certificate",
            Method::Http => "HTTP",
            Method::Https => "HTTPS",
            Method::Rtsp => "RTSP",
        };
        f.write_str(name)
    }
}

/// The two HTTP response fields every matching rule looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpObservation {
    pub title: Option<String>,
    pub server: Option<String>,
}

impl fmt::Display for HttpObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "title is {}, server is {}",
            self.title.as_deref().unwrap_or("None"),
            self.server.as_deref().unwrap_or("None")
        )
    }
}

/// Outcome of the fingerprint chain for one target.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub addr: IpAddr,
    pub port: u16,
    pub matched_label: Option<String>,
    /// The last method that produced data, or the last one attempted.
    pub method: Method,
    /// Title and server of the HTTP response, when one was received.
    pub observation: Option<HttpObservation>,
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    pub fn identified(addr: IpAddr, port: u16, label: String, method: Method) -> Self {
        Self {
            addr,
            port,
            matched_label: Some(label),
            method,
            observation: None,
            timestamp: Utc::now(),
        }
    }

    pub fn unidentified(
        addr: IpAddr,
        port: u16,
        method: Method,
        observation: Option<HttpObservation>,
    ) -> Self {
        Self {
            addr,
            port,
            matched_label: None,
            method,
            observation,
            timestamp: Utc::now(),
        }
    }

    pub fn with_observation(mut self, observation: Option<HttpObservation>) -> Self {
        self.observation = observation;
        self
    }

    pub fn is_identified(&self) -> bool {
        self.matched_label.is_some()
    }

    /// Whether the result deserves a finding line.
    ///
    /// Unidentified HTTP responses are only reported in verbose mode.
    pub fn is_reportable(&self, verbose: bool) -> bool {
        self.is_identified() || (verbose && self.observation.is_some())
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.matched_label, &self.observation) {
            (Some(label), _) => write!(f, "{}: {} ({})", self.addr, label, self.method),
            (None, Some(observation)) => {
                write!(f, "{}: {} ({})", self.addr, observation, self.method)
            }
            (None, None) => write!(f, "{}: unidentified ({})", self.addr, self.method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attack {
    DnsAmplification,
    SsdpReflection,
    NtpMonlist,
}

impl Attack {
    pub fn protocol(self) -> &'static str {
        match self {
            Attack::DnsAmplification => "DNS",
            Attack::SsdpReflection => "SSDP",
            Attack::NtpMonlist => "NTP",
        }
    }
}

impl fmt::Display for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attack::DnsAmplification => "DNS amplification",
            Attack::SsdpReflection => "SSDP reflection",
            Attack::NtpMonlist => "NTP monlist amplification",
        };
        f.write_str(name)
    }
}

/// Terminal state of a reflection check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionOutcome {
    Vulnerable,
    NotVulnerable,
    /// The check could not be carried out. Reported as not vulnerable.
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ReflectionVerdict {
    pub addr: IpAddr,
    pub attack: Attack,
    pub outcome: ReflectionOutcome,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl ReflectionVerdict {
    pub fn new(addr: IpAddr, attack: Attack, outcome: ReflectionOutcome, detail: String) -> Self {
        Self {
            addr,
            attack,
            outcome,
            detail,
            timestamp: Utc::now(),
        }
    }

    pub fn vulnerable(&self) -> bool {
        self.outcome == ReflectionOutcome::Vulnerable
    }
}

impl fmt::Display for ReflectionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negation = if self.vulnerable() { "" } else { "not " };
        write!(f, "{} is {}vulnerable to {}", self.addr, negation, self.attack)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    Success,
    Failed(String),
    /// The run was interrupted while this target was being probed.
    Aborted,
}

/// Everything learned about one input entry.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub seq: usize,
    /// The entry as it appeared in the input.
    pub entry: String,
    pub fingerprint: Option<ProbeResult>,
    pub verdicts: Vec<ReflectionVerdict>,
    pub status: TargetStatus,
}

impl TargetReport {
    pub fn completed(
        target: &ProbeTarget,
        fingerprint: Option<ProbeResult>,
        verdicts: Vec<ReflectionVerdict>,
    ) -> Self {
        Self {
            seq: target.seq,
            entry: target.addr.to_string(),
            fingerprint,
            verdicts,
            status: TargetStatus::Success,
        }
    }

    pub fn failed(seq: usize, entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            seq,
            entry: entry.into(),
            fingerprint: None,
            verdicts: Vec::new(),
            status: TargetStatus::Failed(reason.into()),
        }
    }

    pub fn aborted(target: &ProbeTarget) -> Self {
        Self {
            seq: target.seq,
            entry: target.addr.to_string(),
            fingerprint: None,
            verdicts: Vec::new(),
            status: TargetStatus::Aborted,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TargetStatus::Success
    }

    pub fn status_line(&self) -> String {
        let status = match self.status {
            TargetStatus::Success => "success",
            TargetStatus::Failed(_) => "fail",
            TargetStatus::Aborted => "aborted",
        };
        format!("{} : {}", self.entry, status)
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

//! Failure kinds of a single probe.
//!
//! None of these abort a run. The engine uses the kind to decide whether to
//! fall through to the next probe, record a failed target, or report a
//! reflection check as not vulnerable.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid input '{0}'")]
    InvalidInput(String),

    #[error("connection to {addr} failed: {source}")]
    ConnectFailure {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} on {addr} timed out")]
    Timeout {
        addr: SocketAddr,
        operation: &'static str,
    },

    #[error("TLS handshake with {addr} failed: {reason}")]
    HandshakeFailed { addr: SocketAddr, reason: String },

    #[error("malformed {protocol} payload: {reason}")]
    ProtocolError {
        protocol: &'static str,
        reason: String,
    },

    #[error("could not load signatures from {source_name}: {reason}")]
    SignatureLoad { source_name: String, reason: String },

    #[error("interrupted")]
    Interrupted,
}

impl ProbeError {
    pub fn protocol(protocol: &'static str, reason: impl Into<String>) -> Self {
        Self::ProtocolError {
            protocol,
            reason: reason.into(),
        }
    }

    /// Whether the error came from the network rather than from the payload.
    ///
    /// Network errors fall through to the next probe silently.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailure { .. } | Self::Timeout { .. } | Self::HandshakeFailed { .. }
        )
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

//! # Fingerprint Probers
//!
//! One prober per protocol. Each performs a single bounded exchange with the
//! target and reports either what it saw or why it saw nothing; chaining them
//! into a fallback sequence is the engine's job.

pub mod http;
pub mod rtsp;
pub mod tls;


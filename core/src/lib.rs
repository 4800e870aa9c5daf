//! # Lift Core
//!
//! The identification engine: signature store and heuristic rules, the
//! TLS/HTTP/RTSP fingerprint chain, the UDP reflection checks, the probe
//! dispatcher and the worker pool that drives them.

pub mod dispatch;
pub mod engine;
pub mod network;
pub mod probe;
pub mod reflection;
pub mod rules;
pub mod scanner;
pub mod signatures;

pub use engine::ProbeEngine;
pub use scanner::{RunReport, Scanner, Shutdown};
pub use signatures::SignatureStore;

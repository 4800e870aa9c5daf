//! Socket helpers shared by the probers. Every operation is bounded by a
//! timeout and maps failures onto [`ProbeError`](lift_common::error::ProbeError).

pub mod tcp;
pub mod udp;

//! Wire formats spoken by the probes.
//!
//! Everything here is pure: builders return byte buffers and parsers take
//! received bytes. Sockets live in `lift-core`.

pub mod dns;
pub mod http;
pub mod ntp;
pub mod pem;
pub mod rtsp;
pub mod ssdp;

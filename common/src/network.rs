//! Turning user input into the ordered list of entries a run probes.

pub mod asn;
pub mod range;
pub mod target;

//! Loopback integration tests for the lift workspace.
//!
//! Every test talks to real sockets on 127.0.0.1, with the configurable ports
//! of [`lift_common::config::Config`] standing in for the privileged ones.

#[cfg(test)]
mod utils;

#[cfg(test)]
mod fingerprint;
#[cfg(test)]
mod reflection;
#[cfg(test)]
mod scanner;
#[cfg(test)]
mod signatures;

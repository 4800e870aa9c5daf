//! # Lift Common
//!
//! Types shared by every crate in the workspace: the run [`config`], the
//! [`error`] kinds a probe can fail with, the result [`models`] that flow from
//! the engine to the terminal, and [`network`] target parsing.

pub mod config;
pub mod error;
pub mod macros;
pub mod models;
pub mod network;

#![forbid(unsafe_code)]

//! Core: protocol levels, glyph mapping, stats accumulation, and configuration.
//!
//! Nothing in this crate touches the terminal or the network. The renderer
//! (`hp-render`) and the probe loop (`hp-probe`) both build on these types.

pub mod config;
pub mod error;
pub mod glyph;
pub mod protocol;
pub mod stats;

/// Version string shown in the header line.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

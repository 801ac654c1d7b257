#![forbid(unsafe_code)]

//! `hp`: an HTTP latency probe for the terminal.
//!
//! The binary is a thin shell over [`app::run`]; the pieces live in the
//! `hp-core`, `hp-render` and `hp-probe` crates.

pub mod app;
pub mod cli;
pub mod logging;
pub mod resolve;

#![forbid(unsafe_code)]

//! Render kernel: ANSI helpers, terminal capabilities, the incremental bar
//! renderer, the shared display, and the signal worker.

pub mod ansi;
pub mod display;
pub mod renderer;
pub mod signals;
pub mod terminal;
pub mod terminal_model;

pub use display::{Display, SharedDisplay};
pub use renderer::{HeaderInfo, RenderOptions, Renderer};

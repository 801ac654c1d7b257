#![forbid(unsafe_code)]

//! Probing: transports, protocol selection and the probe loop.

pub mod program;
pub mod selector;
pub mod transport;

pub use program::{LoopSettings, Phase, ProbeLoop, Tick};
pub use selector::ProtocolSelector;
pub use transport::{HTTP3_AVAILABLE, ReqwestFactory, Transport, TransportFactory};

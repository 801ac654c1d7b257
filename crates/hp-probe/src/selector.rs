#![forbid(unsafe_code)]

//! Protocol selector: the current level and the client that speaks it.
//!
//! Timing is taken here, from just before the request is dispatched to just
//! after it returns or errors, so transports only need to issue the call.

use std::time::{Duration, Instant};

use hp_core::error::{ConfigError, ProbeError};
use hp_core::protocol::ProtocolLevel;

use crate::transport::{HTTP2_LABEL, Transport, TransportFactory};

/// Owns the active [`Transport`] and rebuilds it on a level change.
pub struct ProtocolSelector {
    factory: Box<dyn TransportFactory>,
    transport: Box<dyn Transport>,
    host: String,
    level: ProtocolLevel,
    timeout: Duration,
    insecure: bool,
}

impl std::fmt::Debug for ProtocolSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolSelector")
            .field("host", &self.host)
            .field("level", &self.level)
            .field("timeout", &self.timeout)
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}

impl ProtocolSelector {
    /// Build the client for `level`.
    ///
    /// Fails fast when the factory cannot serve the level at all (HTTP/3 in a
    /// build without QUIC) or the client cannot be constructed.
    pub fn new(
        factory: Box<dyn TransportFactory>,
        host: impl Into<String>,
        level: ProtocolLevel,
        timeout: Duration,
        insecure: bool,
    ) -> Result<Self, ConfigError> {
        if !factory.supports(level) {
            return Err(match level {
                ProtocolLevel::Http3 => ConfigError::Http3Unsupported,
                other => ConfigError::ClientBuild(format!("{other} is not available")),
            });
        }
        let transport = factory
            .make(level, timeout, insecure)
            .map_err(|err| ConfigError::ClientBuild(err.to_string()))?;
        Ok(Self {
            factory,
            transport,
            host: host.into(),
            level,
            timeout,
            insecure,
        })
    }

    #[must_use]
    pub const fn level(&self) -> ProtocolLevel {
        self.level
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL probed at the current level.
    #[must_use]
    pub fn url(&self) -> String {
        self.level.url_for(&self.host)
    }

    /// One timed probe at the current level.
    pub fn probe(&self) -> Result<Duration, ProbeError> {
        timed_head(self.transport.as_ref(), &self.url(), self.level)
    }

    /// Build a client for `level` and probe once with it, without touching
    /// the current level. On success the client is handed back for
    /// [`switch_to`](Self::switch_to).
    pub fn try_level(&self, level: ProtocolLevel) -> Result<Box<dyn Transport>, ProbeError> {
        if !self.factory.supports(level) {
            return Err(ProbeError::Request(format!("{level} is not available")));
        }
        let transport = self.factory.make(level, self.timeout, self.insecure)?;
        let elapsed = timed_head(transport.as_ref(), &level.url_for(&self.host), level)?;
        tracing::debug!(%level, ?elapsed, "trial probe succeeded");
        Ok(transport)
    }

    /// Replace the active client.
    pub fn switch_to(&mut self, level: ProtocolLevel, transport: Box<dyn Transport>) {
        tracing::info!(from = %self.level, to = %level, "protocol switched");
        self.level = level;
        self.transport = transport;
    }
}

/// Issue `HEAD url` on `transport` and measure it.
///
/// At [`ProtocolLevel::Http2`] a response negotiated as anything other than
/// HTTP/2 is an error even though the server answered.
pub fn timed_head(
    transport: &dyn Transport,
    url: &str,
    level: ProtocolLevel,
) -> Result<Duration, ProbeError> {
    let start = Instant::now();
    let result = transport.head(url);
    let elapsed = start.elapsed();
    let negotiated = result?;
    if level == ProtocolLevel::Http2 && negotiated != HTTP2_LABEL {
        return Err(ProbeError::ProtocolMismatch {
            expected: HTTP2_LABEL,
            negotiated,
        });
    }
    Ok(elapsed)
}

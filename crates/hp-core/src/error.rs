#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! | Error | Fatal | Where it surfaces |
//! |-------|-------|-------------------|
//! | [`ConfigError`] | yes, exit 1 | startup validation |
//! | [`ResolutionError`] | yes, exit 1 | host lookup before the first probe |
//! | [`ProbeError`] | no | one failed probe, drawn as `!` |
//!
//! Terminal failures never reach these types: the terminal layer logs them
//! and skips the feature.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Invalid or unsupported configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("only one of --http, --http2, --http3 may be given")]
    ConflictingProtocols,

    #[error("HTTP/3 support not compiled in (rebuild with --features http3)")]
    Http3Unsupported,

    #[error("green threshold ({green}ms) must be below yellow threshold ({yellow}ms)")]
    ThresholdOrder { green: i64, yellow: i64 },

    #[error("invalid duration {value:?} for {flag}")]
    InvalidDuration { flag: &'static str, value: String },

    #[error("invalid host {0:?}")]
    InvalidHost(String),

    #[error("cannot build HTTP client: {0}")]
    ClientBuild(String),
}

/// Host name lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve {host}: {reason}")]
pub struct ResolutionError {
    pub host: String,
    pub reason: String,
}

/// One probe failed. Counted and drawn, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("expected {expected}, server negotiated {negotiated}")]
    ProtocolMismatch {
        expected: &'static str,
        negotiated: String,
    },
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum HpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("terminal I/O: {0}")]
    Io(#[from] io::Error),
}

impl HpError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_line() {
        let errors: Vec<HpError> = vec![
            ConfigError::ConflictingProtocols.into(),
            ConfigError::Http3Unsupported.into(),
            ConfigError::ThresholdOrder {
                green: 400,
                yellow: 150,
            }
            .into(),
            ResolutionError {
                host: "nope.invalid".into(),
                reason: "no such host".into(),
            }
            .into(),
        ];
        for err in errors {
            let msg = err.to_string();
            assert!(!msg.is_empty());
            assert!(!msg.contains('\n'), "multi-line message: {msg}");
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn mismatch_names_both_versions() {
        let err = ProbeError::ProtocolMismatch {
            expected: "HTTP/2.0",
            negotiated: "HTTP/1.1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP/2.0"));
        assert!(msg.contains("HTTP/1.1"));
    }
}

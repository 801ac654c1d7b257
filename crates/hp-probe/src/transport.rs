#![forbid(unsafe_code)]

//! Transport seam between the probe loop and the network.
//!
//! A [`Transport`] issues one `HEAD` and reports the protocol the server
//! negotiated. A [`TransportFactory`] builds one per protocol level. The
//! production factory is reqwest-backed; tests inject stubs.

use std::time::Duration;

use hp_core::error::ProbeError;
use hp_core::protocol::ProtocolLevel;

/// Whether this build can speak HTTP/3.
pub const HTTP3_AVAILABLE: bool = cfg!(feature = "http3");

/// Negotiated-protocol label an HTTP/2 probe must report.
pub const HTTP2_LABEL: &str = "HTTP/2.0";

/// One configured client.
pub trait Transport: Send {
    /// Send `HEAD url` and return the negotiated protocol label
    /// (`HTTP/1.1`, `HTTP/2.0`, ...). Any response status counts as success.
    fn head(&self, url: &str) -> Result<String, ProbeError>;
}

/// Builds a [`Transport`] for a protocol level.
pub trait TransportFactory: Send {
    fn make(
        &self,
        level: ProtocolLevel,
        timeout: Duration,
        insecure: bool,
    ) -> Result<Box<dyn Transport>, ProbeError>;

    /// Whether `level` can be built at all in this process.
    fn supports(&self, level: ProtocolLevel) -> bool {
        let _ = level;
        true
    }
}

// ── reqwest ──────────────────────────────────────────────────────────────

/// Production factory: a fresh blocking reqwest client per level.
///
/// Clients never follow redirects and keep no idle connections, so every
/// probe pays for its own connection setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestFactory;

impl TransportFactory for ReqwestFactory {
    fn make(
        &self,
        level: ProtocolLevel,
        timeout: Duration,
        insecure: bool,
    ) -> Result<Box<dyn Transport>, ProbeError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(insecure);

        builder = match level {
            ProtocolLevel::Http1 => builder.http1_only(),
            ProtocolLevel::Https | ProtocolLevel::Http2 => builder,
            #[cfg(feature = "http3")]
            ProtocolLevel::Http3 => builder.http3_prior_knowledge(),
            #[cfg(not(feature = "http3"))]
            ProtocolLevel::Http3 => {
                return Err(ProbeError::Request(
                    "HTTP/3 support not compiled in".to_string(),
                ));
            }
        };

        let client = builder
            .build()
            .map_err(|err| ProbeError::Request(err.to_string()))?;
        tracing::debug!(%level, ?timeout, insecure, "built HTTP client");
        Ok(Box::new(ReqwestTransport { client, timeout }))
    }

    fn supports(&self, level: ProtocolLevel) -> bool {
        level != ProtocolLevel::Http3 || HTTP3_AVAILABLE
    }
}

/// A blocking reqwest client for one level.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl Transport for ReqwestTransport {
    fn head(&self, url: &str) -> Result<String, ProbeError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|err| classify(&err, self.timeout))?;
        let label = version_label(response.version());
        drop(response);
        Ok(label.to_string())
    }
}

/// Protocol label in the `HTTP/x.y` form servers report.
#[must_use]
pub fn version_label(version: reqwest::Version) -> &'static str {
    match version {
        reqwest::Version::HTTP_09 => "HTTP/0.9",
        reqwest::Version::HTTP_10 => "HTTP/1.0",
        reqwest::Version::HTTP_11 => "HTTP/1.1",
        reqwest::Version::HTTP_2 => HTTP2_LABEL,
        reqwest::Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/?",
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::Timeout(timeout);
    }
    let chain = error_chain(err);
    let lower = chain.to_ascii_lowercase();
    if lower.contains("certificate") || lower.contains("tls") || lower.contains("handshake") {
        ProbeError::Tls(chain)
    } else if err.is_connect() {
        ProbeError::Connect(chain)
    } else {
        ProbeError::Request(chain)
    }
}

/// `err: source: source ...` on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_labels() {
        assert_eq!(version_label(reqwest::Version::HTTP_11), "HTTP/1.1");
        assert_eq!(version_label(reqwest::Version::HTTP_2), "HTTP/2.0");
        assert_eq!(version_label(reqwest::Version::HTTP_3), "HTTP/3.0");
        assert_eq!(version_label(reqwest::Version::HTTP_10), "HTTP/1.0");
    }

    #[test]
    fn factory_reports_http3_support() {
        let factory = ReqwestFactory;
        assert!(factory.supports(ProtocolLevel::Http1));
        assert!(factory.supports(ProtocolLevel::Https));
        assert!(factory.supports(ProtocolLevel::Http2));
        assert_eq!(factory.supports(ProtocolLevel::Http3), HTTP3_AVAILABLE);
    }

    #[test]
    fn factory_builds_tls_levels() {
        let factory = ReqwestFactory;
        for level in [ProtocolLevel::Http1, ProtocolLevel::Https, ProtocolLevel::Http2] {
            assert!(factory.make(level, Duration::from_secs(1), false).is_ok());
        }
        assert!(
            factory
                .make(ProtocolLevel::Https, Duration::from_secs(1), true)
                .is_ok()
        );
    }

    #[cfg(not(feature = "http3"))]
    #[test]
    fn http3_without_feature_is_refused() {
        let result = ReqwestFactory.make(ProtocolLevel::Http3, Duration::from_secs(1), false);
        assert!(result.is_err());
    }

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("connect")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn chain_flattens_sources() {
        let err = Outer(std::io::Error::other("refused"));
        assert_eq!(error_chain(&err), "connect: refused");
    }
}

#![forbid(unsafe_code)]

//! Run configuration.
//!
//! [`Config`] is built once at startup by the CLI layer and never mutated
//! afterwards. Threshold environment variables are read through an injected
//! lookup so callers (and tests) decide where values come from.

use std::net::Ipv6Addr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::glyph::{Thresholds, VisualMode};
use crate::protocol::{DowngradePolicy, ProtocolLevel};

/// Environment variable for the lowest-green baseline.
pub const ENV_MIN: &str = "HP_MIN";
/// Environment variable for the green → yellow threshold.
pub const ENV_GREEN: &str = "HP_GREEN";
/// Environment variable for the yellow → red threshold.
pub const ENV_YELLOW: &str = "HP_YELLOW";

/// Host probed when none is given.
pub const DEFAULT_HOST: &str = "1.1.1.1";

/// Immutable run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host token placed in the URL (port and IPv6 brackets included).
    pub host: String,
    /// Host as shown in the header and the final report.
    pub display_host: String,
    /// Resolved address shown next to the host, if it differs.
    pub resolved_ip: Option<String>,
    pub interval: Duration,
    /// Upper bound (exclusive) of the random delay added to `interval`.
    pub jitter: Duration,
    /// Per-probe ceiling.
    pub timeout: Duration,
    /// Stop after this many probes; 0 runs forever.
    pub count: u64,
    pub thresholds: Thresholds,
    pub mode: VisualMode,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    pub protocol: ProtocolLevel,
    pub downgrade: DowngradePolicy,
    pub show_header: bool,
    pub show_legend: bool,
    pub show_final: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            display_host: DEFAULT_HOST.to_string(),
            resolved_ip: None,
            interval: Duration::from_secs(1),
            jitter: Duration::ZERO,
            timeout: Duration::from_secs(5),
            count: 0,
            thresholds: Thresholds::default(),
            mode: VisualMode::Block,
            insecure: false,
            protocol: ProtocolLevel::Https,
            downgrade: DowngradePolicy::Off,
            show_header: true,
            show_legend: false,
            show_final: true,
        }
    }
}

impl Config {
    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if t.green_ms >= t.yellow_ms {
            return Err(ConfigError::ThresholdOrder {
                green: t.green_ms,
                yellow: t.yellow_ms,
            });
        }
        if self.host.is_empty() {
            return Err(ConfigError::InvalidHost(self.host.clone()));
        }
        Ok(())
    }

    /// Thresholds as the glyph mapper should see them (`min` clamped to `green`).
    #[must_use]
    pub fn effective_thresholds(&self) -> Thresholds {
        let t = self.thresholds;
        Thresholds::new(t.min_ms.min(t.green_ms), t.green_ms, t.yellow_ms)
    }
}

/// Parse `key` as a signed integer, falling back to `default` when unset,
/// empty, or unparseable. Surrounding whitespace counts as unparseable.
pub fn env_int_with<F>(get_env: F, key: &str, default: i64) -> i64
where
    F: Fn(&str) -> Option<String>,
{
    get_env(key)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

/// Thresholds from the environment, then overridden by explicit flags.
pub fn thresholds_with<F>(
    get_env: F,
    min_flag: Option<i64>,
    green_flag: Option<i64>,
    yellow_flag: Option<i64>,
) -> Thresholds
where
    F: Fn(&str) -> Option<String>,
{
    let min_ms = min_flag.unwrap_or_else(|| env_int_with(&get_env, ENV_MIN, Thresholds::DEFAULT_MIN_MS));
    let green_ms = green_flag
        .unwrap_or_else(|| env_int_with(&get_env, ENV_GREEN, Thresholds::DEFAULT_GREEN_MS));
    let yellow_ms = yellow_flag
        .unwrap_or_else(|| env_int_with(&get_env, ENV_YELLOW, Thresholds::DEFAULT_YELLOW_MS));
    Thresholds::new(min_ms, green_ms, yellow_ms)
}

/// Turn a user-supplied target into a URL host token.
///
/// Strips a leading `http://` or `https://`, drops any path, and brackets a
/// bare IPv6 literal.
#[must_use]
pub fn normalize_host(target: &str) -> String {
    let target = target.trim();
    let rest = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    if rest.parse::<Ipv6Addr>().is_ok() {
        return format!("[{rest}]");
    }
    let host = rest.split('/').next().unwrap_or(rest);
    host.to_string()
}

/// Name part of a host token, without brackets or port.
///
/// `example.com:8080` → `example.com`; `[::1]:443` → `::1`.
#[must_use]
pub fn host_name(host: &str) -> &str {
    if let Some(inner) = host.strip_prefix('[') {
        return inner.split(']').next().unwrap_or(inner);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#![forbid(unsafe_code)]

//! Command-line surface for `hp`.
//!
//! clap handles syntax; everything that can fail semantically (protocol flag
//! conflicts, durations, thresholds) is checked in [`Cli::into_config`] so it
//! surfaces as a [`ConfigError`] with exit code 1.
//!
//! Threshold flags fall back to `HP_MIN`, `HP_GREEN` and `HP_YELLOW`. They
//! are signed and take `-5` as a value, even where it collides with a short
//! flag such as `-1`.

use std::time::Duration;

use clap::Parser;
use hp_core::config::{self, Config, DEFAULT_HOST};
use hp_core::error::ConfigError;
use hp_core::glyph::VisualMode;
use hp_core::protocol::{DowngradePolicy, ProtocolLevel};

/// HTTP latency probe: one colored glyph per request.
#[derive(Debug, Clone, Parser)]
#[command(name = "hp", disable_version_flag = true)]
pub struct Cli {
    /// Target host (scheme and path are ignored) [default: 1.1.1.1]
    pub host: Option<String>,

    /// Spacing between probes (e.g. 1s, 500ms, 1m30s)
    #[arg(short, long, default_value = "1s")]
    pub interval: String,

    /// Upper bound of the random delay added to the interval
    #[arg(short, long, default_value = "0")]
    pub jitter: String,

    /// Per-probe timeout
    #[arg(short, long, default_value = "5s")]
    pub timeout: String,

    /// Stop after N probes (0 = run until interrupted)
    #[arg(short, long, default_value_t = 0)]
    pub count: u64,

    /// Show the legend line
    #[arg(long)]
    pub legend: bool,

    /// Hide the header line
    #[arg(long)]
    pub noheader: bool,

    /// Double-density braille glyphs
    #[arg(short, long)]
    pub braille: bool,

    /// Hide header and legend
    #[arg(short, long)]
    pub quiet: bool,

    /// Like --quiet, and skip the final statistics
    #[arg(short = 'Q', long)]
    pub silent: bool,

    /// Baseline in ms for the lowest green block [env: HP_MIN] [default: 0]
    #[arg(short, long, allow_hyphen_values = true)]
    pub min: Option<i64>,

    /// Green to yellow threshold in ms [env: HP_GREEN] [default: 150]
    #[arg(short, long, allow_hyphen_values = true)]
    pub green: Option<i64>,

    /// Yellow to red threshold in ms [env: HP_YELLOW] [default: 400]
    #[arg(short, long, allow_hyphen_values = true)]
    pub yellow: Option<i64>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Force plaintext HTTP/1.1
    #[arg(short = '1', long)]
    pub http: bool,

    /// Require HTTP/2 negotiation
    #[arg(short = '2', long)]
    pub http2: bool,

    /// Use HTTP/3 over QUIC
    #[arg(short = '3', long)]
    pub http3: bool,

    /// Step down among secure protocols while nothing has answered yet
    #[arg(short, long)]
    pub downgrade: bool,

    /// Like --downgrade, but may fall back to plain HTTP
    #[arg(short = 'D', long)]
    pub downgrade_insecure: bool,

    /// Print version and exit
    #[arg(short = 'v', long)]
    pub version: bool,
}

impl Cli {
    /// Requested protocol level; at most one protocol flag may be set.
    pub fn protocol(&self) -> Result<ProtocolLevel, ConfigError> {
        let requested: Vec<ProtocolLevel> = [
            (self.http, ProtocolLevel::Http1),
            (self.http2, ProtocolLevel::Http2),
            (self.http3, ProtocolLevel::Http3),
        ]
        .into_iter()
        .filter_map(|(set, level)| set.then_some(level))
        .collect();
        match requested.as_slice() {
            [] => Ok(ProtocolLevel::Https),
            [level] => Ok(*level),
            _ => Err(ConfigError::ConflictingProtocols),
        }
    }

    /// `-D` wins over `-d`: it has the wider floor.
    #[must_use]
    pub const fn downgrade_policy(&self) -> DowngradePolicy {
        if self.downgrade_insecure {
            DowngradePolicy::IncludeInsecure
        } else if self.downgrade {
            DowngradePolicy::SecureOnly
        } else {
            DowngradePolicy::Off
        }
    }

    /// Resolve flags and threshold env vars into a validated [`Config`].
    ///
    /// `resolved_ip` is left empty; the caller fills it after lookup.
    pub fn into_config<F>(self, get_env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let protocol = self.protocol()?;
        let downgrade = self.downgrade_policy();
        let interval = duration_flag("--interval", &self.interval)?;
        let jitter = duration_flag("--jitter", &self.jitter)?;
        let timeout = duration_flag("--timeout", &self.timeout)?;
        let thresholds = config::thresholds_with(get_env, self.min, self.green, self.yellow);

        let quiet = self.quiet || self.silent;
        let target = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let host = config::normalize_host(target);

        let cfg = Config {
            display_host: host.clone(),
            host,
            resolved_ip: None,
            interval,
            jitter,
            timeout,
            count: self.count,
            thresholds,
            mode: if self.braille {
                VisualMode::Braille
            } else {
                VisualMode::Block
            },
            insecure: self.insecure,
            protocol,
            downgrade,
            show_header: !quiet && !self.noheader,
            show_legend: !quiet && self.legend,
            show_final: !self.silent,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Exit status for a clap parse failure: 0 for help and version output,
/// 1 for every usage error.
#[must_use]
pub fn usage_exit_code(err: &clap::Error) -> u8 {
    use clap::error::ErrorKind;
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn duration_flag(flag: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        flag,
        value: value.to_string(),
    })
}

/// Parse a duration written as `<number><unit>` runs (`1s`, `250ms`,
/// `1m30s`, `1.5s`). Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare
/// number is seconds.
#[must_use]
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return scaled_nanos(s, NANOS_PER_SEC).and_then(to_duration);
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return None;
        }
        let (number, tail) = rest.split_at(num_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            _ => return None,
        };
        total = total.checked_add(scaled_nanos(number, scale)?)?;
        rest = tail;
    }
    to_duration(total)
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

// Exact decimal arithmetic; fractional digits past 18 are dropped.
fn scaled_nanos(number: &str, scale: u128) -> Option<u128> {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.contains('.') {
        return None;
    }
    let whole = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<u128>().ok()?
    };
    let mut nanos = whole.checked_mul(scale)?;
    let frac_digits = &frac_part[..frac_part.len().min(18)];
    if !frac_digits.is_empty() {
        let frac = frac_digits.parse::<u128>().ok()?;
        let denom = 10u128.pow(u32::try_from(frac_digits.len()).ok()?);
        nanos = nanos.checked_add(frac * scale / denom)?;
    }
    Some(nanos)
}

fn to_duration(nanos: u128) -> Option<Duration> {
    u64::try_from(nanos).ok().map(Duration::from_nanos)
}

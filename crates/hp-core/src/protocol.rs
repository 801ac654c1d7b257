#![forbid(unsafe_code)]

//! Protocol levels and the downgrade ladder.
//!
//! Levels are totally ordered, `Http1 < Https < Http2 < Http3`. Auto-downgrade
//! walks the ladder strictly downward from the current level, never below the
//! floor chosen by the [`DowngradePolicy`].

use std::fmt;

/// Transport used for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ProtocolLevel {
    /// Plaintext `http://`, HTTP/1.1.
    Http1,
    /// `https://`, version negotiated through ALPN.
    #[default]
    Https,
    /// `https://`, probe fails unless the response was negotiated as HTTP/2.
    Http2,
    /// `https://` over QUIC.
    Http3,
}

impl ProtocolLevel {
    /// All levels, lowest first.
    pub const ALL: [Self; 4] = [Self::Http1, Self::Https, Self::Http2, Self::Http3];

    /// Human label used in the header and the downgrade notice.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Http1 => "HTTP/1.1",
            Self::Https => "HTTPS",
            Self::Http2 => "HTTP/2",
            Self::Http3 => "HTTP/3",
        }
    }

    /// URL scheme for this level.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Http1 => "http",
            Self::Https | Self::Http2 | Self::Http3 => "https",
        }
    }

    /// Next level down, if any.
    #[must_use]
    pub const fn lower(self) -> Option<Self> {
        match self {
            Self::Http1 => None,
            Self::Https => Some(Self::Http1),
            Self::Http2 => Some(Self::Https),
            Self::Http3 => Some(Self::Http2),
        }
    }

    /// Probe URL for `host` at this level.
    ///
    /// The host token is used verbatim: ports and IPv6 brackets are the
    /// caller's concern.
    #[must_use]
    pub fn url_for(self, host: &str) -> String {
        format!("{}://{}", self.scheme(), host)
    }
}

impl fmt::Display for ProtocolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Free-function form of [`ProtocolLevel::url_for`].
#[must_use]
pub fn url_for(host: &str, level: ProtocolLevel) -> String {
    level.url_for(host)
}

/// How far auto-downgrade may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DowngradePolicy {
    /// Never downgrade.
    #[default]
    Off,
    /// Downgrade among TLS protocols only (floor: HTTPS).
    SecureOnly,
    /// Downgrade all the way to plaintext HTTP (floor: HTTP/1.1).
    IncludeInsecure,
}

impl DowngradePolicy {
    /// Lowest level the policy may reach, or `None` when disabled.
    #[must_use]
    pub const fn floor(self) -> Option<ProtocolLevel> {
        match self {
            Self::Off => None,
            Self::SecureOnly => Some(ProtocolLevel::Https),
            Self::IncludeInsecure => Some(ProtocolLevel::Http1),
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Levels to try below `current`, highest first, stopping at the floor.
    ///
    /// Empty when the policy is off or `current` is already at the floor.
    #[must_use]
    pub fn candidates_below(self, current: ProtocolLevel) -> Vec<ProtocolLevel> {
        let Some(floor) = self.floor() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(3);
        let mut level = current.lower();
        while let Some(next) = level {
            if next < floor {
                break;
            }
            out.push(next);
            level = next.lower();
        }
        out
    }
}

#![forbid(unsafe_code)]

//! Host lookup before the first probe.
//!
//! Only the name part of the host token is resolved. Literal addresses skip
//! the lookup and show no `[ip]` in the header.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use hp_core::config::host_name;
use hp_core::error::ResolutionError;

/// Resolve `host` through the system resolver.
pub fn resolve(host: &str) -> Result<Option<String>, ResolutionError> {
    resolve_with(host, |name| {
        (name, 0u16).to_socket_addrs().map(|addrs| addrs.collect())
    })
}

/// Resolve `host` with an injected lookup. Returns the first address, or
/// `None` when the host is already a literal address.
pub fn resolve_with<F>(host: &str, lookup: F) -> Result<Option<String>, ResolutionError>
where
    F: FnOnce(&str) -> io::Result<Vec<SocketAddr>>,
{
    let name = host_name(host);
    if name.parse::<IpAddr>().is_ok() {
        return Ok(None);
    }
    let fail = |reason: String| ResolutionError {
        host: name.to_string(),
        reason,
    };
    let addrs = lookup(name).map_err(|err| fail(err.to_string()))?;
    let first = addrs
        .first()
        .ok_or_else(|| fail("no addresses returned".to_string()))?;
    tracing::debug!(host = name, ip = %first.ip(), count = addrs.len(), "resolved");
    Ok(Some(first.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn never(_: &str) -> io::Result<Vec<SocketAddr>> {
        panic!("literal addresses must not be looked up");
    }

    #[test]
    fn literals_skip_lookup() {
        assert_eq!(resolve_with("1.1.1.1", never), Ok(None));
        assert_eq!(resolve_with("[::1]", never), Ok(None));
        assert_eq!(resolve_with("[2001:db8::1]:8443", never), Ok(None));
        assert_eq!(resolve_with("10.0.0.1:8080", never), Ok(None));
    }

    #[test]
    fn first_address_wins_and_port_is_stripped() {
        let result = resolve_with("example.com:8080", |name| {
            assert_eq!(name, "example.com");
            Ok(vec![
                SocketAddr::new(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)), 0),
                SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0),
            ])
        });
        assert_eq!(result, Ok(Some("93.184.216.34".to_string())));
    }

    #[test]
    fn lookup_failure_is_resolution_error() {
        let err =
            resolve_with("nope.invalid", |_| Err(io::Error::other("no such host"))).unwrap_err();
        assert_eq!(err.host, "nope.invalid");
        assert_eq!(err.reason, "no such host");
    }

    #[test]
    fn empty_answer_is_resolution_error() {
        let err = resolve_with("empty.example", |_| Ok(Vec::new())).unwrap_err();
        assert_eq!(err.reason, "no addresses returned");
    }

    #[test]
    fn system_resolver_handles_literals() {
        assert_eq!(resolve("127.0.0.1"), Ok(None));
    }
}

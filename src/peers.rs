//! Peer collaborators
//!
//! Transport internals live outside this crate; the handlers consume two
//! narrow traits. `PeerNotifier` carries best-effort delete propagation for
//! purge deletes, `ContentFetcher` materializes remote content for copy
//! requests. `PeerAddr` is the `host:port` value used to configure both.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::error::{PeerCacheError, PeerCacheResult};
use crate::hash::ContentHash;

/// Address of a peer cache: host and port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

impl FromStr for PeerAddr {
    type Err = PeerCacheError;

    /// Parse a `host:port` string.
    ///
    /// Supports IPv6 addresses in brackets: `[::1]:7700`.
    /// Port must be 1-65535. Host must not be empty.
    fn from_str(s: &str) -> PeerCacheResult<Self> {
        let s = s.trim();
        let invalid = |reason: String| PeerCacheError::PeerAddrInvalid {
            input: s.to_string(),
            reason,
        };

        let (host, port_str) = if s.starts_with('[') {
            // IPv6 in brackets: [::1]:7700
            let close_bracket = s
                .find(']')
                .ok_or_else(|| invalid("missing closing bracket in IPv6 address".to_string()))?;
            let host = &s[1..close_bracket];
            let rest = &s[close_bracket + 1..];
            if !rest.starts_with(':') {
                return Err(invalid("expected ':' after closing bracket".to_string()));
            }
            (host.to_string(), &rest[1..])
        } else {
            // Regular host:port — split on the last colon to handle IPv4 and hostnames
            let last_colon = s
                .rfind(':')
                .ok_or_else(|| invalid("expected format host:port".to_string()))?;
            (s[..last_colon].to_string(), &s[last_colon + 1..])
        };

        if host.is_empty() {
            return Err(invalid("empty host".to_string()));
        }

        let port: u16 = port_str
            .parse()
            .map_err(|_| invalid(format!("invalid port '{}', must be 1-65535", port_str)))?;

        if port == 0 {
            return Err(invalid("port 0 is not valid, must be 1-65535".to_string()));
        }

        Ok(PeerAddr { host, port })
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Serialize for PeerAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PeerAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Best-effort delete propagation to a peer
///
/// Used only by purge deletes. Failures are collected per peer and never
/// fail the local delete.
#[async_trait]
pub trait PeerNotifier: Send + Sync {
    /// Ask `peer` to delete its copy of `hash`
    async fn notify_delete(&self, peer: &PeerAddr, hash: &ContentHash) -> PeerCacheResult<()>;
}

/// Notifier that records the request in the log and reports success.
///
/// Stands in wherever no transport is wired up, e.g. the CLI.
pub struct LoggingNotifier;

#[async_trait]
impl PeerNotifier for LoggingNotifier {
    async fn notify_delete(&self, peer: &PeerAddr, hash: &ContentHash) -> PeerCacheResult<()> {
        info!(peer = %peer, hash = %hash.short(), "Would notify peer of delete");
        Ok(())
    }
}

/// Materializes remote content for a copy request
///
/// The fetcher places the blob at a local path the byte store can ingest;
/// verification against the hash happens at ingest time, not here.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the blob for `hash` into `staging_dir`, returning its path
    async fn fetch(&self, hash: &ContentHash, staging_dir: &Path) -> PeerCacheResult<PathBuf>;
}

/// Fetcher for deployments without a transfer backend: every copy request
/// fails with a clear diagnostic.
pub struct UnavailableFetcher;

#[async_trait]
impl ContentFetcher for UnavailableFetcher {
    async fn fetch(&self, hash: &ContentHash, _staging_dir: &Path) -> PeerCacheResult<PathBuf> {
        Err(PeerCacheError::FetchUnavailable(hash.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_host_port() {
        let addr: PeerAddr = "buildbox-7.internal:7700".parse().unwrap();
        assert_eq!(addr.host, "buildbox-7.internal");
        assert_eq!(addr.port, 7700);
    }

    #[test]
    fn parse_valid_ip_port() {
        let addr: PeerAddr = "10.2.0.17:9000".parse().unwrap();
        assert_eq!(addr.host, "10.2.0.17");
        assert_eq!(addr.port, 9000);
    }

    #[test]
    fn parse_ipv6_bracketed() {
        let addr: PeerAddr = "[::1]:7700".parse().unwrap();
        assert_eq!(addr.host, "::1");
        assert_eq!(addr.port, 7700);
    }

    #[test]
    fn parse_trims_whitespace() {
        let addr: PeerAddr = "  cache01:7700  ".parse().unwrap();
        assert_eq!(addr.host, "cache01");
    }

    #[test]
    fn parse_empty_host_rejected() {
        assert!(PeerAddr::from_str(":7700").is_err());
    }

    #[test]
    fn parse_port_zero_rejected() {
        let result = PeerAddr::from_str("cache01:0");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("port 0"));
    }

    #[test]
    fn parse_missing_port_rejected() {
        assert!(PeerAddr::from_str("cache01").is_err());
    }

    #[test]
    fn parse_ipv6_missing_close_bracket() {
        let result = PeerAddr::from_str("[::1:7700");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("closing bracket"));
    }

    #[test]
    fn display_roundtrip() {
        for input in ["cache01:7700", "[2001:db8::1]:9000"] {
            let addr: PeerAddr = input.parse().unwrap();
            let again: PeerAddr = addr.to_string().parse().unwrap();
            assert_eq!(addr, again);
        }
    }

    #[test]
    fn serde_as_string() {
        let addr: PeerAddr = "cache01:7700".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"cache01:7700\"");

        let back: PeerAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[tokio::test]
    async fn unavailable_fetcher_fails() {
        use crate::hash::HashAlgorithm;
        let hash = ContentHash::digest_of(HashAlgorithm::Sha256, b"x");
        let result = UnavailableFetcher
            .fetch(&hash, Path::new("/tmp"))
            .await;
        assert!(matches!(result, Err(PeerCacheError::FetchUnavailable(_))));
    }
}

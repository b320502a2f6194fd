//! Content identity
//!
//! A `ContentHash` names a blob by its bytes: a hash algorithm tag plus a
//! fixed 32-byte digest. It is the sole key for every ledger, ghost-log and
//! store operation. Equality and ordering are byte-wise, so hashes sort
//! stably across machines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{PeerCacheError, PeerCacheResult};

/// Digest length in bytes (both supported algorithms emit 32 bytes)
pub const DIGEST_LEN: usize = 32;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,
    /// BLAKE3
    Blake3,
}

impl HashAlgorithm {
    /// Parse from the textual tag used in display form and config
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }

    /// Textual tag, used as a path component in the store layout
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A content hash: algorithm tag + fixed-length digest
///
/// Displayed as `<algo>:<hex>`, e.g.
/// `sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash {
    algo: HashAlgorithm,
    digest: [u8; DIGEST_LEN],
}

impl ContentHash {
    /// Create from raw digest bytes
    pub fn new(algo: HashAlgorithm, digest: [u8; DIGEST_LEN]) -> Self {
        Self { algo, digest }
    }

    /// Hash a byte slice with the given algorithm
    pub fn digest_of(algo: HashAlgorithm, data: &[u8]) -> Self {
        let digest = match algo {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                hasher.finalize().into()
            }
            HashAlgorithm::Blake3 => *blake3::hash(data).as_bytes(),
        };
        Self { algo, digest }
    }

    /// The algorithm tag
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algo
    }

    /// The raw digest bytes
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Hex-encoded digest (no algorithm tag)
    pub fn hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Short form for log lines: tag plus first 12 hex chars
    pub fn short(&self) -> String {
        format!("{}:{}", self.algo, &self.hex()[..12])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algo, self.hex())
    }
}

impl FromStr for ContentHash {
    type Err = PeerCacheError;

    fn from_str(s: &str) -> PeerCacheResult<Self> {
        let invalid = |reason: &str| PeerCacheError::HashInvalid {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (tag, hex_part) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected <algo>:<hex>"))?;

        let algo = HashAlgorithm::parse(tag)
            .ok_or_else(|| invalid("unknown algorithm (expected sha256 or blake3)"))?;

        let bytes = hex::decode(hex_part).map_err(|_| invalid("digest is not valid hex"))?;
        let digest: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| invalid("digest must be exactly 32 bytes"))?;

        Ok(Self { algo, digest })
    }
}

// Serialized as the display string so index files and wire payloads stay
// human-readable.
impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Identifier types for fund participants and external endpoints
//!
//! Holders, the owner, the fund itself, every external service and every
//! token are identified by a 20-byte address. Governance campaigns and vote
//! options are plain numeric identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

/// A 20-byte account or contract address.
///
/// Displays and serializes as a `0x`-prefixed lowercase hex string. Parsing
/// accepts either case, so checksummed addresses round-trip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Byte length of an address
    pub const LEN: usize = 20;

    /// The all-zero address (never a valid endpoint)
    pub const ZERO: Address = Address([0u8; 20]);

    /// Sentinel for the native deposit currency, `0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE`.
    ///
    /// Distinguishes the native currency from token addresses in any
    /// currency table (reward handlers, swap pairs, asset ledgers).
    pub const NATIVE_CURRENCY: Address = Address([0xee; 20]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Deterministically derive an address from a label.
    ///
    /// Takes the trailing 20 bytes of SHA-256(label). Used to give
    /// simulated participants and services stable identities.
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    /// Whether this is the native currency sentinel
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE_CURRENCY
    }

    /// Whether this is the zero address
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let decoded = hex::decode(digits).map_err(|_| ParseError::InvalidHex(s.to_string()))?;
        let bytes: [u8; 20] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| ParseError::InvalidLength(decoded.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Governance campaign identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(u64);

impl CampaignId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CampaignId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Option chosen when voting in a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteOption(u64);

impl VoteOption {
    pub const fn new(option: u64) -> Self {
        Self(option)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VoteOption {
    fn from(option: u64) -> Self {
        Self(option)
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

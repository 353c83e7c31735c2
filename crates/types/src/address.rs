//! Chain-agnostic contract addresses.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A contract address in its canonical string form.
///
/// Hex addresses (`0x` prefixed) are normalized to lower case so that the
/// same account always compares and serializes identically. Any other
/// encoding (base58, bech32, ...) is chain specific and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Number of bytes in a 32-byte padded address.
    pub const BYTES32: usize = 32;

    /// Create an address, normalizing hex encodings.
    pub fn new(address: impl AsRef<str>) -> Self {
        let trimmed = address.as_ref().trim();
        match strip_hex_prefix(trimmed) {
            Some(body) if body.chars().all(|c| c.is_ascii_hexdigit()) => {
                Self(format!("0x{}", body.to_ascii_lowercase()))
            }
            _ => Self(trimmed.to_string()),
        }
    }

    /// The 20-byte zero address.
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    /// Get the canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a hex address.
    pub fn is_hex(&self) -> bool {
        strip_hex_prefix(&self.0).is_some()
    }

    /// Whether this address is empty or made of zero bytes only.
    pub fn is_zero(&self) -> bool {
        match strip_hex_prefix(&self.0) {
            Some(body) => body.chars().all(|c| c == '0'),
            None => self.0.is_empty(),
        }
    }

    /// Left-pad a hex address to 32 bytes.
    ///
    /// Returns `None` for non-hex addresses or addresses wider than 32 bytes.
    pub fn to_bytes32(&self) -> Option<String> {
        let body = strip_hex_prefix(&self.0)?;
        // Strip leading zeros so differently padded values collapse together.
        let significant = body.trim_start_matches('0');
        let width = Self::BYTES32 * 2;
        if significant.len() > width {
            return None;
        }
        Some(format!("0x{:0>width$}", significant, width = width))
    }

    /// Decode a hex address into raw bytes.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let body = strip_hex_prefix(&self.0)?;
        if body.len() % 2 == 1 {
            hex::decode(format!("0{}", body)).ok()
        } else {
            hex::decode(body).ok()
        }
    }

    /// Compare two addresses using their 32-byte padded form when both are hex.
    ///
    /// Peers are stored on chain as 32-byte values while declared addresses
    /// use the native width of the remote chain.
    pub fn same_as_bytes32(&self, other: &Address) -> bool {
        match (self.to_bytes32(), other.to_bytes32()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Address::new(value)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Address::new(raw))
    }
}

//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoint identifier.
///
/// Identifies one network at one deployment stage. The numeric ranges follow
/// the messaging protocol's numbering scheme: every block of 30000 ids holds
/// one protocol version, and inside a block each 10000 ids is one stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EndpointId(pub u32);

impl EndpointId {
    /// First endpoint id of the second protocol version.
    pub const V2_OFFSET: u32 = 30_000;

    /// Number of ids reserved for each stage.
    const STAGE_WIDTH: u32 = 10_000;

    /// Get the raw value.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Deployment stage this endpoint belongs to.
    pub fn stage(&self) -> Stage {
        Stage::from_index((self.0 % Self::V2_OFFSET) / Self::STAGE_WIDTH)
    }

    /// Protocol version this endpoint belongs to.
    pub fn version(&self) -> EndpointVersion {
        if self.0 < Self::V2_OFFSET {
            EndpointVersion::V1
        } else {
            EndpointVersion::V2
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({})", self.0)
    }
}

impl From<u32> for EndpointId {
    fn from(value: u32) -> Self {
        EndpointId(value)
    }
}

/// Deployment stage (tier) of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Production networks.
    Mainnet,
    /// Public test networks.
    Testnet,
    /// Local or ephemeral networks.
    Sandbox,
}

impl Stage {
    /// `index` is always below 3: ids wrap every 30 000.
    fn from_index(index: u32) -> Self {
        match index {
            0 => Stage::Mainnet,
            1 => Stage::Testnet,
            _ => Stage::Sandbox,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Mainnet => write!(f, "mainnet"),
            Stage::Testnet => write!(f, "testnet"),
            Stage::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Protocol version an endpoint id was allocated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointVersion {
    V1,
    V2,
}

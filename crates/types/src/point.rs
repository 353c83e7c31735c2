//! Coordinate model: points and vectors.
//!
//! A [`OmniPoint`] locates a contract on one endpoint. An [`OmniVector`] is a
//! directed pair of points and describes how the `from` contract relates to
//! the `to` contract. Both are plain values: equality is structural and both
//! have a deterministic string serialization that can key a hash map.

use crate::{Address, EndpointId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contract address at a given endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OmniPoint {
    /// Endpoint the contract is deployed on.
    pub eid: EndpointId,
    /// Contract address.
    pub address: Address,
    /// Optional human readable contract name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OmniPoint {
    /// Create an unnamed point.
    pub fn new(eid: EndpointId, address: impl Into<Address>) -> Self {
        Self {
            eid,
            address: address.into(),
            name: None,
        }
    }

    /// Attach a contract name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Deterministic string key, equal for two points iff they are equal.
    pub fn serialize_key(&self) -> String {
        serialize_point(self)
    }
}

impl fmt::Display for OmniPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[{} ({}) @ {}]", self.address, name, self.eid),
            None => write!(f, "[{} @ {}]", self.address, self.eid),
        }
    }
}

/// A directed connection between two points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OmniVector {
    pub from: OmniPoint,
    pub to: OmniPoint,
}

impl OmniVector {
    /// Create a vector from `from` to `to`.
    pub fn new(from: OmniPoint, to: OmniPoint) -> Self {
        Self { from, to }
    }

    /// The same connection in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// Whether both endpoints share a deployment stage.
    pub fn is_realizable(&self) -> bool {
        is_vector_realizable(self)
    }

    /// Deterministic string key, equal for two vectors iff they are equal.
    pub fn serialize_key(&self) -> String {
        serialize_vector(self)
    }
}

impl fmt::Display for OmniVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Value equality of two points.
pub fn points_equal(a: &OmniPoint, b: &OmniPoint) -> bool {
    a == b
}

/// Value equality of two vectors.
pub fn vectors_equal(a: &OmniVector, b: &OmniVector) -> bool {
    a == b
}

/// Whether a connection between the two endpoints of `vector` can exist.
///
/// Endpoints on different deployment stages can never talk to each other.
pub fn is_vector_realizable(vector: &OmniVector) -> bool {
    vector.from.eid.stage() == vector.to.eid.stage()
}

/// Serialize a point into a map key.
///
/// The key is the JSON encoding of the `(eid, address, name)` tuple. JSON
/// string escaping keeps the encoding injective for arbitrary names and
/// addresses.
pub fn serialize_point(point: &OmniPoint) -> String {
    key_of(&(point.eid.0, point.address.as_str(), point.name.as_deref()))
}

/// Serialize a vector into a map key.
pub fn serialize_vector(vector: &OmniVector) -> String {
    key_of(&(
        (
            vector.from.eid.0,
            vector.from.address.as_str(),
            vector.from.name.as_deref(),
        ),
        (
            vector.to.eid.0,
            vector.to.address.as_str(),
            vector.to.name.as_deref(),
        ),
    ))
}

fn key_of<T: Serialize>(value: &T) -> String {
    // Tuples of integers, strings and options always serialize.
    serde_json::to_string(value).unwrap_or_default()
}

//! Error types for graph construction.

use crate::{OmniPoint, OmniVector, Stage};
use thiserror::Error;

/// Violations of the graph's referential and topological invariants.
///
/// These are configuration errors: graph construction stops at the first
/// one and nothing retries them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityError {
    /// The two endpoints of the vector live on different stages.
    #[error("Cannot add edge {vector}: endpoints are on different stages ({from_stage} and {to_stage})")]
    UnrealizableVector {
        vector: OmniVector,
        from_stage: Stage,
        to_stage: Stage,
    },

    /// No node exists at the vector's `from` point.
    #[error("Cannot add edge {vector}: no node exists at {point}")]
    MissingSourceNode {
        vector: OmniVector,
        point: OmniPoint,
    },
}

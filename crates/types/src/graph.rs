//! Declared topology: nodes, edges and graphs.

use crate::{OmniPoint, OmniVector};
use serde::{Deserialize, Serialize};

/// Configuration attached to a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmniNode<C> {
    pub point: OmniPoint,
    pub config: Option<C>,
}

impl<C> OmniNode<C> {
    pub fn new(point: OmniPoint, config: C) -> Self {
        Self {
            point,
            config: Some(config),
        }
    }

    /// A node without configuration.
    pub fn bare(point: OmniPoint) -> Self {
        Self {
            point,
            config: None,
        }
    }
}

/// Configuration attached to a directed connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmniEdge<C> {
    pub vector: OmniVector,
    pub config: Option<C>,
}

impl<C> OmniEdge<C> {
    pub fn new(vector: OmniVector, config: C) -> Self {
        Self {
            vector,
            config: Some(config),
        }
    }

    /// An edge without configuration.
    pub fn bare(vector: OmniVector) -> Self {
        Self {
            vector,
            config: None,
        }
    }
}

/// A snapshot of the declared topology.
///
/// The bare structure does not enforce referential integrity; graphs meant
/// for configurators should be produced by [`crate::OmniGraphBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmniGraph<N, E> {
    #[serde(default, alias = "contracts")]
    pub nodes: Vec<OmniNode<N>>,
    #[serde(default, alias = "connections")]
    pub edges: Vec<OmniEdge<E>>,
}

impl<N, E> OmniGraph<N, E> {
    /// Create an empty graph.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl<N, E> Default for OmniGraph<N, E> {
    fn default() -> Self {
        Self::empty()
    }
}

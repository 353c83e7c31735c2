//! Incremental, validating graph construction.

use crate::{
    is_vector_realizable, GraphIntegrityError, OmniEdge, OmniGraph, OmniNode, OmniPoint,
    OmniVector, PointMap, VectorMap,
};

/// Builds an [`OmniGraph`] while enforcing its invariants.
///
/// - Nodes are unique by point; adding a node at an existing point replaces it.
/// - An edge can only be added when its vector is realizable and a node
///   already exists at its `from` point.
/// - Removing a node removes every edge that starts or ends at it.
///
/// Mutating methods return `&mut Self` so calls can be chained.
#[derive(Debug, Clone)]
pub struct OmniGraphBuilder<N, E> {
    nodes: PointMap<OmniNode<N>>,
    edges: VectorMap<OmniEdge<E>>,
}

impl<N, E> OmniGraphBuilder<N, E> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            nodes: PointMap::new(),
            edges: VectorMap::new(),
        }
    }

    /// Create a builder from an existing graph, validating every edge.
    pub fn from_graph(graph: OmniGraph<N, E>) -> Result<Self, GraphIntegrityError> {
        let mut builder = Self::new();
        builder.add_nodes(graph.nodes);
        builder.add_edges(graph.edges)?;
        Ok(builder)
    }

    /// Insert or replace nodes. Later nodes win over earlier ones.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = OmniNode<N>>) -> &mut Self {
        for node in nodes {
            self.nodes.insert(node.point.clone(), node);
        }
        self
    }

    /// Insert or replace edges.
    ///
    /// Every edge is checked before any is stored: if one edge violates an
    /// invariant the builder is left untouched and the first violation is
    /// returned.
    pub fn add_edges(
        &mut self,
        edges: impl IntoIterator<Item = OmniEdge<E>>,
    ) -> Result<&mut Self, GraphIntegrityError> {
        let edges: Vec<_> = edges.into_iter().collect();
        for edge in &edges {
            self.assert_can_add_edge(&edge.vector)?;
        }
        for edge in edges {
            self.edges.insert(edge.vector.clone(), edge);
        }
        Ok(self)
    }

    /// Remove the node at `point` along with every edge touching it.
    pub fn remove_node_at(&mut self, point: &OmniPoint) -> &mut Self {
        self.nodes.remove(point);
        self.edges
            .retain(|vector, _| &vector.from != point && &vector.to != point);
        self
    }

    /// Remove a single edge.
    pub fn remove_edge_at(&mut self, vector: &OmniVector) -> &mut Self {
        self.edges.remove(vector);
        self
    }

    pub fn get_node_at(&self, point: &OmniPoint) -> Option<&OmniNode<N>> {
        self.nodes.get(point)
    }

    pub fn get_edge_at(&self, vector: &OmniVector) -> Option<&OmniEdge<E>> {
        self.edges.get(vector)
    }

    /// Edges starting at `point`, in insertion order.
    pub fn get_edges_from(&self, point: &OmniPoint) -> Vec<&OmniEdge<E>> {
        self.edges
            .values()
            .filter(|edge| &edge.vector.from == point)
            .collect()
    }

    /// Edges ending at `point`, in insertion order.
    pub fn get_edges_to(&self, point: &OmniPoint) -> Vec<&OmniEdge<E>> {
        self.edges
            .values()
            .filter(|edge| &edge.vector.to == point)
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &OmniNode<N>> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &OmniEdge<E>> {
        self.edges.values()
    }

    /// Consume the builder and produce the graph.
    pub fn into_graph(self) -> OmniGraph<N, E> {
        OmniGraph {
            nodes: self.nodes.into_values().collect(),
            edges: self.edges.into_values().collect(),
        }
    }

    fn assert_can_add_edge(&self, vector: &OmniVector) -> Result<(), GraphIntegrityError> {
        if !is_vector_realizable(vector) {
            return Err(GraphIntegrityError::UnrealizableVector {
                vector: vector.clone(),
                from_stage: vector.from.eid.stage(),
                to_stage: vector.to.eid.stage(),
            });
        }
        if !self.nodes.contains(&vector.from) {
            return Err(GraphIntegrityError::MissingSourceNode {
                vector: vector.clone(),
                point: vector.from.clone(),
            });
        }
        Ok(())
    }
}

impl<N: Clone, E: Clone> OmniGraphBuilder<N, E> {
    /// Read-only projection of the current state.
    pub fn graph(&self) -> OmniGraph<N, E> {
        OmniGraph {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }
}

impl<N, E> Default for OmniGraphBuilder<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EndpointId;

    fn point(eid: u32, address: &str) -> OmniPoint {
        OmniPoint::new(EndpointId(eid), address)
    }

    fn node(point: &OmniPoint, config: u32) -> OmniNode<u32> {
        OmniNode::new(point.clone(), config)
    }

    fn edge(from: &OmniPoint, to: &OmniPoint) -> OmniEdge<&'static str> {
        OmniEdge::bare(OmniVector::new(from.clone(), to.clone()))
    }

    #[test]
    fn test_add_nodes_last_write_wins() {
        let a = point(30_101, "0xa");
        let mut builder = OmniGraphBuilder::<u32, ()>::new();
        builder.add_nodes([node(&a, 1), node(&a, 2)]);

        assert_eq!(builder.graph().nodes.len(), 1);
        assert_eq!(builder.get_node_at(&a).unwrap().config, Some(2));
    }

    #[test]
    fn test_add_edge_requires_source_node() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&b, 0)]);

        let err = builder.add_edges([edge(&a, &b)]).unwrap_err();
        assert_eq!(
            err,
            GraphIntegrityError::MissingSourceNode {
                vector: OmniVector::new(a.clone(), b.clone()),
                point: a,
            }
        );
        assert!(builder.graph().edges.is_empty());
    }

    #[test]
    fn test_add_edges_is_all_or_nothing() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let c = point(30_111, "0xc");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&a, 0), node(&b, 0)]);

        // The second edge starts at a point without a node.
        let result = builder.add_edges([edge(&a, &b), edge(&c, &a)]);
        assert!(result.is_err());
        assert!(builder.get_edge_at(&OmniVector::new(a, b)).is_none());
    }

    #[test]
    fn test_add_edge_rejects_unrealizable_vector() {
        let mainnet = point(30_101, "0xa");
        let testnet = point(40_161, "0xb");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&mainnet, 0), node(&testnet, 0)]);

        let err = builder.add_edges([edge(&mainnet, &testnet)]).unwrap_err();
        assert!(matches!(
            err,
            GraphIntegrityError::UnrealizableVector { .. }
        ));
        assert!(err.to_string().contains("mainnet"));
        assert!(err.to_string().contains("testnet"));
    }

    #[test]
    fn test_edge_target_node_is_optional() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&a, 0)]);

        assert!(builder.add_edges([edge(&a, &b)]).is_ok());
        assert_eq!(builder.get_edges_to(&b).len(), 1);
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let c = point(30_111, "0xc");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&a, 0), node(&b, 0), node(&c, 0)]);
        builder
            .add_edges([
                edge(&a, &b),
                edge(&b, &a),
                edge(&b, &c),
                edge(&c, &b),
                edge(&a, &c),
                edge(&c, &a),
            ])
            .unwrap();

        builder.remove_node_at(&a);

        let graph = builder.graph();
        assert_eq!(graph.nodes.len(), 2);
        let remaining: Vec<_> = graph.edges.iter().map(|e| e.vector.clone()).collect();
        assert_eq!(
            remaining,
            vec![
                OmniVector::new(b.clone(), c.clone()),
                OmniVector::new(c.clone(), b.clone()),
            ]
        );
    }

    #[test]
    fn test_remove_edge_does_not_cascade() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&a, 0), node(&b, 0)]);
        builder.add_edges([edge(&a, &b), edge(&b, &a)]).unwrap();

        builder.remove_edge_at(&OmniVector::new(a.clone(), b.clone()));

        assert!(builder.get_node_at(&a).is_some());
        assert!(builder.get_node_at(&b).is_some());
        assert!(builder.get_edge_at(&OmniVector::new(b, a)).is_some());
        assert_eq!(builder.graph().edges.len(), 1);
    }

    #[test]
    fn test_edges_from_and_to_keep_insertion_order() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let c = point(30_111, "0xc");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&a, 0), node(&b, 0), node(&c, 0)]);
        builder
            .add_edges([edge(&a, &c), edge(&b, &a), edge(&a, &b), edge(&c, &a)])
            .unwrap();

        let from_a: Vec<_> = builder
            .get_edges_from(&a)
            .into_iter()
            .map(|e| e.vector.to.clone())
            .collect();
        assert_eq!(from_a, vec![c.clone(), b.clone()]);

        let to_a: Vec<_> = builder
            .get_edges_to(&a)
            .into_iter()
            .map(|e| e.vector.from.clone())
            .collect();
        assert_eq!(to_a, vec![b, c]);
    }

    #[test]
    fn test_from_graph_validates() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let graph = OmniGraph {
            nodes: vec![node(&b, 0)],
            edges: vec![edge(&a, &b)],
        };

        assert!(OmniGraphBuilder::from_graph(graph).is_err());
    }

    #[test]
    fn test_into_graph_roundtrip() {
        let a = point(30_101, "0xa");
        let b = point(30_110, "0xb");
        let mut builder = OmniGraphBuilder::<u32, &str>::new();
        builder.add_nodes([node(&a, 1), node(&b, 2)]);
        builder.add_edges([edge(&a, &b)]).unwrap();

        let snapshot = builder.graph();
        assert_eq!(builder.into_graph(), snapshot);
    }
}

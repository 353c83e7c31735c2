//! Test fixtures for omnigraph.
//!
//! Shorthand constructors for the values most tests need. Nothing here is
//! meant for production code.

use omnigraph_types::{
    EndpointId, OmniEdge, OmniGraphBuilder, OmniNode, OmniPoint, OmniTransaction, OmniVector,
};

/// Unnamed point at `eid`.
pub fn point(eid: u32, address: &str) -> OmniPoint {
    OmniPoint::new(EndpointId(eid), address)
}

/// Named point at `eid`.
pub fn named_point(eid: u32, address: &str, name: &str) -> OmniPoint {
    point(eid, address).with_name(name)
}

/// Vector between two points.
pub fn vector(from: &OmniPoint, to: &OmniPoint) -> OmniVector {
    OmniVector::new(from.clone(), to.clone())
}

/// Transaction at `point` whose data and description are both `tag`.
pub fn transaction(point: &OmniPoint, tag: &str) -> OmniTransaction {
    OmniTransaction::new(point.clone(), tag.as_bytes().to_vec(), tag)
}

/// Builder with a config-less node at each of `points` and a config-less
/// edge for every ordered pair of distinct points.
pub fn fully_connected<N, E>(points: &[OmniPoint]) -> OmniGraphBuilder<N, E> {
    let mut builder = OmniGraphBuilder::new();
    builder.add_nodes(points.iter().cloned().map(OmniNode::bare));

    let edges: Vec<_> = points
        .iter()
        .flat_map(|from| {
            points
                .iter()
                .filter(move |to| *to != from)
                .map(move |to| OmniEdge::bare(vector(from, to)))
        })
        .collect();
    if let Err(error) = builder.add_edges(edges).map(|_| ()) {
        panic!("fixture points must share a stage: {}", error);
    }
    builder
}

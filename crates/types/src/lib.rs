//! Core types for omnigraph.
//!
//! This crate holds the value types shared by every other crate:
//!
//! - [`OmniPoint`] / [`OmniVector`]: the coordinate model, with value
//!   equality and injective string serialization
//! - [`OmniGraph`] and [`OmniGraphBuilder`]: the declared topology and its
//!   validating builder
//! - [`OmniTransaction`]: an unsigned, chain-agnostic mutation request
//!
//! Nothing here performs I/O.

mod address;
mod builder;
mod error;
mod graph;
mod identifiers;
mod map;
mod point;
mod transaction;

pub use address::Address;
pub use builder::OmniGraphBuilder;
pub use error::GraphIntegrityError;
pub use graph::{OmniEdge, OmniGraph, OmniNode};
pub use identifiers::{EndpointId, EndpointVersion, Stage};
pub use map::{PointMap, VectorMap};
pub use point::{
    is_vector_realizable, points_equal, serialize_point, serialize_vector, vectors_equal,
    OmniPoint, OmniVector,
};
pub use transaction::{
    flatten_transactions, group_transactions_by_point, OmniTransaction, OmniTransactionReceipt,
    OmniTransactionResponse, OmniTransactionWithError, OmniTransactionWithReceipt,
    TransactionSet,
};

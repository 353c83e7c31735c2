//! Insertion-ordered maps keyed by points and vectors.
//!
//! Keys are stored under their serialized form (see [`serialize_point`] and
//! [`serialize_vector`]) next to the structured key, so lookups use value
//! equality and iteration follows insertion order.

use crate::{serialize_point, serialize_vector, OmniPoint, OmniVector};
use indexmap::IndexMap;

/// Map from [`OmniPoint`] to `V`.
#[derive(Debug, Clone)]
pub struct PointMap<V> {
    entries: IndexMap<String, (OmniPoint, V)>,
}

impl<V> PointMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert a value, returning the previous value for an equal point.
    ///
    /// Replacing keeps the original insertion position.
    pub fn insert(&mut self, point: OmniPoint, value: V) -> Option<V> {
        let key = serialize_point(&point);
        self.entries
            .insert(key, (point, value))
            .map(|(_, previous)| previous)
    }

    pub fn get(&self, point: &OmniPoint) -> Option<&V> {
        self.entries.get(&serialize_point(point)).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, point: &OmniPoint) -> Option<&mut V> {
        self.entries
            .get_mut(&serialize_point(point))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, point: &OmniPoint) -> bool {
        self.entries.contains_key(&serialize_point(point))
    }

    /// Remove a value, preserving the order of the remaining entries.
    pub fn remove(&mut self, point: &OmniPoint) -> Option<V> {
        self.entries
            .shift_remove(&serialize_point(point))
            .map(|(_, v)| v)
    }

    /// Get the value for `point`, inserting one built by `default` if absent.
    pub fn get_or_insert_with(&mut self, point: &OmniPoint, default: impl FnOnce() -> V) -> &mut V {
        let (_, value) = self
            .entries
            .entry(serialize_point(point))
            .or_insert_with(|| (point.clone(), default()));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&OmniPoint, &V)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, v)| v)
    }

    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_values().map(|(_, v)| v)
    }
}

impl<V> Default for PointMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Map from [`OmniVector`] to `V`.
#[derive(Debug, Clone)]
pub struct VectorMap<V> {
    entries: IndexMap<String, (OmniVector, V)>,
}

impl<V> VectorMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert a value, returning the previous value for an equal vector.
    pub fn insert(&mut self, vector: OmniVector, value: V) -> Option<V> {
        let key = serialize_vector(&vector);
        self.entries
            .insert(key, (vector, value))
            .map(|(_, previous)| previous)
    }

    pub fn get(&self, vector: &OmniVector) -> Option<&V> {
        self.entries.get(&serialize_vector(vector)).map(|(_, v)| v)
    }

    pub fn contains(&self, vector: &OmniVector) -> bool {
        self.entries.contains_key(&serialize_vector(vector))
    }

    pub fn remove(&mut self, vector: &OmniVector) -> Option<V> {
        self.entries
            .shift_remove(&serialize_vector(vector))
            .map(|(_, v)| v)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&OmniVector, &V) -> bool) {
        self.entries.retain(|_, (vector, value)| keep(vector, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&OmniVector, &V)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, v)| v)
    }

    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_values().map(|(_, v)| v)
    }
}

impl<V> Default for VectorMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

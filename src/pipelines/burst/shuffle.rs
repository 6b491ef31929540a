//! In-process shuffle.
//!
//! The alignment engine only needs two things from its execution substrate:
//! a way to emit `(key, value)` pairs, and a way to receive every value for
//! one key together. [`Emit`] is the first; [`KeyGroups`] collects emitted
//! pairs and hands back one group per key.
//!
//! Value order inside a group is unspecified; consumers must not depend on it.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Sink for `(key, value)` pairs.
pub trait Emit<K, V> {
    fn emit(&mut self, key: K, value: V);
}

impl<K, V> Emit<K, V> for Vec<(K, V)> {
    #[inline]
    fn emit(&mut self, key: K, value: V) {
        self.push((key, value));
    }
}

/// Values grouped by key.
#[derive(Debug, Clone)]
pub struct KeyGroups<K, V> {
    groups: FxHashMap<K, Vec<V>>,
    values: usize,
}

impl<K: Hash + Eq, V> Default for KeyGroups<K, V> {
    fn default() -> Self {
        Self {
            groups: FxHashMap::default(),
            values: 0,
        }
    }
}

impl<K: Hash + Eq, V> Emit<K, V> for KeyGroups<K, V> {
    #[inline]
    fn emit(&mut self, key: K, value: V) {
        self.groups.entry(key).or_default().push(value);
        self.values += 1;
    }
}

impl<K: Hash + Eq, V> KeyGroups<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold another partial grouping into this one. The larger map is kept
    /// so merging a tree of rayon partials stays cheap.
    pub fn merge(mut self, mut other: Self) -> Self {
        if other.groups.len() > self.groups.len() {
            std::mem::swap(&mut self, &mut other);
        }
        for (key, mut values) in other.groups {
            self.groups.entry(key).or_default().append(&mut values);
        }
        self.values += other.values;
        self
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of values across all keys.
    pub fn num_values(&self) -> usize {
        self.values
    }

    /// All groups, ordered by key so downstream output is reproducible.
    pub fn into_sorted_groups(self) -> Vec<(K, Vec<V>)>
    where
        K: Ord,
    {
        let mut groups: Vec<_> = self.groups.into_iter().collect();
        groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_and_merge() {
        let mut left = KeyGroups::new();
        left.emit("b", 1);
        left.emit("a", 2);
        left.emit("b", 3);

        let mut right = KeyGroups::new();
        right.emit("a", 4);
        right.emit("c", 5);

        let merged = left.merge(right);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.num_values(), 5);

        let groups: Vec<_> = merged
            .into_sorted_groups()
            .into_iter()
            .map(|(k, mut values)| {
                values.sort();
                (k, values)
            })
            .collect();
        assert_eq!(groups, vec![("a", vec![2, 4]), ("b", vec![1, 3]), ("c", vec![5])]);
    }

    #[test]
    fn test_vec_sink() {
        let mut out: Vec<(u32, &str)> = Vec::new();
        out.emit(2, "x");
        out.emit(1, "y");
        assert_eq!(out, vec![(2, "x"), (1, "y")]);
    }
}

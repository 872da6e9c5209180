/*
 * orderedmap.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Insertion-ordered map used for every document-keyed collection.
 */

//! An insertion-ordered associative container.
//!
//! [`OrderedMap`] is the container for every "keys are document field
//! names" relationship. Iteration yields entries in insertion order,
//! overwriting a key keeps its position, and deleting a key keeps the
//! relative order of the remaining entries.

use std::borrow::Borrow;
use std::hash::Hash;

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K: Hash + Eq, V> {
    inner: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite.
    ///
    /// A new key is appended at the end; an existing key keeps its
    /// position and has its value replaced. Returns the previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.inner.get(key)
    }

    /// Look up the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.inner.get_key_value(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.inner.contains_key(key)
    }

    /// Remove `key`, keeping the relative order of the remaining entries.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.inner.shift_remove_entry(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// First entry in insertion order.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.inner.first()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    /// Find the first entry whose key satisfies `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&K) -> bool) -> Option<(&K, &V)> {
        self.inner.iter().find(|(k, _)| predicate(k))
    }
}

impl<'m, K: Hash + Eq, V> IntoIterator for &'m OrderedMap<K, V> {
    type Item = (&'m K, &'m V);
    type IntoIter = Iter<'m, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K: Hash + Eq, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

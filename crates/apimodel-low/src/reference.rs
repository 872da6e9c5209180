/*
 * reference.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Position-tracked value carriers.
 */

//! Decoded values paired with the nodes they came from.
//!
//! Provenance is composed into every field rather than inherited: a
//! [`KeyReference`] is a decoded key plus its key node, a [`ValueReference`]
//! a decoded value plus its value node, and a [`NodeReference`] carries
//! both. Equality and hashing of [`KeyReference`] use the decoded value
//! only, so keys from different documents compare equal when their text
//! does.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use apimodel_yaml::Node;

/// A decoded key and the node it was decoded from.
#[derive(Debug, Clone, Copy)]
pub struct KeyReference<'a, T> {
    pub value: T,
    pub key_node: &'a Node,
}

impl<'a, T> KeyReference<'a, T> {
    pub fn new(value: T, key_node: &'a Node) -> Self {
        Self { value, key_node }
    }
}

impl<'a> KeyReference<'a, String> {
    /// Decode a string key from its node.
    pub fn from_node(key_node: &'a Node) -> Self {
        Self::new(key_node.value.clone(), key_node)
    }
}

impl<T: PartialEq> PartialEq for KeyReference<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for KeyReference<'_, T> {}

impl<T: Hash> Hash for KeyReference<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

// Lets maps keyed by KeyReference<String> be queried with a plain &str.
impl Borrow<str> for KeyReference<'_, String> {
    fn borrow(&self) -> &str {
        &self.value
    }
}

/// A decoded value and the node it was decoded from.
#[derive(Debug, Clone)]
pub struct ValueReference<'a, T> {
    pub value: T,
    pub value_node: &'a Node,
}

impl<'a, T> ValueReference<'a, T> {
    pub fn new(value: T, value_node: &'a Node) -> Self {
        Self { value, value_node }
    }
}

/// A decoded value with both its key node and its value node.
#[derive(Debug, Clone)]
pub struct NodeReference<'a, T> {
    pub value: T,
    pub key_node: &'a Node,
    pub value_node: &'a Node,
}

impl<'a, T> NodeReference<'a, T> {
    pub fn new(value: T, key_node: &'a Node, value_node: &'a Node) -> Self {
        Self {
            value,
            key_node,
            value_node,
        }
    }

    /// Rebuild a node reference from a map entry.
    pub fn from_entry(key: &KeyReference<'a, String>, value: ValueReference<'a, T>) -> Self {
        Self::new(value.value, key.key_node, value.value_node)
    }
}

/// Where a built object itself came from.
///
/// Distinct from the references an object keeps for its children: this
/// records the object's own key and value nodes, and, when it was reached
/// through a reference, the reference text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reference<'a> {
    pub key_node: Option<&'a Node>,
    pub value_node: Option<&'a Node>,

    /// The `$ref` text this object was resolved through.
    pub reference: Option<&'a str>,

    /// Set when the reference closes a cycle that the index tolerated.
    pub circular: bool,
}

impl<'a> Reference<'a> {
    pub fn new(key_node: Option<&'a Node>, value_node: &'a Node) -> Self {
        Self {
            key_node,
            value_node: Some(value_node),
            reference: None,
            circular: false,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

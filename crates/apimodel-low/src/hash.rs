/*
 * hash.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Structural hashing for change detection.
 *
 * Digests cover decoded content only:
 * - source positions and node identity never contribute
 * - map entries are sorted before folding, so container order does not
 *   matter
 */

use std::fmt;

use serde_json::Value;
use sha2::{Digest as _, Sha256};

use crate::extensions::Extensions;
use crate::orderedmap::OrderedMap;
use crate::reference::{KeyReference, ValueReference};

/// Separator between the rendered parts of a digest input.
pub const PART_SEPARATOR: &str = "|";

/// A 256-bit content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest([u8; 32]);

impl Digest {
    /// SHA-256 of `bytes`.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(bytes.as_ref()).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<Digest> for [u8; 32] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Objects with a structural digest.
///
/// `hash` must be a pure function of decoded content.
pub trait Hashable {
    fn hash(&self) -> Digest;
}

/// Hex digest of an object.
pub fn hash_to_string<T: Hashable + ?Sized>(value: &T) -> String {
    value.hash().to_hex()
}

/// Digest of an opaque value, through its compact JSON rendering.
///
/// Object keys render sorted, so equal values hash equally regardless of
/// the key order they were written in.
pub fn hash_value(value: &Value) -> Digest {
    Digest::of(value.to_string())
}

/// `key-hexhash` for every child, sorted.
pub fn child_parts<V: Hashable>(
    children: &OrderedMap<KeyReference<'_, String>, ValueReference<'_, V>>,
) -> Vec<String> {
    let mut parts: Vec<String> = children
        .iter()
        .map(|(key, value)| format!("{}-{}", key.value, hash_to_string(&value.value)))
        .collect();
    parts.sort();
    parts
}

/// `key-hexhash` for every extension, sorted.
pub fn extension_parts(extensions: &Extensions<'_>) -> Vec<String> {
    let mut parts: Vec<String> = extensions
        .iter()
        .map(|(key, value)| format!("{}-{}", key.value, hash_value(&value.value).to_hex()))
        .collect();
    parts.sort();
    parts
}

/// Hash the joined parts.
pub fn digest_parts(parts: &[String]) -> Digest {
    Digest::of(parts.join(PART_SEPARATOR))
}

/// Accumulates the parts of a structural digest.
///
/// ```
/// use apimodel_low::hash::HashParts;
///
/// let a = HashParts::new().field("summary", Some("pets")).finish();
/// let b = HashParts::new().field("summary", Some("pets")).finish();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Default, Clone)]
pub struct HashParts {
    parts: Vec<String>,
}

impl HashParts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name-value` when the field is set.
    pub fn field(mut self, name: &str, value: Option<impl fmt::Display>) -> Self {
        if let Some(value) = value {
            self.parts.push(format!("{}-{}", name, value));
        }
        self
    }

    /// Add `name-hexhash` of a nested object when it is present.
    pub fn object<T: Hashable>(mut self, name: &str, value: Option<&T>) -> Self {
        if let Some(value) = value {
            self.parts.push(format!("{}-{}", name, hash_to_string(value)));
        }
        self
    }

    /// Add `name-hexhash` of an opaque value when it is present.
    pub fn value(mut self, name: &str, value: Option<&Value>) -> Self {
        if let Some(value) = value {
            self.parts
                .push(format!("{}-{}", name, hash_value(value).to_hex()));
        }
        self
    }

    /// Add the sorted child block of a keyed collection.
    pub fn children<V: Hashable>(
        mut self,
        children: &OrderedMap<KeyReference<'_, String>, ValueReference<'_, V>>,
    ) -> Self {
        self.parts.extend(child_parts(children));
        self
    }

    /// Add the bare hash of a bundled entry when it is present.
    pub fn bundled<T: Hashable>(mut self, value: Option<&T>) -> Self {
        if let Some(value) = value {
            self.parts.push(hash_to_string(value));
        }
        self
    }

    /// Add the sorted extension block.
    pub fn extensions(mut self, extensions: &Extensions<'_>) -> Self {
        self.parts.extend(extension_parts(extensions));
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn finish(self) -> Digest {
        digest_parts(&self.parts)
    }
}

/*
 * extensions.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Vendor-extension extraction.
 */

//! Vendor extensions (`x-` keys).
//!
//! [`extract_extensions`] lifts every `x-` key of a mapping into an
//! [`Extensions`] map, leaving the node untouched for field-by-field
//! extraction. Extension values are decoded into opaque
//! [`serde_json::Value`]s.

use apimodel_yaml::{Node, to_json_value};
use serde_json::Value;

use crate::orderedmap::OrderedMap;
use crate::reference::{KeyReference, ValueReference};

/// Reserved prefix of vendor-extension keys.
pub const EXTENSION_PREFIX: &str = "x-";

/// Vendor extensions of an object, in document order.
pub type Extensions<'a> = OrderedMap<KeyReference<'a, String>, ValueReference<'a, Value>>;

/// True if `key` is an extension key (case-sensitive).
pub fn is_extension_key(key: &str) -> bool {
    key.starts_with(EXTENSION_PREFIX)
}

/// True if `key` starts with the extension prefix in any letter case.
///
/// Translation pipelines skip keys with this looser test.
pub fn has_extension_prefix_ignore_case(key: &str) -> bool {
    key.get(..EXTENSION_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(EXTENSION_PREFIX))
}

/// Collect every extension entry of a mapping node.
///
/// Aliases on the root are followed and merge keys expanded. Anything
/// other than a mapping has no extensions.
pub fn extract_extensions(root: &Node) -> Extensions<'_> {
    let root = root.resolve_alias();
    root.merged_pairs()
        .into_iter()
        .filter(|(key, _)| is_extension_key(&key.value))
        .map(|(key, value)| {
            (
                KeyReference::from_node(key),
                ValueReference::new(to_json_value(value), value),
            )
        })
        .collect()
}

/// Look up an extension by name.
pub fn find_extension<'e, 'a>(
    name: &str,
    extensions: &'e Extensions<'a>,
) -> Option<&'e ValueReference<'a, Value>> {
    extensions.get(name)
}

/// Objects that carry vendor extensions.
pub trait HasExtensions<'a> {
    fn extensions(&self) -> &Extensions<'a>;

    fn find_extension(&self, name: &str) -> Option<&ValueReference<'a, Value>> {
        find_extension(name, self.extensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apimodel_yaml::parse;
    use serde_json::json;

    #[test]
    fn test_extract_only_extension_keys() {
        let root = parse("a: 1\nx-foo: 2\nb: 3\nx-bar: {k: v}").unwrap();
        let ext = extract_extensions(&root);
        let keys: Vec<&str> = ext.keys().map(|k| k.value.as_str()).collect();
        assert_eq!(keys, vec!["x-foo", "x-bar"]);
        assert_eq!(ext.get("x-foo").unwrap().value, json!(2));
        assert_eq!(ext.get("x-bar").unwrap().value, json!({"k": "v"}));
    }

    #[test]
    fn test_extraction_is_case_sensitive() {
        let root = parse("X-Upper: 1\nx-lower: 2").unwrap();
        let ext = extract_extensions(&root);
        assert_eq!(ext.len(), 1);
        assert!(find_extension("x-lower", &ext).is_some());
        assert!(find_extension("X-Upper", &ext).is_none());
    }

    #[test]
    fn test_input_node_untouched() {
        let root = parse("a: 1\nx-foo: 2").unwrap();
        let before = root.clone();
        let _ = extract_extensions(&root);
        assert_eq!(root, before);
    }

    #[test]
    fn test_non_mapping_has_no_extensions() {
        let root = parse("[x-a, x-b]").unwrap();
        assert!(extract_extensions(&root).is_empty());
    }

    #[test]
    fn test_extension_value_keeps_its_node() {
        let root = parse("x-foo: hello").unwrap();
        let ext = extract_extensions(&root);
        let (key, value) = ext.first().unwrap();
        assert_eq!(key.key_node.value, "x-foo");
        assert_eq!(value.value_node.value, "hello");
    }

    #[test]
    fn test_prefix_ignore_case() {
        assert!(has_extension_prefix_ignore_case("X-Foo"));
        assert!(has_extension_prefix_ignore_case("x-foo"));
        assert!(!has_extension_prefix_ignore_case("x"));
        assert!(!has_extension_prefix_ignore_case("/x-foo"));
        assert!(!has_extension_prefix_ignore_case("é"));
    }
}

/*
 * path_item.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A single path item and its operations.
 */

use apimodel_yaml::{Node, NodeKind};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::extensions::{Extensions, HasExtensions, extract_extensions};
use crate::hash::{Digest, HashParts, Hashable};
use crate::index::ReferenceIndex;
use crate::low::{Buildable, apply_failure_policy, build_child, extract_string};
use crate::model::Operation;
use crate::orderedmap::OrderedMap;
use crate::reference::{KeyReference, NodeReference, Reference, ValueReference};

/// Keys of a path item that hold operations.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Default)]
pub struct PathItem<'a> {
    pub summary: Option<NodeReference<'a, String>>,
    pub description: Option<NodeReference<'a, String>>,

    /// Operations keyed by HTTP method, in document order.
    pub operations: OrderedMap<KeyReference<'a, String>, ValueReference<'a, Operation<'a>>>,

    pub extensions: Extensions<'a>,
    pub reference: Reference<'a>,
}

impl<'a> PathItem<'a> {
    pub fn find_operation(&self, method: &str) -> Option<&ValueReference<'a, Operation<'a>>> {
        self.operations.get(method)
    }

    pub fn find_by_key(&self, key: &str) -> Option<&ValueReference<'a, Operation<'a>>> {
        self.find_operation(key)
    }
}

impl<'a> Buildable<'a> for PathItem<'a> {
    const OBJECT: &'static str = "path item";

    fn build(
        &mut self,
        cx: &BuildContext,
        key: Option<&'a Node>,
        root: &'a Node,
        idx: &dyn ReferenceIndex<'a>,
    ) -> Result<()> {
        cx.check_cancelled()?;
        let root = root.resolve_alias();
        if !root.is_mapping() {
            return Err(BuildError::malformed_root(
                Self::OBJECT,
                NodeKind::Mapping,
                root,
            ));
        }

        self.reference = Reference::new(key, root);
        self.extensions = extract_extensions(root);
        self.summary = extract_string("summary", root);
        self.description = extract_string("description", root);

        for (method, value) in root.merged_pairs() {
            if !HTTP_METHODS.contains(&method.value.as_str()) {
                continue;
            }
            match build_child::<Operation>(cx, Self::OBJECT, method, value, idx) {
                Ok(operation) => {
                    self.operations
                        .set(KeyReference::from_node(method), operation);
                }
                Err(err) => apply_failure_policy(cx, idx, Self::OBJECT, err)?,
            }
        }
        Ok(())
    }

    fn reference(&self) -> &Reference<'a> {
        &self.reference
    }

    fn reference_mut(&mut self) -> &mut Reference<'a> {
        &mut self.reference
    }
}

impl<'a> HasExtensions<'a> for PathItem<'a> {
    fn extensions(&self) -> &Extensions<'a> {
        &self.extensions
    }
}

impl Hashable for PathItem<'_> {
    fn hash(&self) -> Digest {
        HashParts::new()
            .field("summary", self.summary.as_ref().map(|s| &s.value))
            .field("description", self.description.as_ref().map(|d| &d.value))
            .children(&self.operations)
            .extensions(&self.extensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SpecIndex;
    use apimodel_yaml::parse;

    #[test]
    fn test_operations_in_document_order() {
        let root = parse(
            "post: {operationId: create}\nsummary: s\nget: {operationId: list}\nparameters: []\n",
        )
        .unwrap();
        let idx = SpecIndex::new(&root);
        let mut item = PathItem::default();
        item.build(&BuildContext::new(), None, &root, &idx).unwrap();

        let methods: Vec<&str> = item.operations.keys().map(|k| k.value.as_str()).collect();
        assert_eq!(methods, vec!["post", "get"]);
        assert_eq!(
            item.find_operation("get").unwrap().value.operation_id.as_ref().unwrap().value,
            "list"
        );
        assert!(item.find_by_key("parameters").is_none());
    }

    #[test]
    fn test_operation_reference_is_resolved() {
        let root = parse(
            r#"
item:
  get:
    $ref: '#/shared/op'
shared:
  op:
    operationId: shared
"#,
        )
        .unwrap();
        let idx = SpecIndex::new(&root);
        let mut item = PathItem::default();
        item.build(&BuildContext::new(), None, root.get("item").unwrap(), &idx)
            .unwrap();

        let get = item.find_operation("get").unwrap();
        assert_eq!(get.value.operation_id.as_ref().unwrap().value, "shared");
        assert_eq!(get.value.reference.reference, Some("#/shared/op"));
    }

    #[test]
    fn test_hash_distinguishes_summary() {
        let a = parse("summary: a").unwrap();
        let b = parse("summary: b").unwrap();
        let (idx_a, idx_b) = (SpecIndex::new(&a), SpecIndex::new(&b));
        let mut item_a = PathItem::default();
        let mut item_b = PathItem::default();
        item_a.build(&BuildContext::new(), None, &a, &idx_a).unwrap();
        item_b.build(&BuildContext::new(), None, &b, &idx_b).unwrap();
        assert_ne!(item_a.hash(), item_b.hash());
    }
}

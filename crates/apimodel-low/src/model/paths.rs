/*
 * paths.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The paths collection.
 */

use apimodel_yaml::{Node, NodeKind};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::extensions::{Extensions, HasExtensions, extract_extensions};
use crate::hash::{Digest, HashParts, Hashable};
use crate::index::ReferenceIndex;
use crate::low::{Buildable, apply_failure_policy, build_child};
use crate::model::PathItem;
use crate::orderedmap::OrderedMap;
use crate::pipeline::translate_mapping;
use crate::reference::{KeyReference, Reference, ValueReference};

/// Every path template of a document mapped to its path item.
///
/// Path items are built concurrently through the translation pipeline, so
/// `path_items` follows completion order unless the build was configured to
/// preserve document order.
#[derive(Debug, Default)]
pub struct Paths<'a> {
    pub path_items: OrderedMap<KeyReference<'a, String>, ValueReference<'a, PathItem<'a>>>,
    pub extensions: Extensions<'a>,
    pub reference: Reference<'a>,
}

impl<'a> Paths<'a> {
    /// Look up a path item by its path template.
    pub fn find_path(&self, path: &str) -> Option<&ValueReference<'a, PathItem<'a>>> {
        self.path_items.get(path)
    }

    /// Look up a path item, returning its key as well.
    pub fn find_path_and_key(
        &self,
        path: &str,
    ) -> Option<(&KeyReference<'a, String>, &ValueReference<'a, PathItem<'a>>)> {
        self.path_items.get_key_value(path)
    }

    pub fn find_by_key(&self, key: &str) -> Option<&ValueReference<'a, PathItem<'a>>> {
        self.find_path(key)
    }
}

impl<'a> Buildable<'a> for Paths<'a> {
    const OBJECT: &'static str = "paths";

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
        self.path_items = translate_mapping(cx, root, |cx, key, value| {
            match build_child::<PathItem>(cx, Self::OBJECT, key, value, idx) {
                Ok(item) => Ok(Some((KeyReference::from_node(key), item))),
                Err(err) => apply_failure_policy(cx, idx, Self::OBJECT, err).map(|()| None),
            }
        })?;

        tracing::debug!(
            paths = self.path_items.len(),
            extensions = self.extensions.len(),
            "built paths"
        );
        Ok(())
    }

    fn reference(&self) -> &Reference<'a> {
        &self.reference
    }

    fn reference_mut(&mut self) -> &mut Reference<'a> {
        &mut self.reference
    }
}

impl<'a> HasExtensions<'a> for Paths<'a> {
    fn extensions(&self) -> &Extensions<'a> {
        &self.extensions
    }
}

impl Hashable for Paths<'_> {
    fn hash(&self) -> Digest {
        HashParts::new()
            .children(&self.path_items)
            .extensions(&self.extensions)
            .finish()
    }
}

/*
 * response.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A single response.
 */

use apimodel_yaml::{Node, NodeKind, to_json_value};
use serde_json::Value;

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::extensions::{Extensions, HasExtensions, extract_extensions};
use crate::hash::{Digest, HashParts, Hashable};
use crate::index::ReferenceIndex;
use crate::low::{Buildable, extract_string, find_key_value};
use crate::reference::{NodeReference, Reference, ValueReference};

/// A response. The schema is kept as an opaque value.
#[derive(Debug, Default)]
pub struct Response<'a> {
    pub description: Option<NodeReference<'a, String>>,
    pub schema: Option<ValueReference<'a, Value>>,
    pub extensions: Extensions<'a>,
    pub reference: Reference<'a>,
}

impl<'a> Buildable<'a> for Response<'a> {
    const OBJECT: &'static str = "response";

    fn build(
        &mut self,
        cx: &BuildContext,
        key: Option<&'a Node>,
        root: &'a Node,
        _idx: &dyn ReferenceIndex<'a>,
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
        self.description = extract_string("description", root);
        self.schema = find_key_value("schema", root)
            .map(|(_, schema)| ValueReference::new(to_json_value(schema), schema));
        Ok(())
    }

    fn reference(&self) -> &Reference<'a> {
        &self.reference
    }

    fn reference_mut(&mut self) -> &mut Reference<'a> {
        &mut self.reference
    }
}

impl<'a> HasExtensions<'a> for Response<'a> {
    fn extensions(&self) -> &Extensions<'a> {
        &self.extensions
    }
}

impl Hashable for Response<'_> {
    fn hash(&self) -> Digest {
        HashParts::new()
            .field("description", self.description.as_ref().map(|d| &d.value))
            .value("schema", self.schema.as_ref().map(|s| &s.value))
            .extensions(&self.extensions)
            .finish()
    }
}

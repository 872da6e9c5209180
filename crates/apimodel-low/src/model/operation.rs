/*
 * operation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A single API operation.
 */

use apimodel_yaml::{Node, NodeKind};
use serde_json::Value;

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::extensions::{Extensions, HasExtensions, extract_extensions};
use crate::hash::{Digest, HashParts, Hashable};
use crate::index::ReferenceIndex;
use crate::low::{Buildable, extract_bool, extract_object, extract_string, extract_string_list};
use crate::model::Responses;
use crate::reference::{NodeReference, Reference, ValueReference};

#[derive(Debug, Default)]
pub struct Operation<'a> {
    pub operation_id: Option<NodeReference<'a, String>>,
    pub summary: Option<NodeReference<'a, String>>,
    pub description: Option<NodeReference<'a, String>>,
    pub deprecated: Option<NodeReference<'a, bool>>,
    pub tags: Option<NodeReference<'a, Vec<ValueReference<'a, String>>>>,
    pub responses: Option<NodeReference<'a, Responses<'a>>>,
    pub extensions: Extensions<'a>,
    pub reference: Reference<'a>,
}

impl<'a> Operation<'a> {
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.as_ref().is_some_and(|d| d.value)
    }

    /// Tag names in document order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags
            .as_ref()
            .map(|tags| tags.value.iter().map(|t| t.value.as_str()).collect())
            .unwrap_or_default()
    }
}

impl<'a> Buildable<'a> for Operation<'a> {
    const OBJECT: &'static str = "operation";

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
        self.operation_id = extract_string("operationId", root);
        self.summary = extract_string("summary", root);
        self.description = extract_string("description", root);
        self.deprecated = extract_bool("deprecated", root);
        self.tags = extract_string_list("tags", root);
        self.responses = extract_object(cx, Self::OBJECT, "responses", root, idx)?;
        Ok(())
    }

    fn reference(&self) -> &Reference<'a> {
        &self.reference
    }

    fn reference_mut(&mut self) -> &mut Reference<'a> {
        &mut self.reference
    }
}

impl<'a> HasExtensions<'a> for Operation<'a> {
    fn extensions(&self) -> &Extensions<'a> {
        &self.extensions
    }
}

impl Hashable for Operation<'_> {
    fn hash(&self) -> Digest {
        let tags = self.tags.as_ref().map(|_| {
            Value::Array(
                self.tag_names()
                    .into_iter()
                    .map(|t| Value::String(t.to_string()))
                    .collect(),
            )
        });
        HashParts::new()
            .field("operationId", self.operation_id.as_ref().map(|v| &v.value))
            .field("summary", self.summary.as_ref().map(|v| &v.value))
            .field("description", self.description.as_ref().map(|v| &v.value))
            .field("deprecated", self.deprecated.as_ref().map(|v| v.value))
            .value("tags", tags.as_ref())
            .object("responses", self.responses.as_ref().map(|r| &r.value))
            .extensions(&self.extensions)
            .finish()
    }
}

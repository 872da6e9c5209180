/*
 * responses.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The response collection of an operation.
 */

use apimodel_yaml::{Node, NodeKind};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::extensions::{Extensions, HasExtensions, extract_extensions};
use crate::hash::{Digest, HashParts, Hashable};
use crate::index::ReferenceIndex;
use crate::low::{Buildable, extract_map_no_lookup};
use crate::model::Response;
use crate::orderedmap::OrderedMap;
use crate::reference::{KeyReference, NodeReference, Reference, ValueReference};

/// Reserved key of the fallback response, matched case-insensitively.
pub const DEFAULT_KEY: &str = "default";

/// Responses keyed by status code, plus the fallback response.
///
/// Entries are decoded sequentially, so `codes` follows document order.
/// The `default` entry is never part of `codes`.
#[derive(Debug, Default)]
pub struct Responses<'a> {
    pub codes: OrderedMap<KeyReference<'a, String>, ValueReference<'a, Response<'a>>>,
    pub default: Option<NodeReference<'a, Response<'a>>>,
    pub extensions: Extensions<'a>,
    pub reference: Reference<'a>,
}

impl<'a> Responses<'a> {
    pub fn find_response_by_code(&self, code: &str) -> Option<&ValueReference<'a, Response<'a>>> {
        self.codes.get(code)
    }

    pub fn find_by_key(&self, key: &str) -> Option<&ValueReference<'a, Response<'a>>> {
        self.find_response_by_code(key)
    }

    pub fn default_response(&self) -> Option<&NodeReference<'a, Response<'a>>> {
        self.default.as_ref()
    }

    pub fn responses(
        &self,
    ) -> &OrderedMap<KeyReference<'a, String>, ValueReference<'a, Response<'a>>> {
        &self.codes
    }
}

impl<'a> Buildable<'a> for Responses<'a> {
    const OBJECT: &'static str = "responses";

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
        self.codes = extract_map_no_lookup(cx, Self::OBJECT, root, idx)?;

        let default_key = self
            .codes
            .find(|k| k.value.eq_ignore_ascii_case(DEFAULT_KEY))
            .map(|(k, _)| k.value.clone());
        if let Some(default_key) = default_key
            && let Some((key, value)) = self.codes.delete(default_key.as_str())
        {
            self.default = Some(NodeReference::from_entry(&key, value));
        }

        tracing::debug!(
            codes = self.codes.len(),
            default = self.default.is_some(),
            "built responses"
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

impl<'a> HasExtensions<'a> for Responses<'a> {
    fn extensions(&self) -> &Extensions<'a> {
        &self.extensions
    }
}

impl Hashable for Responses<'_> {
    fn hash(&self) -> Digest {
        HashParts::new()
            .children(&self.codes)
            .bundled(self.default.as_ref().map(|d| &d.value))
            .extensions(&self.extensions)
            .finish()
    }
}

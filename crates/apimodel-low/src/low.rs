/*
 * low.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Shared building blocks for object builders.
 */

//! Low-level extraction helpers.
//!
//! Every object builder implements [`Buildable`] and assembles itself from
//! the helpers here: scalar extraction ([`extract_string`],
//! [`extract_bool`]), single nested objects ([`extract_object`]), keyed
//! collections decoded in document order ([`extract_map_no_lookup`]), and
//! reference resolution ([`locate_ref_node`]).
//!
//! Child failures are routed through [`apply_failure_policy`] so that both
//! the sequential and the pipeline-driven builders treat them the same way.

use apimodel_yaml::Node;

use crate::context::{BuildContext, FailurePolicy};
use crate::error::{BuildError, Result};
use crate::extensions::is_extension_key;
use crate::index::{ReferenceIndex, Resolved, reference_value_node};
use crate::observer::EventLevel;
use crate::orderedmap::OrderedMap;
use crate::reference::{KeyReference, NodeReference, Reference, ValueReference};

/// A type that can construct itself from a node subtree.
///
/// Instances are single-use: `build` is called once on a default value.
pub trait Buildable<'a>: Default + Send {
    /// Object name used in error messages.
    const OBJECT: &'static str;

    /// Populate `self` from `root`, the value stored under `key`.
    ///
    /// `root` is never a reference node: callers resolve references before
    /// building.
    fn build(
        &mut self,
        cx: &BuildContext,
        key: Option<&'a Node>,
        root: &'a Node,
        idx: &dyn ReferenceIndex<'a>,
    ) -> Result<()>;

    /// Where this object came from.
    fn reference(&self) -> &Reference<'a>;

    fn reference_mut(&mut self) -> &mut Reference<'a>;
}

/// First (key, value) pair of the mapping `root` whose key text is `key`.
pub fn find_key_value<'a>(key: &str, root: &'a Node) -> Option<(&'a Node, &'a Node)> {
    root.resolve_alias()
        .merged_pairs()
        .into_iter()
        .find(|(k, _)| k.value == key)
        .map(|(k, v)| (k, v.resolve_alias()))
}

/// The scalar text stored under `key`.
pub fn extract_string<'a>(key: &str, root: &'a Node) -> Option<NodeReference<'a, String>> {
    let (k, v) = find_key_value(key, root)?;
    v.is_scalar()
        .then(|| NodeReference::new(v.value.clone(), k, v))
}

/// The boolean stored under `key`. Values that are not YAML booleans are
/// ignored.
pub fn extract_bool<'a>(key: &str, root: &'a Node) -> Option<NodeReference<'a, bool>> {
    let (k, v) = find_key_value(key, root)?;
    if !v.is_scalar() {
        return None;
    }
    let value = match v.value.as_str() {
        "true" | "True" | "TRUE" => true,
        "false" | "False" | "FALSE" => false,
        _ => return None,
    };
    Some(NodeReference::new(value, k, v))
}

/// The scalar items of the sequence stored under `key`.
pub fn extract_string_list<'a>(
    key: &str,
    root: &'a Node,
) -> Option<NodeReference<'a, Vec<ValueReference<'a, String>>>> {
    let (k, v) = find_key_value(key, root)?;
    if !v.is_sequence() {
        return None;
    }
    let items = v
        .content
        .iter()
        .map(Node::resolve_alias)
        .filter(|item| item.is_scalar())
        .map(|item| ValueReference::new(item.value.clone(), item))
        .collect();
    Some(NodeReference::new(items, k, v))
}

/// Resolve `node` through the index if it is a reference.
///
/// Returns the node to decode and, when a reference was followed, how it
/// was resolved. A circular resolution is rejected unless the index allows
/// circular references.
///
/// # Errors
///
/// [`BuildError::UnresolvableReference`] if the target cannot be located,
/// [`BuildError::CircularReferenceRejected`] if it closes a forbidden cycle.
pub fn locate_ref_node<'a>(
    node: &'a Node,
    idx: &dyn ReferenceIndex<'a>,
) -> Result<(&'a Node, Option<Resolved<'a>>)> {
    let node = node.resolve_alias();
    if !idx.is_reference(node) {
        return Ok((node, None));
    }

    let resolved = idx.locate(node)?;
    if resolved.circular {
        if !idx.allow_circular() {
            let at = reference_value_node(node).unwrap_or(node);
            return Err(BuildError::CircularReferenceRejected {
                reference: resolved.reference.to_string(),
                line: at.line(),
                column: at.column(),
                journey: resolved.journey,
            });
        }
        if let Some(observer) = idx.observer() {
            observer.on_event(
                &format!("following circular reference {}", resolved.reference),
                EventLevel::Debug,
            );
        }
    }
    Ok((resolved.node, Some(resolved)))
}

/// Resolve and build the child `T` stored as `value` under `key`.
///
/// Resolution errors are returned as-is; errors from the child's own build
/// are wrapped as [`BuildError::ChildBuildFailed`] of `object`.
pub fn build_child<'a, T: Buildable<'a>>(
    cx: &BuildContext,
    object: &'static str,
    key: &'a Node,
    value: &'a Node,
    idx: &dyn ReferenceIndex<'a>,
) -> Result<ValueReference<'a, T>> {
    let (node, resolved) = locate_ref_node(value, idx)?;

    let mut child = T::default();
    if let Err(err) = child.build(cx, Some(key), node, idx) {
        if err.is_cancelled() {
            return Err(err);
        }
        return Err(err.in_child(object, key));
    }

    if let Some(resolved) = resolved {
        let reference = child.reference_mut();
        reference.reference = Some(resolved.reference);
        reference.circular = resolved.circular;
    }
    Ok(ValueReference::new(child, node))
}

/// Decide what a failed child means for the enclosing build.
///
/// Returns the error when the build must stop. Otherwise the entry is
/// reported to the index's observer, recorded on `cx`, and `Ok(())` tells
/// the caller to skip it. Cancellation and rejected circular references
/// always stop the build.
pub fn apply_failure_policy<'a>(
    cx: &BuildContext,
    idx: &dyn ReferenceIndex<'a>,
    object: &'static str,
    err: BuildError,
) -> Result<()> {
    let fatal = cx.config().failure_policy == FailurePolicy::Propagate
        || err.is_cancelled()
        || matches!(
            err.root_cause(),
            BuildError::CircularReferenceRejected { .. } | BuildError::Cancelled
        );
    if fatal {
        return Err(err);
    }

    tracing::debug!(object, error = %err, "skipping entry that failed to build");
    if let Some(observer) = idx.observer() {
        observer.on_entry_dropped(object, &err);
    }
    cx.record_dropped(object, err);
    Ok(())
}

/// Build the single child object stored under `key`, if there is one.
///
/// A failure the policy tolerates yields `Ok(None)`.
pub fn extract_object<'a, T: Buildable<'a>>(
    cx: &BuildContext,
    object: &'static str,
    key: &str,
    root: &'a Node,
    idx: &dyn ReferenceIndex<'a>,
) -> Result<Option<NodeReference<'a, T>>> {
    let Some((k, v)) = find_key_value(key, root) else {
        return Ok(None);
    };
    match build_child::<T>(cx, object, k, v, idx) {
        Ok(child) => Ok(Some(NodeReference::new(child.value, k, child.value_node))),
        Err(err) => apply_failure_policy(cx, idx, object, err).map(|()| None),
    }
}

/// Build every non-extension entry of the mapping `root` as a `T`.
///
/// Entries are built one after the other in document order, so the result
/// follows the document. Reference values are resolved before building.
pub fn extract_map_no_lookup<'a, T: Buildable<'a>>(
    cx: &BuildContext,
    object: &'static str,
    root: &'a Node,
    idx: &dyn ReferenceIndex<'a>,
) -> Result<OrderedMap<KeyReference<'a, String>, ValueReference<'a, T>>> {
    let mut map = OrderedMap::new();
    for (key, value) in root.resolve_alias().merged_pairs() {
        if is_extension_key(&key.value) {
            continue;
        }
        cx.check_cancelled()?;
        match build_child::<T>(cx, object, key, value, idx) {
            Ok(child) => {
                map.set(KeyReference::from_node(key), child);
            }
            Err(err) => apply_failure_policy(cx, idx, object, err)?,
        }
    }
    Ok(map)
}

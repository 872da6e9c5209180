/*
 * index.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Reference resolution over loaded documents.
 */

//! Reference indexes.
//!
//! Builders never chase `$ref` pointers themselves; they ask a
//! [`ReferenceIndex`]. The trait is the whole contract builders depend on:
//! recognize a reference node, locate its target, report whether circular
//! references are tolerated, and optionally expose a diagnostic observer.
//!
//! [`SpecIndex`] is the in-memory implementation. It indexes a root
//! document plus any number of named documents, resolves JSON-pointer
//! references between them, and precomputes which references sit on a
//! cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use apimodel_yaml::Node;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};
use crate::observer::BuildObserver;

/// Key of a reference indirection.
pub const REF_KEY: &str = "$ref";

/// True if `node` is a single-key mapping whose key is `$ref`.
pub fn is_reference_node(node: &Node) -> bool {
    reference_value_node(node).is_some()
}

/// The scalar node holding the reference text of a reference node.
pub fn reference_value_node(node: &Node) -> Option<&Node> {
    let node = node.resolve_alias();
    match node.content.as_slice() {
        [key, value] if node.is_mapping() && key.value == REF_KEY => {
            let value = value.resolve_alias();
            value.is_scalar().then_some(value)
        }
        _ => None,
    }
}

/// The outcome of locating a reference.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    /// The node the reference stands for. When `circular` is set by a
    /// reference chain that loops, this is the reference node where the
    /// loop closed.
    pub node: &'a Node,

    /// The reference text that was located.
    pub reference: &'a str,

    /// The reference closes, or leads into, a cycle.
    pub circular: bool,

    /// Canonical targets visited, in order.
    pub journey: Vec<String>,
}

/// What builders need from a reference index.
pub trait ReferenceIndex<'a>: Send + Sync {
    /// True if `node` is a reference indirection.
    fn is_reference(&self, node: &Node) -> bool {
        is_reference_node(node)
    }

    /// Locate the target of the reference node `node`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnresolvableReference`] if the target does not
    /// exist in any loaded document.
    fn locate(&self, node: &'a Node) -> Result<Resolved<'a>>;

    /// Whether builders may proceed through circular references.
    fn allow_circular(&self) -> bool;

    /// Best-effort diagnostic sink.
    fn observer(&self) -> Option<&dyn BuildObserver> {
        None
    }
}

/// Index configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IndexConfig {
    pub allow_circular_references: bool,
}

/// A reference found while indexing.
#[derive(Debug, Clone)]
pub struct IndexedReference<'a> {
    /// Canonical target, `document#pointer`.
    pub definition: String,

    /// The reference text as written.
    pub raw: &'a str,

    /// The reference mapping node.
    pub node: &'a Node,
}

/// In-memory reference index over one or more documents.
pub struct SpecIndex<'a> {
    root: &'a Node,
    documents: HashMap<String, &'a Node>,
    config: IndexConfig,
    observer: Option<Arc<dyn BuildObserver>>,
    references: Vec<IndexedReference<'a>>,
    circular: HashSet<String>,
}

impl<'a> SpecIndex<'a> {
    /// Index a single root document.
    pub fn new(root: &'a Node) -> Self {
        Self::with_config(root, IndexConfig::default())
    }

    pub fn with_config(root: &'a Node, config: IndexConfig) -> Self {
        let mut index = Self {
            root,
            documents: HashMap::new(),
            config,
            observer: None,
            references: Vec::new(),
            circular: HashSet::new(),
        };
        index.reindex();
        index
    }

    /// Register another document under `name`.
    ///
    /// References written as `name#/pointer` (or just `name`) resolve into
    /// it. Local references inside a document resolve within that document
    /// when its nodes were parsed with the same file name.
    pub fn with_document(mut self, name: impl Into<String>, document: &'a Node) -> Self {
        self.documents.insert(name.into(), document);
        self.reindex();
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BuildObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_allow_circular(&mut self, allow: bool) {
        self.config.allow_circular_references = allow;
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Every reference found in the indexed documents.
    pub fn references(&self) -> &[IndexedReference<'a>] {
        &self.references
    }

    /// Canonical targets that participate in a cycle.
    pub fn circular_references(&self) -> &HashSet<String> {
        &self.circular
    }

    /// Locate `pointer` (a JSON pointer, possibly empty) inside `document`
    /// (`""` for the root document).
    pub fn find(&self, document: &str, pointer: &str) -> Option<&'a Node> {
        let doc = self.document(document)?;
        navigate(doc, pointer)
    }

    fn document(&self, name: &str) -> Option<&'a Node> {
        if name.is_empty() {
            Some(self.root)
        } else {
            self.documents.get(name).copied()
        }
    }

    /// Name of the registered document `node` was parsed from.
    fn document_of(&self, node: &Node) -> String {
        match node.source_info.file.as_deref() {
            Some(file) if self.documents.contains_key(file) => file.to_string(),
            _ => String::new(),
        }
    }

    /// Split reference text into (document, pointer), relative to `from`.
    fn canonicalize(&self, reference: &str, from: &str) -> (String, String) {
        let (doc, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let doc = if doc.is_empty() { from } else { doc };
        (doc.to_string(), pointer.to_string())
    }

    fn reindex(&mut self) {
        let mut references = Vec::new();
        collect_references(self.root, &mut references);
        let mut names: Vec<&String> = self.documents.keys().collect();
        names.sort();
        for name in names {
            collect_references(self.documents[name], &mut references);
        }

        self.references = references
            .into_iter()
            .filter_map(|node| {
                let raw = reference_value_node(node)?.value.as_str();
                let from = self.document_of(node);
                let (doc, pointer) = self.canonicalize(raw, &from);
                Some(IndexedReference {
                    definition: format!("{}#{}", doc, pointer),
                    raw,
                    node,
                })
            })
            .collect();

        self.circular = self.find_cycles();
        tracing::debug!(
            references = self.references.len(),
            circular = self.circular.len(),
            "indexed references"
        );
    }

    /// Compute the set of definitions that can reach themselves through
    /// the references inside their targets.
    fn find_cycles(&self) -> HashSet<String> {
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        for reference in &self.references {
            if edges.contains_key(&reference.definition) {
                continue;
            }
            let (doc, pointer) = split_definition(&reference.definition);
            let mut inner = Vec::new();
            if let Some(target) = self.find(doc, pointer) {
                collect_references(target, &mut inner);
            }
            let successors = inner
                .into_iter()
                .filter_map(|node| {
                    let raw = reference_value_node(node)?.value.as_str();
                    let (d, p) = self.canonicalize(raw, &self.document_of(node));
                    Some(format!("{}#{}", d, p))
                })
                .collect();
            edges.insert(reference.definition.clone(), successors);
        }

        edges
            .keys()
            .filter(|start| reaches(&edges, start))
            .cloned()
            .collect()
    }
}

impl<'a> ReferenceIndex<'a> for SpecIndex<'a> {
    fn locate(&self, node: &'a Node) -> Result<Resolved<'a>> {
        let reference = match reference_value_node(node) {
            Some(value) => value.value.as_str(),
            None => return Err(BuildError::unresolvable("", node)),
        };

        let mut journey: Vec<String> = Vec::new();
        let mut current = node;
        let mut from = self.document_of(node);

        loop {
            let value = match reference_value_node(current) {
                Some(value) => value,
                None => return Err(BuildError::unresolvable(reference, current)),
            };
            let (doc, pointer) = self.canonicalize(&value.value, &from);
            let definition = format!("{}#{}", doc, pointer);

            if journey.contains(&definition) {
                journey.push(definition);
                return Ok(Resolved {
                    node: current,
                    reference,
                    circular: true,
                    journey,
                });
            }
            journey.push(definition);

            let target = self
                .find(&doc, &pointer)
                .ok_or_else(|| BuildError::unresolvable(value.value.clone(), value))?;

            if is_reference_node(target) {
                current = target.resolve_alias();
                from = doc;
                continue;
            }

            let circular = journey.iter().any(|d| self.circular.contains(d));
            return Ok(Resolved {
                node: target.resolve_alias(),
                reference,
                circular,
                journey,
            });
        }
    }

    fn allow_circular(&self) -> bool {
        self.config.allow_circular_references
    }

    fn observer(&self) -> Option<&dyn BuildObserver> {
        self.observer.as_deref()
    }
}

fn split_definition(definition: &str) -> (&str, &str) {
    definition.split_once('#').unwrap_or((definition, ""))
}

/// Collect every reference node in the subtree rooted at `node`.
fn collect_references<'n>(node: &'n Node, out: &mut Vec<&'n Node>) {
    if is_reference_node(node) {
        out.push(node.resolve_alias());
        return;
    }
    for child in &node.content {
        collect_references(child, out);
    }
}

/// Walk a JSON pointer from `root`.
fn navigate<'n>(root: &'n Node, pointer: &str) -> Option<&'n Node> {
    let mut current = root.resolve_alias();
    if pointer.is_empty() {
        return Some(current);
    }
    let rest = pointer.strip_prefix('/')?;
    for token in rest.split('/') {
        let token = token.replace("~1", "/").replace("~0", "~");
        let next = if current.is_mapping() {
            current.get(&token)?
        } else if current.is_sequence() {
            current.content.get(token.parse::<usize>().ok()?)?
        } else {
            return None;
        };
        current = next.resolve_alias();
    }
    Some(current)
}

/// True if `start` can be reached again by following `edges`.
fn reaches(edges: &HashMap<String, Vec<String>>, start: &str) -> bool {
    let mut stack: Vec<&str> = edges
        .get(start)
        .map(|next| next.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let mut seen: HashSet<&str> = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == start {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = edges.get(current) {
            stack.extend(next.iter().map(String::as_str));
        }
    }
    false
}

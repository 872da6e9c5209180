//! Position-annotated document nodes.

use std::collections::HashSet;

use crate::SourceInfo;

/// Key of a YAML merge entry.
pub const MERGE_KEY: &str = "<<";

/// Core schema tags assigned to nodes that carry no explicit tag.
pub mod tags {
    pub const STR: &str = "!!str";
    pub const INT: &str = "!!int";
    pub const FLOAT: &str = "!!float";
    pub const BOOL: &str = "!!bool";
    pub const NULL: &str = "!!null";
    pub const MAP: &str = "!!map";
    pub const SEQ: &str = "!!seq";
}

/// The structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Mapping,
    Sequence,
    Alias,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Alias => "alias",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node of a parsed document.
///
/// Mappings keep their children as a flat list alternating key and value
/// nodes, so `content[0]` is the first key, `content[1]` its value, and so
/// on. Aliases hold a copy of the anchored node as their only child.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,

    /// Resolved tag (`!!str`, `!!map`, ...) or the explicit tag as written.
    pub tag: String,

    /// Scalar text. Empty for collections and aliases.
    pub value: String,

    /// Anchor id declared on this node, if any.
    pub anchor: Option<usize>,

    pub content: Vec<Node>,

    pub source_info: SourceInfo,
}

impl Node {
    /// Create a scalar node.
    pub fn scalar(value: impl Into<String>, tag: impl Into<String>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Scalar,
            tag: tag.into(),
            value: value.into(),
            anchor: None,
            content: Vec::new(),
            source_info,
        }
    }

    /// Create a mapping node from a flat key/value list.
    pub fn mapping(content: Vec<Node>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Mapping,
            tag: tags::MAP.to_string(),
            value: String::new(),
            anchor: None,
            content,
            source_info,
        }
    }

    /// Create a sequence node.
    pub fn sequence(content: Vec<Node>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Sequence,
            tag: tags::SEQ.to_string(),
            value: String::new(),
            anchor: None,
            content,
            source_info,
        }
    }

    /// Create an alias node pointing at a copy of `target`.
    pub fn alias(target: Node, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Alias,
            tag: target.tag.clone(),
            value: String::new(),
            anchor: None,
            content: vec![target],
            source_info,
        }
    }

    pub fn with_anchor(mut self, anchor: Option<usize>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn line(&self) -> usize {
        self.source_info.line
    }

    pub fn column(&self) -> usize {
        self.source_info.column
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }

    pub fn is_alias(&self) -> bool {
        self.kind == NodeKind::Alias
    }

    /// Follow alias nodes to the node they stand for.
    pub fn resolve_alias(&self) -> &Node {
        let mut node = self;
        while node.kind == NodeKind::Alias {
            match node.content.first() {
                Some(target) => node = target,
                None => break,
            }
        }
        node
    }

    /// Iterate the (key, value) pairs of a mapping.
    ///
    /// Yields nothing for non-mappings. A trailing key without a value is
    /// ignored.
    pub fn pairs(&self) -> impl Iterator<Item = (&Node, &Node)> {
        let content: &[Node] = if self.is_mapping() { &self.content } else { &[] };
        content.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Find the value stored under `key` in a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.pairs()
            .find(|(k, _)| k.value == key)
            .map(|(_, v)| v)
    }

    /// Iterate the (key, value) pairs of a mapping with merge keys
    /// expanded.
    ///
    /// A `<<` entry whose value is a mapping, or a sequence of mappings
    /// (aliases followed), is replaced in place by the pairs of those
    /// mappings. Keys the mapping declares itself are never overridden, and
    /// among merged sources the first one to supply a key wins. Merged
    /// mappings are expanded recursively.
    pub fn merged_pairs(&self) -> Vec<(&Node, &Node)> {
        let mut seen: HashSet<&str> = self
            .pairs()
            .filter(|(k, _)| k.value != MERGE_KEY)
            .map(|(k, _)| k.value.as_str())
            .collect();

        let mut pairs = Vec::with_capacity(self.content.len() / 2);
        for (key, value) in self.pairs() {
            if key.value != MERGE_KEY {
                pairs.push((key, value));
                continue;
            }
            let value = value.resolve_alias();
            let sources: Vec<&Node> = if value.is_sequence() {
                value.content.iter().map(Node::resolve_alias).collect()
            } else {
                vec![value]
            };
            for source in sources.into_iter().filter(|s| s.is_mapping()) {
                for (k, v) in source.merged_pairs() {
                    if seen.insert(k.value.as_str()) {
                        pairs.push((k, v));
                    }
                }
            }
        }
        pairs
    }

    /// Number of children (mapping entries count as two).
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

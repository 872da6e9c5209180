//! Parser that builds position-annotated node trees.

use std::collections::HashMap;

use crate::node::tags;
use crate::{Error, Node, Result, SourceInfo};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::parser::Tag;
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Upper bound on nodes copied out of anchors by aliases in one document.
pub const MAX_ALIAS_EXPANSION: usize = 100_000;

/// Parse YAML (or JSON) from a string, producing a node tree.
///
/// Only the first document of a stream is returned.
///
/// # Example
///
/// ```rust
/// use apimodel_yaml::parse;
///
/// let root = parse("openapi: 3.1.0").unwrap();
/// assert!(root.is_mapping());
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid YAML, holds no document, uses
/// an alias whose anchor was never declared, or expands aliases into more
/// than [`MAX_ALIAS_EXPANSION`] nodes.
pub fn parse(content: &str) -> Result<Node> {
    parse_impl(content, None)
}

/// Parse YAML from a string with an associated filename.
///
/// The filename is recorded in every node's source info.
///
/// ```rust
/// use apimodel_yaml::parse_file;
///
/// let root = parse_file("openapi: 3.1.0", "api.yaml").unwrap();
/// assert_eq!(root.source_info.file, Some("api.yaml".into()));
/// ```
pub fn parse_file(content: &str, filename: &str) -> Result<Node> {
    parse_impl(content, Some(filename))
}

fn parse_impl(content: &str, filename: Option<&str>) -> Result<Node> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = NodeBuilder::new(filename);

    parser.load(&mut builder, false).map_err(Error::from)?;

    builder.result()
}

/// Event receiver that assembles [`Node`]s.
struct NodeBuilder {
    filename: Option<String>,

    /// Collections still open
    stack: Vec<OpenNode>,

    /// Completed anchored nodes and their node counts, by anchor id
    anchors: HashMap<usize, (Node, usize)>,

    /// Nodes copied so far by aliases
    expanded: usize,

    root: Option<Node>,

    /// First structural error; events cannot return errors directly
    error: Option<Error>,
}

struct OpenNode {
    kind: OpenKind,
    start: Marker,
    anchor: usize,
    tag: Option<String>,
    content: Vec<Node>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OpenKind {
    Sequence,
    Mapping,
}

impl NodeBuilder {
    fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(|s| s.to_string()),
            stack: Vec::new(),
            anchors: HashMap::new(),
            expanded: 0,
            root: None,
            error: None,
        }
    }

    fn result(self) -> Result<Node> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.stack.is_empty() {
            return Err(Error::InvalidStructure {
                message: "unterminated collection".into(),
                location: None,
            });
        }
        self.root.ok_or(Error::UnexpectedEof { location: None })
    }

    fn source_info(&self, info: SourceInfo) -> SourceInfo {
        match &self.filename {
            Some(name) => info.with_file(name.clone()),
            None => info,
        }
    }

    fn push_complete(&mut self, node: Node, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, (node.clone(), node_count(&node)));
        }
        match self.stack.last_mut() {
            Some(parent) => parent.content.push(node),
            None => {
                // Only the first document is kept
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }

    fn open(&mut self, kind: OpenKind, start: Marker, anchor: usize, tag: Option<Tag>) {
        self.stack.push(OpenNode {
            kind,
            start,
            anchor,
            tag: tag.map(|t| render_tag(&t)),
            content: Vec::new(),
        });
    }

    fn close(&mut self, kind: OpenKind, end: Marker) {
        let open = match self.stack.pop() {
            Some(open) if open.kind == kind => open,
            _ => {
                self.fail(Error::InvalidStructure {
                    message: "unbalanced collection end".into(),
                    location: Some(SourceInfo::from_marker(&end, 0)),
                });
                return;
            }
        };

        let info = self.source_info(SourceInfo::from_span(&open.start, &end));
        let mut node = match kind {
            OpenKind::Sequence => Node::sequence(open.content, info),
            OpenKind::Mapping => Node::mapping(open.content, info),
        };
        if let Some(tag) = open.tag {
            node.tag = tag;
        }
        let anchor = open.anchor;
        self.push_complete(node.with_anchor(anchor_id(anchor)), anchor);
    }

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

impl MarkedEventReceiver for NodeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor, tag) => {
                let tag = match tag {
                    Some(tag) => render_tag(&tag),
                    None if style == TScalarStyle::Plain => infer_tag(&value).to_string(),
                    None => tags::STR.to_string(),
                };
                let info = self.source_info(SourceInfo::from_marker(&marker, value.len()));
                let node = Node::scalar(value, tag, info).with_anchor(anchor_id(anchor));
                self.push_complete(node, anchor);
            }

            Event::SequenceStart(anchor, tag) => {
                self.open(OpenKind::Sequence, marker, anchor, tag);
            }
            Event::SequenceEnd => self.close(OpenKind::Sequence, marker),

            Event::MappingStart(anchor, tag) => {
                self.open(OpenKind::Mapping, marker, anchor, tag);
            }
            Event::MappingEnd => self.close(OpenKind::Mapping, marker),

            Event::Alias(id) => {
                let info = self.source_info(SourceInfo::from_marker(&marker, 0));
                let Some(size) = self.anchors.get(&id).map(|(_, size)| *size) else {
                    self.fail(Error::InvalidStructure {
                        message: "alias refers to an unknown anchor".into(),
                        location: Some(info),
                    });
                    return;
                };
                self.expanded = self.expanded.saturating_add(size);
                if self.expanded > MAX_ALIAS_EXPANSION {
                    self.fail(Error::InvalidStructure {
                        message: format!("aliases expand to more than {MAX_ALIAS_EXPANSION} nodes"),
                        location: Some(info),
                    });
                    return;
                }
                if let Some((target, _)) = self.anchors.get(&id) {
                    let node = Node::alias(target.clone(), info);
                    self.push_complete(node, 0);
                }
            }
        }
    }
}

fn node_count(node: &Node) -> usize {
    1 + node.content.iter().map(node_count).sum::<usize>()
}

fn anchor_id(anchor: usize) -> Option<usize> {
    (anchor > 0).then_some(anchor)
}

fn render_tag(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "!!" | "tag:yaml.org,2002:" => format!("!!{}", tag.suffix),
        handle => format!("{}{}", handle, tag.suffix),
    }
}

/// Infer the core-schema tag of a plain scalar.
fn infer_tag(value: &str) -> &'static str {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return tags::NULL,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return tags::BOOL,
        ".inf" | "+.inf" | "-.inf" | ".Inf" | "+.Inf" | "-.Inf" | ".nan" | ".NaN" => {
            return tags::FLOAT;
        }
        _ => {}
    }

    if value.parse::<i64>().is_ok()
        || value
            .strip_prefix("0x")
            .is_some_and(|hex| i64::from_str_radix(hex, 16).is_ok())
        || value
            .strip_prefix("0o")
            .is_some_and(|oct| i64::from_str_radix(oct, 8).is_ok())
    {
        return tags::INT;
    }

    // Rust also accepts "inf" and "NaN", which YAML treats as strings
    if value.bytes().any(|b| b.is_ascii_digit()) && value.parse::<f64>().is_ok() {
        return tags::FLOAT;
    }

    tags::STR
}

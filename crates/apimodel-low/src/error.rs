/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build error types.
 */

//! Errors raised while building objects from nodes.
//!
//! Every variant except [`BuildError::Cancelled`] carries the line and column
//! of the node it is about, so a failure deep in a document can be located
//! from the error alone.

use apimodel_yaml::{Node, NodeKind};

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// The root handed to a builder is not the kind of node it requires.
    #[error(
        "{object} build failed: expected a {expected} node but found a {found}, line {line}, col {column}"
    )]
    MalformedRoot {
        object: &'static str,
        expected: NodeKind,
        found: NodeKind,
        line: usize,
        column: usize,
    },

    /// A reference could not be located in the index.
    #[error("cannot find reference: {reference} at line {line}, col {column}")]
    UnresolvableReference {
        reference: String,
        line: usize,
        column: usize,
    },

    /// A reference closes a cycle and the index forbids circular resolution.
    #[error(
        "circular reference rejected: {reference} at line {line}, col {column} ({})",
        .journey.join(" -> ")
    )]
    CircularReferenceRejected {
        reference: String,
        line: usize,
        column: usize,
        /// References visited, ending where the cycle closes.
        journey: Vec<String>,
    },

    /// A nested object failed to build.
    #[error("{object} build failed for '{key}' at line {line}, col {column}: {source}")]
    ChildBuildFailed {
        object: &'static str,
        key: String,
        line: usize,
        column: usize,
        source: Box<BuildError>,
    },

    /// The build context was cancelled.
    #[error("build was cancelled")]
    Cancelled,
}

impl BuildError {
    /// Create a MalformedRoot error for `node`.
    pub fn malformed_root(object: &'static str, expected: NodeKind, node: &Node) -> Self {
        Self::MalformedRoot {
            object,
            expected,
            found: node.kind,
            line: node.line(),
            column: node.column(),
        }
    }

    /// Create an UnresolvableReference error located at `node`.
    pub fn unresolvable(reference: impl Into<String>, node: &Node) -> Self {
        Self::UnresolvableReference {
            reference: reference.into(),
            line: node.line(),
            column: node.column(),
        }
    }

    /// Wrap `self` as the failure of the child stored under `key_node`.
    pub fn in_child(self, object: &'static str, key_node: &Node) -> Self {
        Self::ChildBuildFailed {
            object,
            key: key_node.value.clone(),
            line: key_node.line(),
            column: key_node.column(),
            source: Box::new(self),
        }
    }

    /// Check if this is a cancellation error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The innermost error, following `ChildBuildFailed` wrappers.
    pub fn root_cause(&self) -> &BuildError {
        match self {
            Self::ChildBuildFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Line and column this error points at, if any.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::MalformedRoot { line, column, .. }
            | Self::UnresolvableReference { line, column, .. }
            | Self::CircularReferenceRejected { line, column, .. }
            | Self::ChildBuildFailed { line, column, .. } => Some((*line, *column)),
            Self::Cancelled => None,
        }
    }
}

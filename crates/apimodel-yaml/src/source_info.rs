//! Source location information for document nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location information for a node.
///
/// Tracks the position of an element in the original document text so that
/// builders can point diagnostics at the offending key or value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Optional filename or source identifier
    pub file: Option<String>,

    /// Byte offset from start of source (0-based)
    pub offset: usize,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters not bytes)
    pub column: usize,

    /// Length in bytes
    pub len: usize,
}

impl SourceInfo {
    /// Create a new SourceInfo with all fields specified.
    pub fn new(file: Option<String>, offset: usize, line: usize, column: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            column,
            len,
        }
    }

    /// Create a SourceInfo from a yaml-rust2 marker.
    ///
    /// yaml-rust2 reports lines 1-based and columns 0-based; both are
    /// normalized to 1-based here.
    pub fn from_marker(marker: &yaml_rust2::scanner::Marker, len: usize) -> Self {
        Self {
            file: None,
            offset: marker.index(),
            line: marker.line().max(1),
            column: marker.col() + 1,
            len,
        }
    }

    /// Create a SourceInfo spanning from start to end markers.
    pub fn from_span(
        start: &yaml_rust2::scanner::Marker,
        end: &yaml_rust2::scanner::Marker,
    ) -> Self {
        Self::from_marker(start, end.index().saturating_sub(start.index()))
    }

    /// Set the filename for this source location.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Get the end offset (exclusive) of this location.
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            column: 1,
            len: 0,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}: ", file)?;
        }
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_creation() {
        let info = SourceInfo::new(Some("api.yaml".into()), 10, 2, 5, 8);
        assert_eq!(info.file, Some("api.yaml".into()));
        assert_eq!(info.offset, 10);
        assert_eq!(info.line, 2);
        assert_eq!(info.column, 5);
        assert_eq!(info.end_offset(), 18);
    }

    #[test]
    fn test_display() {
        let info = SourceInfo::new(None, 0, 3, 7, 1);
        assert_eq!(info.to_string(), "line 3, col 7");

        let info = info.with_file("api.yaml");
        assert_eq!(info.to_string(), "api.yaml: line 3, col 7");
    }

    #[test]
    fn test_default() {
        let info = SourceInfo::default();
        assert_eq!(info.file, None);
        assert_eq!(info.line, 1);
        assert_eq!(info.column, 1);
        assert_eq!(info.len, 0);
    }
}

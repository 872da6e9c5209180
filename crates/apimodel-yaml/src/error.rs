//! Error types for document loading.

use crate::SourceInfo;

/// Result type alias for apimodel-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning document text into a node tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// YAML/JSON syntax error
    #[error("Parse error: {message}{}", at(.location))]
    ParseError {
        message: String,
        location: Option<SourceInfo>,
    },

    /// Input held no document
    #[error("Unexpected end of input{}", at(.location))]
    UnexpectedEof { location: Option<SourceInfo> },

    /// Structurally invalid input (dangling alias, unbalanced collections)
    #[error("Invalid document structure: {message}{}", at(.location))]
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },
}

fn at(location: &Option<SourceInfo>) -> String {
    match location {
        Some(loc) => format!(" ({})", loc),
        None => String::new(),
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let location = SourceInfo::from_marker(err.marker(), 0);
        Error::ParseError {
            message: err.info().to_string(),
            location: Some(location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let err = Error::InvalidStructure {
            message: "unknown anchor".into(),
            location: Some(SourceInfo::new(None, 4, 2, 3, 0)),
        };
        assert_eq!(
            err.to_string(),
            "Invalid document structure: unknown anchor (line 2, col 3)"
        );
    }

    #[test]
    fn test_display_without_location() {
        let err = Error::UnexpectedEof { location: None };
        assert_eq!(err.to_string(), "Unexpected end of input");
    }
}

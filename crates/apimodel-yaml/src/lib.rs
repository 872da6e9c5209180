//! # apimodel-yaml
//!
//! YAML and JSON parsing into a position-annotated node tree.
//!
//! Every [`Node`] carries its kind, resolved tag, scalar text, ordered
//! children and source location. Mappings store their children as a flat
//! list alternating key and value nodes, which lets consumers keep both the
//! key node and the value node of an entry for diagnostics.
//!
//! ## Example
//!
//! ```rust,no_run
//! use apimodel_yaml::parse;
//!
//! let content = r#"
//! paths:
//!   /pets:
//!     get:
//!       operationId: listPets
//! "#;
//!
//! let root = parse(content).unwrap();
//! if let Some(paths) = root.get("paths") {
//!     println!("paths at line {}, col {}", paths.line(), paths.column());
//! }
//! ```

mod error;
mod node;
mod parser;
mod source_info;
mod value;

pub use error::{Error, Result};
pub use node::{MERGE_KEY, Node, NodeKind, tags};
pub use parser::{MAX_ALIAS_EXPANSION, parse, parse_file};
pub use source_info::SourceInfo;
pub use value::to_json_value;

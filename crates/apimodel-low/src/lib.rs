//! Low-level API model building.
//!
//! This crate turns a position-annotated node tree (see [`apimodel_yaml`])
//! into typed API objects that keep, for every field, the key and value
//! nodes it was decoded from.
//!
//! # Architecture
//!
//! - [`Buildable`] - The build contract every object implements
//! - [`ReferenceIndex`] - What builders need to resolve `$ref` indirections;
//!   [`SpecIndex`] is the in-memory implementation
//! - [`pipeline`] - Concurrent translation of mapping entries into objects
//! - [`Hashable`] - Order-independent structural digests for change
//!   detection
//! - [`BuildContext`] - Configuration, cancellation and the log of dropped
//!   entries, threaded through every build
//!
//! # Example
//!
//! ```
//! use apimodel_low::{BuildContext, Buildable, Hashable, SpecIndex};
//! use apimodel_low::model::Paths;
//!
//! let document = apimodel_yaml::parse(
//!     "paths:\n  /pets:\n    get:\n      operationId: listPets\n",
//! )
//! .unwrap();
//! let index = SpecIndex::new(&document);
//! let root = document.get("paths").unwrap();
//!
//! let mut paths = Paths::default();
//! paths.build(&BuildContext::new(), None, root, &index).unwrap();
//!
//! let pets = paths.find_path("/pets").unwrap();
//! assert!(pets.value.find_operation("get").is_some());
//! println!("{}", paths.hash());
//! ```

pub mod cancellation;
pub mod context;
pub mod error;
pub mod extensions;
pub mod hash;
pub mod index;
pub mod low;
pub mod model;
pub mod observer;
pub mod orderedmap;
pub mod pipeline;
pub mod reference;

// Re-export commonly used types
pub use cancellation::Cancellation;
pub use context::{BuildConfig, BuildContext, DroppedEntry, FailurePolicy};
pub use error::{BuildError, Result};
pub use extensions::{EXTENSION_PREFIX, Extensions, HasExtensions, extract_extensions};
pub use hash::{Digest, Hashable};
pub use index::{IndexConfig, REF_KEY, ReferenceIndex, Resolved, SpecIndex};
pub use low::Buildable;
pub use observer::{BuildObserver, EventLevel, NoopObserver, TracingObserver};
pub use orderedmap::OrderedMap;
pub use reference::{KeyReference, NodeReference, Reference, ValueReference};

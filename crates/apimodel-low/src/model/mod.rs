/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Object builders.
 */

//! Typed API objects built from node trees.
//!
//! Two collection builders show the two extraction styles:
//!
//! - [`Paths`] builds its path items concurrently through the
//!   [translation pipeline](crate::pipeline), because every path item may
//!   need its own reference resolution and nested builds.
//! - [`Responses`] decodes its entries sequentially with
//!   [`extract_map_no_lookup`](crate::low::extract_map_no_lookup) and lifts
//!   the reserved `default` entry into a dedicated field.
//!
//! [`PathItem`], [`Operation`] and [`Response`] fill in the levels between.

mod operation;
mod path_item;
mod paths;
mod response;
mod responses;

pub use operation::Operation;
pub use path_item::{HTTP_METHODS, PathItem};
pub use paths::Paths;
pub use response::Response;
pub use responses::{DEFAULT_KEY, Responses};

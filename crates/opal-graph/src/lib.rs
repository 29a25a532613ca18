//! Dependency ordering for Opal
//!
//! Tarjan strongly-connected-components detection and the topological sort
//! built on it. Used to compute the type preparation order (base types,
//! implemented interfaces and containing types before the types that depend
//! on them) and to reject dependency cycles.

#![warn(missing_docs)]

pub mod order;

pub use order::{strongly_connected_components, topological_sort, GraphError};

//! Metadata decisions for the Opal compiler
//!
//! The compiler decides, per declaration, how a class-based source program
//! appears in generated script: names, inlined bodies, erased types. This
//! crate holds those decisions and moves them across compilations:
//!
//! - [`LocalMetadataImporter`] stores the decisions made for the module
//!   under compilation and tracks reserved member names.
//! - [`ReferenceMetadataImporter`] reads decisions back out of an already
//!   compiled module's persisted records.
//! - [`ProgramMetadata`] fronts both, dispatching each query to the
//!   importer that owns the symbol's module.
//! - [`writer`] serializes local decisions into a compiled module once
//!   code generation is done.
//!
//! Queries are total. A missing or unreadable decision produces a
//! diagnostic and an inert fallback, never a panic, so one bad reference
//! cannot stop the compilation from reporting everything else it finds.

pub mod diagnostics;
pub mod error;
pub mod local;
pub mod matcher;
pub mod program;
pub mod reference;
pub mod writer;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{MatchError, MetaError};
pub use local::{preparation_order, LocalMetadataImporter};
pub use program::ProgramMetadata;
pub use reference::ReferenceMetadataImporter;
pub use writer::write_module;

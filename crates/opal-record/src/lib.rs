//! Persisted metadata records for Opal
//!
//! The wire form of script-semantics decisions: a record is an ordered list
//! of primitive values headed by a tag identifying the decision variant.
//! Records serialize to checksummed binary blobs that the module writer
//! attaches to low-level member definitions, and decode back exactly
//! (`decode(encode(d)) == d` for every constructible decision).

#![warn(missing_docs)]

pub mod blob;
pub mod codec;
pub mod module;
pub mod record;

pub use module::{
    AttachedRecord, CompiledModule, CompiledType, EventDef, FieldDef, MethodDef, ParamDef,
    PropertyDef, RecordMarker, TypeDefIndex,
};
pub use record::{MetadataRecord, RecordBuilder, RecordCursor, RecordError, RecordValue};

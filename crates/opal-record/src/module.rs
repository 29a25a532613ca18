//! Compiled-module member table
//!
//! The low-level view of an already-compiled (or under-construction) module:
//! type definitions with their member definitions and structural signatures,
//! plus the opaque record blobs attached to them. The wider physical module
//! format (how this table is laid out on disk) belongs to the module
//! reader/writer; this crate only defines what records attach to.

use crate::record::{MetadataRecord, RecordError};
use opal_semantics::{ModuleId, ParamShape, TypeShape};

/// Marker identifying what an attached blob contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMarker {
    /// A script-semantics decision record
    ScriptSemantics,
    /// A reserved instance-member-name list record
    ReservedNames,
}

impl RecordMarker {
    /// Marker byte used in the physical embedding
    pub fn to_u8(self) -> u8 {
        match self {
            RecordMarker::ScriptSemantics => 0,
            RecordMarker::ReservedNames => 1,
        }
    }

    /// Parse a marker byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(RecordMarker::ScriptSemantics),
            1 => Some(RecordMarker::ReservedNames),
            _ => None,
        }
    }
}

/// An opaque record blob attached to a definition
#[derive(Debug, Clone)]
pub struct AttachedRecord {
    /// What the blob contains
    pub marker: RecordMarker,
    /// The serialized record
    pub data: Vec<u8>,
}

impl AttachedRecord {
    /// Attachable form of a record
    pub fn new(marker: RecordMarker, record: &MetadataRecord) -> Self {
        AttachedRecord {
            marker,
            data: record.to_bytes(),
        }
    }

    /// Parse the blob back into a record
    pub fn parse(&self) -> Result<MetadataRecord, RecordError> {
        MetadataRecord::from_bytes(&self.data)
    }
}

fn find_record(records: &[AttachedRecord], marker: RecordMarker) -> Option<&AttachedRecord> {
    records.iter().find(|r| r.marker == marker)
}

/// Index of a type definition within its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDefIndex(pub u32);

/// A method or constructor definition
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Member name (constructors use the module format's fixed name)
    pub name: String,
    /// Number of method-level generic parameters
    pub generic_arity: u32,
    /// Return type shape
    pub return_shape: TypeShape,
    /// Parameter shapes in declaration order
    pub params: Vec<ParamDef>,
    /// Attached record blobs
    pub records: Vec<AttachedRecord>,
}

/// One parameter of a method definition
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// The parameter's type shape
    pub shape: TypeShape,
    /// Whether the parameter is passed by reference
    pub by_ref: bool,
}

impl From<&ParamShape> for ParamDef {
    fn from(p: &ParamShape) -> Self {
        ParamDef {
            shape: p.shape.clone(),
            by_ref: p.by_ref,
        }
    }
}

/// A field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Attached record blobs
    pub records: Vec<AttachedRecord>,
}

/// A property definition
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// The property's type shape
    pub shape: TypeShape,
    /// Index parameter shapes, empty for non-indexers
    pub index_params: Vec<ParamDef>,
    /// Attached record blobs
    pub records: Vec<AttachedRecord>,
}

/// An event definition
#[derive(Debug, Clone)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Attached record blobs
    pub records: Vec<AttachedRecord>,
}

/// A type (or delegate type) definition
#[derive(Debug, Clone)]
pub struct CompiledType {
    /// Simple name
    pub name: String,
    /// Namespace path of the outermost type
    pub namespace: Vec<String>,
    /// Generic parameter count
    pub arity: u32,
    /// Containing type for nested types
    pub containing: Option<TypeDefIndex>,
    /// Method and constructor definitions
    pub methods: Vec<MethodDef>,
    /// Field definitions
    pub fields: Vec<FieldDef>,
    /// Property definitions
    pub properties: Vec<PropertyDef>,
    /// Event definitions
    pub events: Vec<EventDef>,
    /// Type-level attached record blobs (semantics + reserved names)
    pub records: Vec<AttachedRecord>,
}

impl CompiledType {
    /// A new empty type definition
    pub fn new(namespace: Vec<String>, name: impl Into<String>, arity: u32) -> Self {
        CompiledType {
            name: name.into(),
            namespace,
            arity,
            containing: None,
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Mark this definition as nested inside `outer`
    pub fn nested_in(mut self, outer: TypeDefIndex) -> Self {
        self.containing = Some(outer);
        self
    }

    /// The type's attached record with the given marker, if any
    pub fn record(&self, marker: RecordMarker) -> Option<&AttachedRecord> {
        find_record(&self.records, marker)
    }
}

impl MethodDef {
    /// The method's attached record with the given marker, if any
    pub fn record(&self, marker: RecordMarker) -> Option<&AttachedRecord> {
        find_record(&self.records, marker)
    }
}

impl FieldDef {
    /// The field's attached record with the given marker, if any
    pub fn record(&self, marker: RecordMarker) -> Option<&AttachedRecord> {
        find_record(&self.records, marker)
    }
}

impl PropertyDef {
    /// The property's attached record with the given marker, if any
    pub fn record(&self, marker: RecordMarker) -> Option<&AttachedRecord> {
        find_record(&self.records, marker)
    }
}

impl EventDef {
    /// The event's attached record with the given marker, if any
    pub fn record(&self, marker: RecordMarker) -> Option<&AttachedRecord> {
        find_record(&self.records, marker)
    }
}

/// A compiled module's type table
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Module identity
    pub id: ModuleId,
    /// Type definitions in declaration order
    pub types: Vec<CompiledType>,
}

impl CompiledModule {
    /// A new empty module
    pub fn new(id: ModuleId) -> Self {
        CompiledModule {
            id,
            types: Vec::new(),
        }
    }

    /// Add a type definition and return its index
    pub fn add_type(&mut self, ty: CompiledType) -> TypeDefIndex {
        let index = TypeDefIndex(self.types.len() as u32);
        self.types.push(ty);
        index
    }

    /// Look up a type definition
    pub fn type_def(&self, index: TypeDefIndex) -> &CompiledType {
        &self.types[index.0 as usize]
    }

    /// Mutable access to a type definition
    pub fn type_def_mut(&mut self, index: TypeDefIndex) -> &mut CompiledType {
        &mut self.types[index.0 as usize]
    }
}

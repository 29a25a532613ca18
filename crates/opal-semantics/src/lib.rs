//! Opal Semantic Model
//!
//! Script-semantics decisions and the symbol store they are keyed by.
//! Every declaration the compiler sees (type, method, constructor, property,
//! field, event, delegate) gets exactly one decision describing how it is
//! realized in the emitted script.

#![warn(missing_docs)]

pub mod semantics;
pub mod shape;
pub mod symbol;

pub use semantics::{
    ConstantValue, ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics,
    MethodSemantics, PropertySemantics, TypeSemantics,
};
pub use shape::{ParamShape, TypeParamOwner, TypeShape};
pub use symbol::{
    Accessibility, MemberSignature, ModuleId, SemanticModel, SymbolData, SymbolId, SymbolKind,
};

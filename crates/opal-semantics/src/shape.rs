//! Structural type shapes
//!
//! The closed grammar used to describe parameter, return and property types
//! in a structural signature. Shapes are module-qualified so that two types
//! with the same name in different modules never compare equal, and type
//! parameters are compared by owner kind and ordinal, never by name.

use crate::symbol::ModuleId;
use std::fmt;

/// Which kind of declaration owns a referenced type parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParamOwner {
    /// The type parameter is declared by a type
    Type,
    /// The type parameter is declared by a method
    Method,
}

/// A structural description of a type, recursive over the closed shape set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// A named type, possibly nested and possibly generic-instantiated
    Named {
        /// Identity of the module declaring the type
        module: ModuleId,
        /// Namespace path of the outermost type
        namespace: Vec<String>,
        /// Simple name
        name: String,
        /// Shape of the containing type for nested types
        containing: Option<Box<TypeShape>>,
        /// Type arguments; empty for non-generic types and open definitions
        type_args: Vec<TypeShape>,
    },
    /// An array of some element shape
    Array {
        /// Element shape
        element: Box<TypeShape>,
        /// Array rank (1 for a vector)
        rank: u32,
    },
    /// A by-reference passing of the referenced shape
    ByRef {
        /// The referenced shape
        referenced: Box<TypeShape>,
    },
    /// A reference to a type parameter of the owning type or method
    TypeParam {
        /// Owner kind
        owner: TypeParamOwner,
        /// Zero-based position among the owner's type parameters
        ordinal: u32,
    },
}

impl TypeShape {
    /// A named, non-nested, non-generic type
    pub fn named(module: ModuleId, namespace: Vec<String>, name: impl Into<String>) -> Self {
        TypeShape::Named {
            module,
            namespace,
            name: name.into(),
            containing: None,
            type_args: Vec::new(),
        }
    }

    /// A generic instantiation of `self` with the given arguments
    pub fn with_args(self, type_args: Vec<TypeShape>) -> Self {
        match self {
            TypeShape::Named {
                module,
                namespace,
                name,
                containing,
                ..
            } => TypeShape::Named {
                module,
                namespace,
                name,
                containing,
                type_args,
            },
            other => other,
        }
    }

    /// A single-dimensional array of `self`
    pub fn array(self) -> Self {
        TypeShape::Array {
            element: Box::new(self),
            rank: 1,
        }
    }

    /// A by-reference passing of `self`
    pub fn by_ref(self) -> Self {
        TypeShape::ByRef {
            referenced: Box::new(self),
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Named {
                namespace,
                name,
                containing,
                type_args,
                ..
            } => {
                if let Some(outer) = containing {
                    write!(f, "{outer}.")?;
                } else if !namespace.is_empty() {
                    write!(f, "{}.", namespace.join("."))?;
                }
                write!(f, "{name}")?;
                if !type_args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in type_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeShape::Array { element, rank } => {
                write!(f, "{element}[")?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeShape::ByRef { referenced } => write!(f, "ref {referenced}"),
            TypeShape::TypeParam { owner, ordinal } => match owner {
                TypeParamOwner::Type => write!(f, "!{ordinal}"),
                TypeParamOwner::Method => write!(f, "!!{ordinal}"),
            },
        }
    }
}

/// A parameter's shape together with its by-reference flag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamShape {
    /// The parameter's type shape
    pub shape: TypeShape,
    /// Whether the parameter is passed by reference
    pub by_ref: bool,
}

impl ParamShape {
    /// A by-value parameter of the given shape
    pub fn by_value(shape: TypeShape) -> Self {
        ParamShape {
            shape,
            by_ref: false,
        }
    }

    /// A by-reference parameter of the given shape
    pub fn by_reference(shape: TypeShape) -> Self {
        ParamShape {
            shape,
            by_ref: true,
        }
    }
}

//! Script-realization decisions, one tagged union per declaration kind
//!
//! Decisions are immutable once constructed. Construction goes through the
//! named factory functions so that a variant and its fields are pinned in a
//! single step; consumers inspect them with exhaustive `match`.

use std::fmt;

/// A compile-time constant value carried by a [`FieldSemantics::Constant`]
/// decision. The closed set of shapes the target script can express literally.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// A boolean literal
    Bool(bool),
    /// A numeric literal (the target script has one number type)
    Number(f64),
    /// A string literal
    Str(String),
    /// The null literal
    Null,
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Bool(b) => write!(f, "{b}"),
            ConstantValue::Number(n) => write!(f, "{n}"),
            ConstantValue::Str(s) => write!(f, "{s:?}"),
            ConstantValue::Null => write!(f, "null"),
        }
    }
}

/// How a type declaration is realized in the emitted script
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSemantics {
    /// An ordinary script type with the given script name
    NormalType {
        /// Script name of the type
        name: String,
        /// Erase generic arguments at every use site
        ignore_generic_arguments: bool,
        /// Whether a script definition is emitted for this type
        generate_code: bool,
    },
    /// A value type whose instances are mutable script objects; copied on
    /// assignment by the generated code
    MutableValueType {
        /// Script name of the type
        name: String,
        /// Erase generic arguments at every use site
        ignore_generic_arguments: bool,
        /// Whether a script definition is emitted for this type
        generate_code: bool,
    },
    /// The type does not exist from the script's point of view
    NotUsableFromScript,
}

impl TypeSemantics {
    /// An ordinary generated type with the given script name
    pub fn normal_type(name: impl Into<String>) -> Self {
        TypeSemantics::NormalType {
            name: name.into(),
            ignore_generic_arguments: false,
            generate_code: true,
        }
    }

    /// A mutable value type with the given script name
    pub fn mutable_value_type(name: impl Into<String>) -> Self {
        TypeSemantics::MutableValueType {
            name: name.into(),
            ignore_generic_arguments: false,
            generate_code: true,
        }
    }

    /// The script name of the type, if it has one
    pub fn script_name(&self) -> Option<&str> {
        match self {
            TypeSemantics::NormalType { name, .. } => Some(name),
            TypeSemantics::MutableValueType { name, .. } => Some(name),
            TypeSemantics::NotUsableFromScript => None,
        }
    }

    /// Whether code is generated for the type
    pub fn generates_code(&self) -> bool {
        match self {
            TypeSemantics::NormalType { generate_code, .. } => *generate_code,
            TypeSemantics::MutableValueType { generate_code, .. } => *generate_code,
            TypeSemantics::NotUsableFromScript => false,
        }
    }
}

/// How a method declaration is realized in the emitted script
#[derive(Debug, Clone, PartialEq)]
pub enum MethodSemantics {
    /// An ordinary script method invoked on its receiver
    Normal {
        /// Script name of the method
        name: String,
        /// Erase generic arguments at call sites
        ignore_generic_arguments: bool,
        /// Whether a script definition is emitted
        generate_code: bool,
        /// Expand the final params-array argument into individual arguments
        expand_params: bool,
        /// Treat the return value as a plain script array when enumerated
        enumerate_as_array: bool,
    },
    /// Lowered to a static function that takes the receiver as its first
    /// argument
    StaticWithReceiverFirst {
        /// Script name of the function
        name: String,
        /// Erase generic arguments at call sites
        ignore_generic_arguments: bool,
        /// Whether a script definition is emitted
        generate_code: bool,
        /// Expand the final params-array argument into individual arguments
        expand_params: bool,
        /// Treat the return value as a plain script array when enumerated
        enumerate_as_array: bool,
    },
    /// Every call site is replaced by expanding a literal code template
    InlineCode {
        /// The code template expanded at call sites
        literal: String,
        /// Treat the return value as a plain script array when enumerated
        enumerate_as_array: bool,
        /// Whether a named alias is also generated so the method can be
        /// referenced as a value
        generated_alias_present: bool,
        /// Template used instead when the call is known to be non-virtual
        non_virtual_literal: Option<String>,
        /// Template used instead when the params array cannot be expanded
        non_expanded_literal: Option<String>,
    },
    /// Calls become native indexing, `receiver[arg]`
    NativeIndexer,
    /// Calls become a native script operator applied to the arguments
    NativeOperator,
    /// The method does not exist from the script's point of view
    NotUsableFromScript,
}

impl MethodSemantics {
    /// An ordinary generated method with the given script name
    pub fn normal(name: impl Into<String>) -> Self {
        MethodSemantics::Normal {
            name: name.into(),
            ignore_generic_arguments: false,
            generate_code: true,
            expand_params: false,
            enumerate_as_array: false,
        }
    }

    /// A static function taking the receiver as its first argument
    pub fn static_with_receiver_first(name: impl Into<String>) -> Self {
        MethodSemantics::StaticWithReceiverFirst {
            name: name.into(),
            ignore_generic_arguments: false,
            generate_code: true,
            expand_params: false,
            enumerate_as_array: false,
        }
    }

    /// An inline-code method with the given call-site template
    pub fn inline_code(literal: impl Into<String>) -> Self {
        MethodSemantics::InlineCode {
            literal: literal.into(),
            enumerate_as_array: false,
            generated_alias_present: false,
            non_virtual_literal: None,
            non_expanded_literal: None,
        }
    }

    /// The script name of the method, if it has one
    pub fn script_name(&self) -> Option<&str> {
        match self {
            MethodSemantics::Normal { name, .. } => Some(name),
            MethodSemantics::StaticWithReceiverFirst { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether code is generated for the method
    pub fn generates_code(&self) -> bool {
        match self {
            MethodSemantics::Normal { generate_code, .. } => *generate_code,
            MethodSemantics::StaticWithReceiverFirst { generate_code, .. } => *generate_code,
            _ => false,
        }
    }
}

/// How a constructor declaration is realized in the emitted script
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorSemantics {
    /// The unnamed constructor of the type's script function itself
    Unnamed {
        /// Whether a script definition is emitted
        generate_code: bool,
        /// Expand the final params-array argument into individual arguments
        expand_params: bool,
        /// Skip the call in generated field-initializer chains
        skip_in_initializer: bool,
    },
    /// A named constructor attached to the type
    Named {
        /// Script name of the constructor
        name: String,
        /// Whether a script definition is emitted
        generate_code: bool,
        /// Expand the final params-array argument into individual arguments
        expand_params: bool,
        /// Skip the call in generated field-initializer chains
        skip_in_initializer: bool,
    },
    /// A static factory function returning the new instance
    StaticFactory {
        /// Script name of the factory function
        name: String,
        /// Whether a script definition is emitted
        generate_code: bool,
        /// Expand the final params-array argument into individual arguments
        expand_params: bool,
        /// Skip the call in generated field-initializer chains
        skip_in_initializer: bool,
    },
    /// Construction sites are replaced by expanding a literal code template
    InlineCode {
        /// The code template expanded at construction sites
        literal: String,
        /// Skip the call in generated field-initializer chains
        skip_in_initializer: bool,
        /// Template used instead when the params array cannot be expanded
        non_expanded_literal: Option<String>,
    },
    /// Construction becomes a script object literal; each constructor
    /// parameter maps to a member of the literal
    ObjectLiteral {
        /// Parameter-name to member-name pairs, in parameter order
        parameter_to_member_map: Vec<(String, String)>,
        /// Skip the call in generated field-initializer chains
        skip_in_initializer: bool,
    },
    /// The constructor does not exist from the script's point of view
    NotUsableFromScript,
}

impl ConstructorSemantics {
    /// The plain unnamed constructor
    pub fn unnamed() -> Self {
        ConstructorSemantics::Unnamed {
            generate_code: true,
            expand_params: false,
            skip_in_initializer: false,
        }
    }

    /// A named constructor with the given script name
    pub fn named(name: impl Into<String>) -> Self {
        ConstructorSemantics::Named {
            name: name.into(),
            generate_code: true,
            expand_params: false,
            skip_in_initializer: false,
        }
    }

    /// A static factory function with the given script name
    pub fn static_factory(name: impl Into<String>) -> Self {
        ConstructorSemantics::StaticFactory {
            name: name.into(),
            generate_code: true,
            expand_params: false,
            skip_in_initializer: false,
        }
    }
}

/// How a property declaration is realized in the emitted script
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySemantics {
    /// Lowered to get/set accessor methods; the accessor decisions are
    /// carried here so consumers of the property need not resolve the
    /// accessor symbols themselves
    GetAndSetMethods {
        /// Decision for the getter, absent for write-only properties
        get: Option<Box<MethodSemantics>>,
        /// Decision for the setter, absent for read-only properties
        set: Option<Box<MethodSemantics>>,
    },
    /// Lowered to a plain script field
    Field {
        /// Script name of the field
        name: String,
    },
    /// The property does not exist from the script's point of view
    NotUsableFromScript,
}

impl PropertySemantics {
    /// Get/set accessor methods
    pub fn get_and_set_methods(
        get: Option<MethodSemantics>,
        set: Option<MethodSemantics>,
    ) -> Self {
        PropertySemantics::GetAndSetMethods {
            get: get.map(Box::new),
            set: set.map(Box::new),
        }
    }

    /// A plain script field with the given name
    pub fn field(name: impl Into<String>) -> Self {
        PropertySemantics::Field { name: name.into() }
    }
}

/// How a field declaration is realized in the emitted script
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSemantics {
    /// A plain script field
    Field {
        /// Script name of the field
        name: String,
    },
    /// The field reads as a compile-time constant; no script field is
    /// emitted
    Constant {
        /// The constant value substituted at read sites
        value: ConstantValue,
        /// Script name used when the field must still be addressable
        name: String,
    },
    /// The field does not exist from the script's point of view
    NotUsableFromScript,
}

impl FieldSemantics {
    /// A plain script field with the given name
    pub fn field(name: impl Into<String>) -> Self {
        FieldSemantics::Field { name: name.into() }
    }

    /// A compile-time constant field
    pub fn constant(value: ConstantValue, name: impl Into<String>) -> Self {
        FieldSemantics::Constant {
            value,
            name: name.into(),
        }
    }
}

/// How an event declaration is realized in the emitted script
#[derive(Debug, Clone, PartialEq)]
pub enum EventSemantics {
    /// Lowered to add/remove accessor methods
    AddAndRemoveMethods {
        /// Decision for the add accessor
        add: Option<Box<MethodSemantics>>,
        /// Decision for the remove accessor
        remove: Option<Box<MethodSemantics>>,
    },
    /// The event does not exist from the script's point of view
    NotUsableFromScript,
}

impl EventSemantics {
    /// Add/remove accessor methods
    pub fn add_and_remove_methods(
        add: Option<MethodSemantics>,
        remove: Option<MethodSemantics>,
    ) -> Self {
        EventSemantics::AddAndRemoveMethods {
            add: add.map(Box::new),
            remove: remove.map(Box::new),
        }
    }
}

/// How a delegate type's invocations are realized in the emitted script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelegateSemantics {
    /// Expand the final params-array argument into individual arguments
    pub expand_params: bool,
    /// Bind the receiver of a bound method reference to the delegate's first
    /// parameter instead of the script `this`
    pub bind_receiver_to_first_parameter: bool,
}

//! Symbol store for the semantic model
//!
//! The external semantic-model provider registers every declaration of the
//! program (local and referenced modules alike) into a [`SemanticModel`] and
//! hands out [`SymbolId`] handles. Handles are identity-stable for the life
//! of the model; all metadata caches are keyed by them.

use crate::shape::{ParamShape, TypeShape};
use rustc_hash::FxHashMap;
use std::fmt;

/// Unique identifier for a symbol in the semantic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub(crate) u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// Identity of a compiled or referenced module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create a module identity from its name
    pub fn new(name: impl Into<String>) -> Self {
        ModuleId(name.into())
    }

    /// The module's name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declaration kind of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A class, struct or interface
    Type,
    /// A delegate type
    Delegate,
    /// A method
    Method,
    /// A constructor
    Constructor,
    /// A property (possibly an indexer)
    Property,
    /// A field
    Field,
    /// An event
    Event,
}

/// Source-language accessibility of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    /// Visible everywhere
    Public,
    /// Visible to derived types
    Protected,
    /// Visible inside the declaring module only
    Internal,
    /// Visible inside the declaring type only
    Private,
}

impl Accessibility {
    /// Whether a declaration with this accessibility is visible to other
    /// modules
    pub fn is_externally_visible(self) -> bool {
        matches!(self, Accessibility::Public | Accessibility::Protected)
    }
}

/// Structural signature of a member, used for cross-representation matching
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSignature {
    /// Method or constructor signature
    Method {
        /// Number of method-level generic parameters
        generic_arity: u32,
        /// Return type shape (the `void` shape for constructors)
        return_shape: TypeShape,
        /// Parameter shapes in declaration order
        params: Vec<ParamShape>,
    },
    /// Fields match by name only
    Field,
    /// Property signature
    Property {
        /// The property's type shape
        shape: TypeShape,
        /// Index parameter shapes, empty for non-indexers
        index_params: Vec<ParamShape>,
    },
    /// Events match by name only
    Event,
}

/// All facts the metadata core needs about one declaration
#[derive(Debug, Clone)]
pub struct SymbolData {
    /// Declaration kind
    pub kind: SymbolKind,
    /// Simple name
    pub name: String,
    /// Generic parameter count of the declaration itself
    pub arity: u32,
    /// Identity of the declaring module
    pub module: ModuleId,
    /// The containing type, if this is a member or nested type
    pub containing_type: Option<SymbolId>,
    /// Accessibility level
    pub accessibility: Accessibility,
    /// Namespace path (types only)
    pub namespace: Vec<String>,
    /// Direct base type (types only)
    pub base: Option<SymbolId>,
    /// Directly implemented interfaces (types only)
    pub interfaces: Vec<SymbolId>,
    /// Structural signature (members only)
    pub signature: Option<MemberSignature>,
}

impl SymbolData {
    /// A type declaration with no base, interfaces or container
    pub fn new_type(
        module: ModuleId,
        namespace: Vec<String>,
        name: impl Into<String>,
        arity: u32,
    ) -> Self {
        SymbolData {
            kind: SymbolKind::Type,
            name: name.into(),
            arity,
            module,
            containing_type: None,
            accessibility: Accessibility::Public,
            namespace,
            base: None,
            interfaces: Vec::new(),
            signature: None,
        }
    }

    /// A delegate type declaration
    pub fn new_delegate(
        module: ModuleId,
        namespace: Vec<String>,
        name: impl Into<String>,
        arity: u32,
    ) -> Self {
        SymbolData {
            kind: SymbolKind::Delegate,
            ..SymbolData::new_type(module, namespace, name, arity)
        }
    }

    /// A member declaration of the given kind
    pub fn new_member(
        kind: SymbolKind,
        containing_type: SymbolId,
        module: ModuleId,
        name: impl Into<String>,
        signature: MemberSignature,
    ) -> Self {
        SymbolData {
            kind,
            name: name.into(),
            arity: 0,
            module,
            containing_type: Some(containing_type),
            accessibility: Accessibility::Public,
            namespace: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            signature: None,
        }
        .with_signature(signature)
    }

    /// Set the structural signature
    pub fn with_signature(mut self, signature: MemberSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Set the accessibility level
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Set the direct base type
    pub fn with_base(mut self, base: SymbolId) -> Self {
        self.base = Some(base);
        self
    }

    /// Set the implemented interfaces
    pub fn with_interfaces(mut self, interfaces: Vec<SymbolId>) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Set the containing type (nested types and members)
    pub fn with_containing_type(mut self, containing: SymbolId) -> Self {
        self.containing_type = Some(containing);
        self
    }
}

/// The program-wide symbol table
///
/// Owned by the compilation run; populated once by the semantic-model
/// provider, then read-only while metadata decisions are assigned and
/// queried.
#[derive(Debug, Default)]
pub struct SemanticModel {
    symbols: Vec<SymbolData>,
    members: FxHashMap<SymbolId, Vec<SymbolId>>,
}

impl SemanticModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration and return its handle
    pub fn add_symbol(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        if let Some(container) = data.containing_type {
            self.members.entry(container).or_default().push(id);
        }
        self.symbols.push(data);
        id
    }

    /// Look up a symbol's data
    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.0 as usize]
    }

    /// Patch a type's base edge. Providers register types before all edges
    /// are resolvable, so edges can be installed after the fact.
    pub fn set_base(&mut self, ty: SymbolId, base: Option<SymbolId>) {
        self.symbols[ty.0 as usize].base = base;
    }

    /// Add an implemented-interface edge to a type
    pub fn add_interface(&mut self, ty: SymbolId, interface: SymbolId) {
        self.symbols[ty.0 as usize].interfaces.push(interface);
    }

    /// All type and delegate symbols declared by `module`, in registration
    /// order
    pub fn types_in(&self, module: &ModuleId) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                matches!(s.kind, SymbolKind::Type | SymbolKind::Delegate) && s.module == *module
            })
            .map(|(i, _)| SymbolId(i as u32))
            .collect()
    }

    /// Direct members (and nested types) of a type, in registration order
    pub fn members_of(&self, ty: SymbolId) -> &[SymbolId] {
        self.members.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The preparation dependencies of a type: base type, implemented
    /// interfaces, and containing type
    pub fn dependency_edges(&self, ty: SymbolId) -> Vec<SymbolId> {
        let data = self.symbol(ty);
        let mut edges = Vec::new();
        if let Some(base) = data.base {
            edges.push(base);
        }
        edges.extend(data.interfaces.iter().copied());
        if let Some(containing) = data.containing_type {
            edges.push(containing);
        }
        edges
    }

    /// The structural shape of a type symbol, open (no type arguments)
    pub fn type_shape_of(&self, ty: SymbolId) -> TypeShape {
        let data = self.symbol(ty);
        TypeShape::Named {
            module: data.module.clone(),
            namespace: data.namespace.clone(),
            name: data.name.clone(),
            containing: data
                .containing_type
                .map(|outer| Box::new(self.type_shape_of(outer))),
            type_args: Vec::new(),
        }
    }

    /// Namespace-and-container qualified name, for diagnostics
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let data = self.symbol(id);
        match data.containing_type {
            Some(outer) => format!("{}.{}", self.qualified_name(outer), data.name),
            None if data.namespace.is_empty() => data.name.clone(),
            None => format!("{}.{}", data.namespace.join("."), data.name),
        }
    }

    /// Whether the declaration and its whole containing chain are visible
    /// outside the declaring module
    pub fn is_externally_visible(&self, id: SymbolId) -> bool {
        let data = self.symbol(id);
        if !data.accessibility.is_externally_visible() {
            return false;
        }
        match data.containing_type {
            Some(outer) => self.is_externally_visible(outer),
            None => true,
        }
    }

    /// Number of registered symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the model is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

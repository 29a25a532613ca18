//! Program-level metadata facade
//!
//! One front door for codegen and the naming layer: local and referenced
//! symbols answer the same queries, dispatched on the symbol's declaring
//! module. Mutation (set, reserve, prepare) is only valid against the
//! module under compilation; referenced modules are immutable and reject it
//! with `NotSupported`.

use crate::diagnostics::{codes, Diagnostic, Diagnostics};
use crate::error::MetaError;
use crate::local::LocalMetadataImporter;
use crate::reference::ReferenceMetadataImporter;
use opal_record::CompiledModule;
use opal_semantics::{
    ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics, MethodSemantics,
    ModuleId, PropertySemantics, SemanticModel, SymbolId, TypeSemantics,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Composition of the local importer and all reference importers
pub struct ProgramMetadata<'a> {
    model: &'a SemanticModel,
    local: LocalMetadataImporter<'a>,
    references: FxHashMap<ModuleId, ReferenceMetadataImporter<'a>>,
    diagnostics: Diagnostics,
}

impl<'a> ProgramMetadata<'a> {
    /// A new facade for compiling `local_module`
    pub fn new(model: &'a SemanticModel, local_module: ModuleId) -> Self {
        ProgramMetadata {
            model,
            local: LocalMetadataImporter::new(model, local_module),
            references: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Register an already-compiled module the program references
    pub fn add_reference(&mut self, module: CompiledModule) {
        let id = module.id.clone();
        self.references
            .insert(id, ReferenceMetadataImporter::new(self.model, module));
    }

    /// The importer for the module under compilation
    pub fn local(&self) -> &LocalMetadataImporter<'a> {
        &self.local
    }

    /// Mutable access to the local importer (decision assignment and the
    /// persistence writer)
    pub fn local_mut(&mut self) -> &mut LocalMetadataImporter<'a> {
        &mut self.local
    }

    /// Does the symbol belong to the module under compilation?
    pub fn is_local(&self, symbol: SymbolId) -> bool {
        self.model.symbol(symbol).module == *self.local.module_id()
    }

    fn not_supported(&self, operation: &'static str, symbol: SymbolId) -> MetaError {
        MetaError::NotSupported {
            operation,
            module: self.model.symbol(symbol).module.to_string(),
        }
    }

    fn report_unknown_module(&mut self, symbol: SymbolId) {
        let module = self.model.symbol(symbol).module.clone();
        self.diagnostics.push(
            Diagnostic::internal(
                codes::UNKNOWN_MODULE,
                format!("no reference importer was registered for module {module}"),
            )
            .with_subject(self.model.qualified_name(symbol)),
        );
    }

    fn reference_for(&mut self, symbol: SymbolId) -> Option<&mut ReferenceMetadataImporter<'a>> {
        let module = self.model.symbol(symbol).module.clone();
        self.references.get_mut(&module)
    }

    /// The type's decision, local or referenced; total
    pub fn type_semantics(&mut self, symbol: SymbolId) -> TypeSemantics {
        if self.is_local(symbol) {
            return self.local.type_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.type_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                TypeSemantics::NotUsableFromScript
            }
        }
    }

    /// The method's decision, local or referenced; total
    pub fn method_semantics(&mut self, symbol: SymbolId) -> MethodSemantics {
        if self.is_local(symbol) {
            return self.local.method_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.method_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                MethodSemantics::NotUsableFromScript
            }
        }
    }

    /// The constructor's decision, local or referenced; total
    pub fn constructor_semantics(&mut self, symbol: SymbolId) -> ConstructorSemantics {
        if self.is_local(symbol) {
            return self.local.constructor_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.constructor_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                ConstructorSemantics::NotUsableFromScript
            }
        }
    }

    /// The property's decision, local or referenced; total
    pub fn property_semantics(&mut self, symbol: SymbolId) -> PropertySemantics {
        if self.is_local(symbol) {
            return self.local.property_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.property_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                PropertySemantics::NotUsableFromScript
            }
        }
    }

    /// The field's decision, local or referenced; total
    pub fn field_semantics(&mut self, symbol: SymbolId) -> FieldSemantics {
        if self.is_local(symbol) {
            return self.local.field_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.field_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                FieldSemantics::NotUsableFromScript
            }
        }
    }

    /// The event's decision, local or referenced; total
    pub fn event_semantics(&mut self, symbol: SymbolId) -> EventSemantics {
        if self.is_local(symbol) {
            return self.local.event_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.event_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                EventSemantics::NotUsableFromScript
            }
        }
    }

    /// The delegate's decision, local or referenced; total
    pub fn delegate_semantics(&mut self, symbol: SymbolId) -> DelegateSemantics {
        if self.is_local(symbol) {
            return self.local.delegate_semantics(symbol);
        }
        match self.reference_for(symbol) {
            Some(reference) => reference.delegate_semantics(symbol),
            None => {
                self.report_unknown_module(symbol);
                DelegateSemantics::default()
            }
        }
    }

    /// Store a local type's decision; `NotSupported` for referenced types
    pub fn set_type_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: TypeSemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_type_semantics", symbol));
        }
        self.local.set_type_semantics(symbol, semantics)
    }

    /// Store a local method's decision; `NotSupported` for referenced
    /// methods
    pub fn set_method_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: MethodSemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_method_semantics", symbol));
        }
        self.local.set_method_semantics(symbol, semantics)
    }

    /// Store a local constructor's decision; `NotSupported` for referenced
    /// constructors
    pub fn set_constructor_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: ConstructorSemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_constructor_semantics", symbol));
        }
        self.local.set_constructor_semantics(symbol, semantics)
    }

    /// Store a local property's decision; `NotSupported` for referenced
    /// properties
    pub fn set_property_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: PropertySemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_property_semantics", symbol));
        }
        self.local.set_property_semantics(symbol, semantics)
    }

    /// Store a local field's decision; `NotSupported` for referenced fields
    pub fn set_field_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: FieldSemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_field_semantics", symbol));
        }
        self.local.set_field_semantics(symbol, semantics)
    }

    /// Store a local event's decision; `NotSupported` for referenced events
    pub fn set_event_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: EventSemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_event_semantics", symbol));
        }
        self.local.set_event_semantics(symbol, semantics)
    }

    /// Store a local delegate's decision; `NotSupported` for referenced
    /// delegates
    pub fn set_delegate_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: DelegateSemantics,
    ) -> Result<(), MetaError> {
        if !self.is_local(symbol) {
            return Err(self.not_supported("set_delegate_semantics", symbol));
        }
        self.local.set_delegate_semantics(symbol, semantics)
    }

    /// Claim a member name on a local type; `NotSupported` for referenced
    /// types
    pub fn reserve_member_name(
        &mut self,
        ty: SymbolId,
        name: &str,
        is_static: bool,
    ) -> Result<(), MetaError> {
        if !self.is_local(ty) {
            return Err(self.not_supported("reserve_member_name", ty));
        }
        self.local.reserve_member_name(ty, name, is_static);
        Ok(())
    }

    /// Is `name` free on the local type `ty`? `NotSupported` for referenced
    /// types (their name-space data is read from persisted records instead)
    pub fn is_member_name_available(
        &mut self,
        ty: SymbolId,
        name: &str,
        is_static: bool,
    ) -> Result<bool, MetaError> {
        if !self.is_local(ty) {
            return Err(self.not_supported("is_member_name_available", ty));
        }
        if !is_static {
            self.seed_foreign_dependencies(ty);
        }
        Ok(self.local.is_member_name_available(ty, name, is_static))
    }

    /// Finalize a local type for lookup; `NotSupported` for referenced types
    ///
    /// Reserved instance-name sets of the type's foreign dependencies are
    /// pulled from the persisted records first, so the availability walk
    /// sees final data for the whole inheritance graph.
    pub fn prepare(&mut self, ty: SymbolId) -> Result<(), MetaError> {
        if !self.is_local(ty) {
            return Err(self.not_supported("prepare", ty));
        }
        self.seed_foreign_dependencies(ty);
        self.local.prepare(ty)
    }

    /// Serialize the local module's decisions into its compiled form
    pub fn write_module(&mut self, module: &mut CompiledModule) -> Result<(), MetaError> {
        crate::writer::write_module(self.model, &mut self.local, module)
    }

    /// Compute the local module's preparation order
    pub fn preparation_order(&self) -> Result<Vec<SymbolId>, MetaError> {
        crate::local::preparation_order(self.model, self.local.module_id())
    }

    /// Walk the base/interface graph from `ty` and seed the local importer
    /// with every reachable foreign type's persisted reserved-name set
    fn seed_foreign_dependencies(&mut self, ty: SymbolId) {
        let mut visited = FxHashSet::default();
        let mut pending = vec![ty];
        let mut foreign = Vec::new();
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let data = self.model.symbol(current);
            if data.module != *self.local.module_id() {
                foreign.push(current);
            }
            pending.extend(data.base);
            pending.extend(data.interfaces.iter().copied());
        }

        for symbol in foreign {
            if self.local.reserved_instance_names(symbol).is_some() {
                continue;
            }
            let names = match self.reference_for(symbol) {
                Some(reference) => reference.reserved_instance_names(symbol),
                None => {
                    self.report_unknown_module(symbol);
                    FxHashSet::default()
                }
            };
            self.local.seed_reserved_instance_names(symbol, names);
        }
    }

    /// Drain diagnostics from the facade, the local importer and every
    /// reference importer, in that order
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let mut sink = Diagnostics::new();
        sink.absorb(&mut self.diagnostics);
        self.local.absorb_diagnostics_into(&mut sink);
        let mut modules: Vec<ModuleId> = self.references.keys().cloned().collect();
        modules.sort();
        for module in modules {
            if let Some(reference) = self.references.get_mut(&module) {
                reference.absorb_diagnostics_into(&mut sink);
            }
        }
        sink.take()
    }
}

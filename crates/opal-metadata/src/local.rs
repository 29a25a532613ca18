//! Local metadata importer
//!
//! Holds the decisions for the module currently being compiled. Decisions
//! are set exactly once by the naming layer, before the declaring type is
//! prepared; afterwards they are immutable and every query is served from
//! the caches. Name reservation follows the prepare protocol: a type's
//! reserved sets are final once `prepare` returns, which is why preparation
//! must happen in dependency order.

use crate::diagnostics::{codes, Diagnostic, Diagnostics};
use crate::error::MetaError;
use opal_graph::{topological_sort, GraphError};
use opal_semantics::{
    ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics, MethodSemantics,
    ModuleId, PropertySemantics, SemanticModel, SymbolId, TypeSemantics,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Compute the order in which the module's types must be prepared
///
/// Nodes are the module's own type (and delegate) declarations; edges are
/// base types, implemented interfaces and containing types. Dependencies on
/// referenced modules are always satisfied (their modules are final) and do
/// not participate. A cycle is an invalid input program and fails the sort.
pub fn preparation_order(
    model: &SemanticModel,
    module: &ModuleId,
) -> Result<Vec<SymbolId>, MetaError> {
    let nodes = model.types_in(module);
    topological_sort(&nodes, |ty| model.dependency_edges(ty)).map_err(|err| {
        let GraphError::CycleDetected(cycle) = err;
        MetaError::DependencyCycle {
            types: cycle.iter().map(|&ty| model.qualified_name(ty)).collect(),
        }
    })
}

/// Decision store for the module under compilation
pub struct LocalMetadataImporter<'a> {
    model: &'a SemanticModel,
    module: ModuleId,
    types: FxHashMap<SymbolId, TypeSemantics>,
    methods: FxHashMap<SymbolId, MethodSemantics>,
    constructors: FxHashMap<SymbolId, ConstructorSemantics>,
    properties: FxHashMap<SymbolId, PropertySemantics>,
    fields: FxHashMap<SymbolId, FieldSemantics>,
    events: FxHashMap<SymbolId, EventSemantics>,
    delegates: FxHashMap<SymbolId, DelegateSemantics>,
    instance_names: FxHashMap<SymbolId, FxHashSet<String>>,
    static_names: FxHashMap<SymbolId, FxHashSet<String>>,
    prepared: FxHashSet<SymbolId>,
    diagnostics: Diagnostics,
}

impl<'a> LocalMetadataImporter<'a> {
    /// A new importer for the given module
    pub fn new(model: &'a SemanticModel, module: ModuleId) -> Self {
        LocalMetadataImporter {
            model,
            module,
            types: FxHashMap::default(),
            methods: FxHashMap::default(),
            constructors: FxHashMap::default(),
            properties: FxHashMap::default(),
            fields: FxHashMap::default(),
            events: FxHashMap::default(),
            delegates: FxHashMap::default(),
            instance_names: FxHashMap::default(),
            static_names: FxHashMap::default(),
            prepared: FxHashSet::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Identity of the module being compiled
    pub fn module_id(&self) -> &ModuleId {
        &self.module
    }

    fn already_set(&self, symbol: SymbolId) -> MetaError {
        MetaError::AlreadySet {
            symbol: self.model.qualified_name(symbol),
        }
    }

    /// Store a type's decision; fails if one was already set
    pub fn set_type_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: TypeSemantics,
    ) -> Result<(), MetaError> {
        if self.types.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.types.insert(symbol, semantics);
        Ok(())
    }

    /// Store a method's decision; fails if one was already set
    pub fn set_method_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: MethodSemantics,
    ) -> Result<(), MetaError> {
        if self.methods.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.methods.insert(symbol, semantics);
        Ok(())
    }

    /// Store a constructor's decision; fails if one was already set
    pub fn set_constructor_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: ConstructorSemantics,
    ) -> Result<(), MetaError> {
        if self.constructors.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.constructors.insert(symbol, semantics);
        Ok(())
    }

    /// Store a property's decision; fails if one was already set
    pub fn set_property_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: PropertySemantics,
    ) -> Result<(), MetaError> {
        if self.properties.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.properties.insert(symbol, semantics);
        Ok(())
    }

    /// Store a field's decision; fails if one was already set
    pub fn set_field_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: FieldSemantics,
    ) -> Result<(), MetaError> {
        if self.fields.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.fields.insert(symbol, semantics);
        Ok(())
    }

    /// Store an event's decision; fails if one was already set
    pub fn set_event_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: EventSemantics,
    ) -> Result<(), MetaError> {
        if self.events.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.events.insert(symbol, semantics);
        Ok(())
    }

    /// Store a delegate's decision; fails if one was already set
    pub fn set_delegate_semantics(
        &mut self,
        symbol: SymbolId,
        semantics: DelegateSemantics,
    ) -> Result<(), MetaError> {
        if self.delegates.contains_key(&symbol) {
            return Err(self.already_set(symbol));
        }
        self.delegates.insert(symbol, semantics);
        Ok(())
    }

    fn report_missing(&mut self, symbol: SymbolId) {
        let name = self.model.qualified_name(symbol);
        self.diagnostics.push(
            Diagnostic::internal(
                codes::MISSING_SEMANTICS,
                format!("no semantics were registered for {name}"),
            )
            .with_subject(name),
        );
    }

    /// The type's decision; total, with a `NotUsableFromScript` fallback
    pub fn type_semantics(&mut self, symbol: SymbolId) -> TypeSemantics {
        match self.types.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                TypeSemantics::NotUsableFromScript
            }
        }
    }

    /// The method's decision; total, with a `NotUsableFromScript` fallback
    pub fn method_semantics(&mut self, symbol: SymbolId) -> MethodSemantics {
        match self.methods.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                MethodSemantics::NotUsableFromScript
            }
        }
    }

    /// The constructor's decision; total, with a `NotUsableFromScript`
    /// fallback
    pub fn constructor_semantics(&mut self, symbol: SymbolId) -> ConstructorSemantics {
        match self.constructors.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                ConstructorSemantics::NotUsableFromScript
            }
        }
    }

    /// The property's decision; total, with a `NotUsableFromScript` fallback
    pub fn property_semantics(&mut self, symbol: SymbolId) -> PropertySemantics {
        match self.properties.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                PropertySemantics::NotUsableFromScript
            }
        }
    }

    /// The field's decision; total, with a `NotUsableFromScript` fallback
    pub fn field_semantics(&mut self, symbol: SymbolId) -> FieldSemantics {
        match self.fields.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                FieldSemantics::NotUsableFromScript
            }
        }
    }

    /// The event's decision; total, with a `NotUsableFromScript` fallback
    pub fn event_semantics(&mut self, symbol: SymbolId) -> EventSemantics {
        match self.events.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                EventSemantics::NotUsableFromScript
            }
        }
    }

    /// The delegate's decision; total, with an inert default fallback
    pub fn delegate_semantics(&mut self, symbol: SymbolId) -> DelegateSemantics {
        match self.delegates.get(&symbol) {
            Some(s) => s.clone(),
            None => {
                self.report_missing(symbol);
                DelegateSemantics::default()
            }
        }
    }

    /// Claim a member name on a type. Setting a decision never reserves its
    /// name implicitly; the naming layer calls this explicitly.
    pub fn reserve_member_name(&mut self, ty: SymbolId, name: &str, is_static: bool) {
        let sets = if is_static {
            &mut self.static_names
        } else {
            &mut self.instance_names
        };
        sets.entry(ty).or_default().insert(name.to_owned());
    }

    /// Install a referenced type's own reserved instance-name set, read from
    /// its persisted record. First install wins; the referenced module never
    /// changes during a run.
    pub fn seed_reserved_instance_names(&mut self, ty: SymbolId, names: FxHashSet<String>) {
        self.instance_names.entry(ty).or_insert(names);
    }

    /// Is `name` free on `ty`?
    ///
    /// Instance names collide with any name reserved on the type or on a
    /// transitively reachable base type or implemented interface. Static
    /// names are per-type only and never collide across inheritance.
    pub fn is_member_name_available(&self, ty: SymbolId, name: &str, is_static: bool) -> bool {
        if is_static {
            return !self
                .static_names
                .get(&ty)
                .is_some_and(|names| names.contains(name));
        }

        let mut visited = FxHashSet::default();
        let mut pending = vec![ty];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            if self
                .instance_names
                .get(&current)
                .is_some_and(|names| names.contains(name))
            {
                return false;
            }
            let data = self.model.symbol(current);
            pending.extend(data.base);
            pending.extend(data.interfaces.iter().copied());
        }
        true
    }

    /// The type's own reserved instance-name set (no inherited names)
    pub fn reserved_instance_names(&self, ty: SymbolId) -> Option<&FxHashSet<String>> {
        self.instance_names.get(&ty)
    }

    /// Whether `prepare` has completed for the type
    pub fn is_prepared(&self, ty: SymbolId) -> bool {
        self.prepared.contains(&ty)
    }

    /// Finalize a type's reserved names for lookup
    ///
    /// Must be called in the order produced by [`preparation_order`]: every
    /// same-module dependency (base type, interface, containing type) must
    /// already be prepared, otherwise a derived type could be assigned names
    /// against an incomplete base set.
    pub fn prepare(&mut self, ty: SymbolId) -> Result<(), MetaError> {
        if self.prepared.contains(&ty) {
            return Err(MetaError::AlreadyPrepared {
                type_name: self.model.qualified_name(ty),
            });
        }
        for dep in self.model.dependency_edges(ty) {
            if self.model.symbol(dep).module == self.module && !self.prepared.contains(&dep) {
                return Err(MetaError::OutOfOrderPreparation {
                    type_name: self.model.qualified_name(ty),
                    dependency: self.model.qualified_name(dep),
                });
            }
        }
        self.instance_names.entry(ty).or_default();
        self.static_names.entry(ty).or_default();
        self.prepared.insert(ty);
        Ok(())
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Drain the collected diagnostics
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    pub(crate) fn absorb_diagnostics_into(&mut self, sink: &mut Diagnostics) {
        sink.absorb(&mut self.diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_semantics::SymbolData;

    fn module_id() -> ModuleId {
        ModuleId::new("app")
    }

    fn model_with_hierarchy() -> (SemanticModel, SymbolId, SymbolId) {
        let mut model = SemanticModel::new();
        let base = model.add_symbol(SymbolData::new_type(module_id(), vec![], "A", 0));
        let derived =
            model.add_symbol(SymbolData::new_type(module_id(), vec![], "B", 0).with_base(base));
        (model, base, derived)
    }

    #[test]
    fn set_twice_fails_with_already_set() {
        let (model, base, _) = model_with_hierarchy();
        let mut importer = LocalMetadataImporter::new(&model, module_id());
        importer
            .set_type_semantics(base, TypeSemantics::normal_type("A"))
            .unwrap();
        let err = importer
            .set_type_semantics(base, TypeSemantics::NotUsableFromScript)
            .unwrap_err();
        assert_eq!(err, MetaError::AlreadySet { symbol: "A".into() });
    }

    #[test]
    fn reserved_instance_name_blocks_derived_types() {
        let (model, base, derived) = model_with_hierarchy();
        let mut importer = LocalMetadataImporter::new(&model, module_id());
        importer.prepare(base).unwrap();
        importer.reserve_member_name(base, "Foo", false);
        importer.prepare(derived).unwrap();

        assert!(!importer.is_member_name_available(derived, "Foo", false));
        assert!(importer.is_member_name_available(derived, "Bar", false));
    }

    #[test]
    fn static_names_do_not_collide_across_inheritance() {
        let (model, base, derived) = model_with_hierarchy();
        let mut importer = LocalMetadataImporter::new(&model, module_id());
        importer.prepare(base).unwrap();
        importer.reserve_member_name(base, "Foo", true);
        importer.prepare(derived).unwrap();

        assert!(importer.is_member_name_available(derived, "Foo", true));
        assert!(!importer.is_member_name_available(base, "Foo", true));
    }

    #[test]
    fn interface_names_are_reachable_through_bases() {
        let mut model = SemanticModel::new();
        let iface = model.add_symbol(SymbolData::new_type(module_id(), vec![], "IThing", 0));
        let mid = model.add_symbol(
            SymbolData::new_type(module_id(), vec![], "Mid", 0).with_interfaces(vec![iface]),
        );
        let leaf =
            model.add_symbol(SymbolData::new_type(module_id(), vec![], "Leaf", 0).with_base(mid));

        let mut importer = LocalMetadataImporter::new(&model, module_id());
        for ty in [iface, mid, leaf] {
            importer.prepare(ty).unwrap();
        }
        importer.reserve_member_name(iface, "dispose", false);
        assert!(!importer.is_member_name_available(leaf, "dispose", false));
    }

    #[test]
    fn out_of_order_prepare_is_rejected() {
        let (model, base, derived) = model_with_hierarchy();
        let mut importer = LocalMetadataImporter::new(&model, module_id());
        let err = importer.prepare(derived).unwrap_err();
        assert_eq!(
            err,
            MetaError::OutOfOrderPreparation {
                type_name: "B".into(),
                dependency: "A".into(),
            }
        );
        importer.prepare(base).unwrap();
        importer.prepare(derived).unwrap();
        let err = importer.prepare(derived).unwrap_err();
        assert_eq!(err, MetaError::AlreadyPrepared { type_name: "B".into() });
    }

    #[test]
    fn missing_decision_falls_back_and_reports_internal_error() {
        let (model, base, _) = model_with_hierarchy();
        let mut importer = LocalMetadataImporter::new(&model, module_id());
        assert_eq!(
            importer.type_semantics(base),
            TypeSemantics::NotUsableFromScript
        );
        assert!(importer.diagnostics().has_internal_errors());
    }

    #[test]
    fn preparation_order_puts_dependencies_first() {
        let (model, base, derived) = model_with_hierarchy();
        let order = preparation_order(&model, &module_id()).unwrap();
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(base) < pos(derived));
    }

    #[test]
    fn base_type_cycle_is_reported_with_names() {
        let mut model = SemanticModel::new();
        let a = model.add_symbol(SymbolData::new_type(module_id(), vec![], "A", 0));
        let b = model.add_symbol(SymbolData::new_type(module_id(), vec![], "B", 0).with_base(a));
        let c = model.add_symbol(SymbolData::new_type(module_id(), vec![], "C", 0).with_base(b));
        model.set_base(a, Some(c));

        let err = preparation_order(&model, &module_id()).unwrap_err();
        match err {
            MetaError::DependencyCycle { mut types } => {
                types.sort();
                assert_eq!(types, vec!["A", "B", "C"]);
            }
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }

    #[test]
    fn name_reservation_does_not_happen_implicitly_on_set() {
        let (model, base, _) = model_with_hierarchy();
        let mut importer = LocalMetadataImporter::new(&model, module_id());
        importer.prepare(base).unwrap();
        importer
            .set_field_semantics(base, FieldSemantics::field("count"))
            .unwrap();
        assert!(importer.is_member_name_available(base, "count", false));
    }
}

//! Reference metadata importer
//!
//! Read-only importer bound to one already-compiled module. Decisions are
//! born lazily: on first query the symbol is matched against the module's
//! member table, the attached record is parsed and decoded, and the result
//! is cached for the rest of the run (the module's contents never change
//! once loaded). An unreadable or absent record means the module was
//! produced by an incompatible compiler version; that declaration degrades
//! to `NotUsableFromScript` with a diagnostic, and compilation continues.

use crate::diagnostics::{codes, Diagnostic, Diagnostics};
use crate::matcher;
use opal_record::{
    codec, AttachedRecord, CompiledModule, CompiledType, MetadataRecord, RecordMarker,
    TypeDefIndex,
};
use opal_semantics::{
    ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics, MethodSemantics,
    ModuleId, PropertySemantics, SemanticModel, SymbolId, TypeSemantics,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Lazy decision reader for one referenced module
pub struct ReferenceMetadataImporter<'a> {
    model: &'a SemanticModel,
    module: CompiledModule,
    types: FxHashMap<SymbolId, TypeSemantics>,
    methods: FxHashMap<SymbolId, MethodSemantics>,
    constructors: FxHashMap<SymbolId, ConstructorSemantics>,
    properties: FxHashMap<SymbolId, PropertySemantics>,
    fields: FxHashMap<SymbolId, FieldSemantics>,
    events: FxHashMap<SymbolId, EventSemantics>,
    delegates: FxHashMap<SymbolId, DelegateSemantics>,
    reserved: FxHashMap<SymbolId, FxHashSet<String>>,
    type_defs: FxHashMap<SymbolId, Option<TypeDefIndex>>,
    diagnostics: Diagnostics,
}

impl<'a> ReferenceMetadataImporter<'a> {
    /// Bind an importer to a loaded module
    pub fn new(model: &'a SemanticModel, module: CompiledModule) -> Self {
        ReferenceMetadataImporter {
            model,
            module,
            types: FxHashMap::default(),
            methods: FxHashMap::default(),
            constructors: FxHashMap::default(),
            properties: FxHashMap::default(),
            fields: FxHashMap::default(),
            events: FxHashMap::default(),
            delegates: FxHashMap::default(),
            reserved: FxHashMap::default(),
            type_defs: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Identity of the referenced module
    pub fn module_id(&self) -> &ModuleId {
        &self.module.id
    }

    fn report_match_failure(&mut self, symbol: SymbolId, detail: String) {
        let name = self.model.qualified_name(symbol);
        self.diagnostics
            .push(Diagnostic::internal(codes::MATCH_FAILED, detail).with_subject(name));
    }

    fn report_unreadable(&mut self, symbol: SymbolId, detail: String) {
        let name = self.model.qualified_name(symbol);
        self.diagnostics.push(
            Diagnostic::error(
                codes::MALFORMED_RECORD,
                format!(
                    "the semantics of {name} in referenced module {} could not be read \
                     ({detail}); the module may have been produced by an incompatible \
                     compiler version",
                    self.module.id
                ),
            )
            .with_subject(name),
        );
    }

    fn report_absent(&mut self, symbol: SymbolId) {
        let name = self.model.qualified_name(symbol);
        self.diagnostics.push(
            Diagnostic::error(
                codes::MISSING_RECORD,
                format!(
                    "referenced module {} carries no semantics record for {name}; the \
                     module may have been produced by an incompatible compiler version",
                    self.module.id
                ),
            )
            .with_subject(name),
        );
    }

    /// Memoized type-definition lookup for a type symbol
    fn locate_type(&mut self, ty: SymbolId) -> Option<TypeDefIndex> {
        if let Some(cached) = self.type_defs.get(&ty) {
            return *cached;
        }
        let result = match matcher::match_type(self.model, ty, &self.module) {
            Ok(idx) => Some(idx),
            Err(err) => {
                self.report_match_failure(ty, err.to_string());
                None
            }
        };
        self.type_defs.insert(ty, result);
        result
    }

    /// Type definition of a member symbol's containing type
    fn locate_containing(&mut self, member: SymbolId) -> Option<TypeDefIndex> {
        match self.model.symbol(member).containing_type {
            Some(ty) => self.locate_type(ty),
            None => {
                self.report_match_failure(member, "member has no containing type".into());
                None
            }
        }
    }

    /// Parse a member's semantics record; reports and returns `None` on
    /// absent or unreadable records
    fn parse_semantics_record(
        &mut self,
        symbol: SymbolId,
        attached: Option<&AttachedRecord>,
    ) -> Option<MetadataRecord> {
        let attached = match attached {
            Some(a) => a.clone(),
            None => {
                self.report_absent(symbol);
                return None;
            }
        };
        match attached.parse() {
            Ok(record) => Some(record),
            Err(err) => {
                self.report_unreadable(symbol, err.to_string());
                None
            }
        }
    }

    /// The type's decision; total, cached after the first query
    pub fn type_semantics(&mut self, symbol: SymbolId) -> TypeSemantics {
        if let Some(cached) = self.types.get(&symbol) {
            return cached.clone();
        }
        let decoded = self.locate_type(symbol).and_then(|idx| {
            let attached = self
                .module
                .type_def(idx)
                .record(RecordMarker::ScriptSemantics)
                .cloned();
            let record = self.parse_semantics_record(symbol, attached.as_ref())?;
            match codec::decode_type(&record) {
                Ok(semantics) => Some(semantics),
                Err(err) => {
                    self.report_unreadable(symbol, err.to_string());
                    None
                }
            }
        });
        let semantics = decoded.unwrap_or(TypeSemantics::NotUsableFromScript);
        self.types.insert(symbol, semantics.clone());
        semantics
    }

    /// The delegate's decision, stored on its type definition; total
    pub fn delegate_semantics(&mut self, symbol: SymbolId) -> DelegateSemantics {
        if let Some(cached) = self.delegates.get(&symbol) {
            return cached.clone();
        }
        let decoded = self.locate_type(symbol).and_then(|idx| {
            let attached = self
                .module
                .type_def(idx)
                .record(RecordMarker::ScriptSemantics)
                .cloned();
            let record = self.parse_semantics_record(symbol, attached.as_ref())?;
            match codec::decode_delegate(&record) {
                Ok(semantics) => Some(semantics),
                Err(err) => {
                    self.report_unreadable(symbol, err.to_string());
                    None
                }
            }
        });
        let semantics = decoded.unwrap_or_default();
        self.delegates.insert(symbol, semantics.clone());
        semantics
    }

    fn member_record(
        &mut self,
        symbol: SymbolId,
        locate: impl Fn(&SemanticModel, SymbolId, &CompiledType) -> Result<Option<AttachedRecord>, String>,
    ) -> Option<MetadataRecord> {
        let idx = self.locate_containing(symbol)?;
        let located = locate(self.model, symbol, self.module.type_def(idx));
        match located {
            Ok(attached) => self.parse_semantics_record(symbol, attached.as_ref()),
            Err(detail) => {
                self.report_match_failure(symbol, detail);
                None
            }
        }
    }

    /// The method's decision; total, cached after the first query
    pub fn method_semantics(&mut self, symbol: SymbolId) -> MethodSemantics {
        if let Some(cached) = self.methods.get(&symbol) {
            return cached.clone();
        }
        let record = self.member_record(symbol, |model, sym, ty| {
            let i = matcher::match_method(model, sym, ty).map_err(|e| e.to_string())?;
            Ok(ty.methods[i].record(RecordMarker::ScriptSemantics).cloned())
        });
        let decoded = record.and_then(|r| match codec::decode_method(&r) {
            Ok(semantics) => Some(semantics),
            Err(err) => {
                self.report_unreadable(symbol, err.to_string());
                None
            }
        });
        let semantics = decoded.unwrap_or(MethodSemantics::NotUsableFromScript);
        self.methods.insert(symbol, semantics.clone());
        semantics
    }

    /// The constructor's decision; total, cached after the first query
    pub fn constructor_semantics(&mut self, symbol: SymbolId) -> ConstructorSemantics {
        if let Some(cached) = self.constructors.get(&symbol) {
            return cached.clone();
        }
        let record = self.member_record(symbol, |model, sym, ty| {
            let i = matcher::match_method(model, sym, ty).map_err(|e| e.to_string())?;
            Ok(ty.methods[i].record(RecordMarker::ScriptSemantics).cloned())
        });
        let decoded = record.and_then(|r| match codec::decode_constructor(&r) {
            Ok(semantics) => Some(semantics),
            Err(err) => {
                self.report_unreadable(symbol, err.to_string());
                None
            }
        });
        let semantics = decoded.unwrap_or(ConstructorSemantics::NotUsableFromScript);
        self.constructors.insert(symbol, semantics.clone());
        semantics
    }

    /// The property's decision; total, cached after the first query
    pub fn property_semantics(&mut self, symbol: SymbolId) -> PropertySemantics {
        if let Some(cached) = self.properties.get(&symbol) {
            return cached.clone();
        }
        let record = self.member_record(symbol, |model, sym, ty| {
            let i = matcher::match_property(model, sym, ty).map_err(|e| e.to_string())?;
            Ok(ty.properties[i]
                .record(RecordMarker::ScriptSemantics)
                .cloned())
        });
        let decoded = record.and_then(|r| match codec::decode_property(&r) {
            Ok(semantics) => Some(semantics),
            Err(err) => {
                self.report_unreadable(symbol, err.to_string());
                None
            }
        });
        let semantics = decoded.unwrap_or(PropertySemantics::NotUsableFromScript);
        self.properties.insert(symbol, semantics.clone());
        semantics
    }

    /// The field's decision; total, cached after the first query
    pub fn field_semantics(&mut self, symbol: SymbolId) -> FieldSemantics {
        if let Some(cached) = self.fields.get(&symbol) {
            return cached.clone();
        }
        let record = self.member_record(symbol, |model, sym, ty| {
            let i = matcher::match_field(model, sym, ty).map_err(|e| e.to_string())?;
            Ok(ty.fields[i].record(RecordMarker::ScriptSemantics).cloned())
        });
        let decoded = record.and_then(|r| match codec::decode_field(&r) {
            Ok(semantics) => Some(semantics),
            Err(err) => {
                self.report_unreadable(symbol, err.to_string());
                None
            }
        });
        let semantics = decoded.unwrap_or(FieldSemantics::NotUsableFromScript);
        self.fields.insert(symbol, semantics.clone());
        semantics
    }

    /// The event's decision; total, cached after the first query
    pub fn event_semantics(&mut self, symbol: SymbolId) -> EventSemantics {
        if let Some(cached) = self.events.get(&symbol) {
            return cached.clone();
        }
        let record = self.member_record(symbol, |model, sym, ty| {
            let i = matcher::match_event(model, sym, ty).map_err(|e| e.to_string())?;
            Ok(ty.events[i].record(RecordMarker::ScriptSemantics).cloned())
        });
        let decoded = record.and_then(|r| match codec::decode_event(&r) {
            Ok(semantics) => Some(semantics),
            Err(err) => {
                self.report_unreadable(symbol, err.to_string());
                None
            }
        });
        let semantics = decoded.unwrap_or(EventSemantics::NotUsableFromScript);
        self.events.insert(symbol, semantics.clone());
        semantics
    }

    /// The type's own persisted reserved instance-name set
    ///
    /// An absent or unreadable record degrades to the empty set with a
    /// diagnostic; derived types compiled against such a module simply lose
    /// collision protection for that one base.
    pub fn reserved_instance_names(&mut self, ty: SymbolId) -> FxHashSet<String> {
        if let Some(cached) = self.reserved.get(&ty) {
            return cached.clone();
        }
        let decoded = self.locate_type(ty).and_then(|idx| {
            let attached = self
                .module
                .type_def(idx)
                .record(RecordMarker::ReservedNames)
                .cloned();
            let record = self.parse_semantics_record(ty, attached.as_ref())?;
            match codec::decode_reserved_names(&record) {
                Ok(names) => Some(names.into_iter().collect::<FxHashSet<String>>()),
                Err(err) => {
                    self.report_unreadable(ty, err.to_string());
                    None
                }
            }
        });
        let names = decoded.unwrap_or_default();
        self.reserved.insert(ty, names.clone());
        names
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

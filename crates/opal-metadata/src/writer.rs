//! Persistence of metadata decisions into a compiled module
//!
//! After code generation the decisions held by the local importer are
//! serialized and attached to the module's type and member definitions, so
//! later compilations can read them back through the reference importer.
//! Every externally visible declaration gets a record; internal and private
//! declarations are skipped, their decisions die with the compilation.

use crate::error::{MatchError, MetaError};
use crate::local::LocalMetadataImporter;
use crate::matcher::{match_event, match_field, match_method, match_property, match_type};
use opal_record::codec::{
    encode_constructor, encode_delegate, encode_event, encode_field, encode_method,
    encode_property, encode_reserved_names, encode_type,
};
use opal_record::{AttachedRecord, CompiledModule, MetadataRecord, RecordMarker, TypeDefIndex};
use opal_semantics::{SemanticModel, SymbolId, SymbolKind};

fn attach(records: &mut Vec<AttachedRecord>, marker: RecordMarker, record: &MetadataRecord) {
    records.push(AttachedRecord::new(marker, record));
}

// The module under construction was built from the same model the decisions
// were made against, so a declaration the matcher cannot locate means the
// module builder and the model disagree about what was compiled.
fn builder_disagreement(err: MatchError) -> MetaError {
    MetaError::InternalError(format!(
        "compiled module is missing a definition for {err}"
    ))
}

/// Attach every externally visible decision of the local module to `module`
///
/// The module must contain definitions for all visible declarations of the
/// semantic model; a declaration the matcher cannot resolve to a unique
/// definition aborts the write, since it means the compiler emitted a
/// module that disagrees with its own model.
pub fn write_module(
    model: &SemanticModel,
    local: &mut LocalMetadataImporter<'_>,
    module: &mut CompiledModule,
) -> Result<(), MetaError> {
    for ty in model.types_in(local.module_id()) {
        if !model.is_externally_visible(ty) {
            continue;
        }
        let idx = match_type(model, ty, module).map_err(builder_disagreement)?;

        match model.symbol(ty).kind {
            SymbolKind::Delegate => {
                let record = encode_delegate(&local.delegate_semantics(ty));
                attach(
                    &mut module.type_def_mut(idx).records,
                    RecordMarker::ScriptSemantics,
                    &record,
                );
                continue;
            }
            _ => {
                let record = encode_type(&local.type_semantics(ty));
                let reserved = encode_reserved_names(
                    local
                        .reserved_instance_names(ty)
                        .into_iter()
                        .flatten()
                        .map(String::as_str),
                );
                let def = module.type_def_mut(idx);
                attach(&mut def.records, RecordMarker::ScriptSemantics, &record);
                attach(&mut def.records, RecordMarker::ReservedNames, &reserved);
            }
        }

        for &member in model.members_of(ty) {
            if !model.is_externally_visible(member) {
                continue;
            }
            write_member(model, local, module, idx, member)?;
        }
    }
    Ok(())
}

fn write_member(
    model: &SemanticModel,
    local: &mut LocalMetadataImporter<'_>,
    module: &mut CompiledModule,
    ty: TypeDefIndex,
    member: SymbolId,
) -> Result<(), MetaError> {
    match model.symbol(member).kind {
        SymbolKind::Method => {
            let record = encode_method(&local.method_semantics(member));
            let i = match_method(model, member, module.type_def(ty)).map_err(builder_disagreement)?;
            attach(
                &mut module.type_def_mut(ty).methods[i].records,
                RecordMarker::ScriptSemantics,
                &record,
            );
        }
        SymbolKind::Constructor => {
            let record = encode_constructor(&local.constructor_semantics(member));
            let i = match_method(model, member, module.type_def(ty)).map_err(builder_disagreement)?;
            attach(
                &mut module.type_def_mut(ty).methods[i].records,
                RecordMarker::ScriptSemantics,
                &record,
            );
        }
        SymbolKind::Property => {
            let record = encode_property(&local.property_semantics(member));
            let i = match_property(model, member, module.type_def(ty)).map_err(builder_disagreement)?;
            attach(
                &mut module.type_def_mut(ty).properties[i].records,
                RecordMarker::ScriptSemantics,
                &record,
            );
        }
        SymbolKind::Field => {
            let record = encode_field(&local.field_semantics(member));
            let i = match_field(model, member, module.type_def(ty)).map_err(builder_disagreement)?;
            attach(
                &mut module.type_def_mut(ty).fields[i].records,
                RecordMarker::ScriptSemantics,
                &record,
            );
        }
        SymbolKind::Event => {
            let record = encode_event(&local.event_semantics(member));
            let i = match_event(model, member, module.type_def(ty)).map_err(builder_disagreement)?;
            attach(
                &mut module.type_def_mut(ty).events[i].records,
                RecordMarker::ScriptSemantics,
                &record,
            );
        }
        // Nested types are visited by the type loop
        SymbolKind::Type | SymbolKind::Delegate => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_record::codec::{decode_method, decode_reserved_names, decode_type};
    use opal_record::{CompiledType, MethodDef};
    use opal_semantics::{
        Accessibility, MemberSignature, MethodSemantics, ModuleId, SymbolData, TypeSemantics,
        TypeShape,
    };

    fn module_id() -> ModuleId {
        ModuleId::new("app")
    }

    fn void_shape() -> TypeShape {
        TypeShape::named(module_id(), vec!["Sys".into()], "Void")
    }

    fn model_with_type_and_method() -> (SemanticModel, SymbolId, SymbolId) {
        let mut model = SemanticModel::new();
        let ty = model.add_symbol(SymbolData::new_type(module_id(), vec![], "Widget", 0));
        let m = model.add_symbol(SymbolData::new_member(
            SymbolKind::Method,
            ty,
            module_id(),
            "render",
            MemberSignature::Method {
                generic_arity: 0,
                return_shape: void_shape(),
                params: vec![],
            },
        ));
        (model, ty, m)
    }

    fn module_with_widget() -> CompiledModule {
        let mut module = CompiledModule::new(module_id());
        let mut widget = CompiledType::new(vec![], "Widget", 0);
        widget.methods.push(MethodDef {
            name: "render".into(),
            generic_arity: 0,
            return_shape: void_shape(),
            params: vec![],
            records: Vec::new(),
        });
        module.add_type(widget);
        module
    }

    #[test]
    fn visible_decisions_are_attached_and_round_trip() {
        let (model, ty, m) = model_with_type_and_method();
        let mut local = LocalMetadataImporter::new(&model, module_id());
        local
            .set_type_semantics(ty, TypeSemantics::normal_type("Widget"))
            .unwrap();
        local
            .set_method_semantics(m, MethodSemantics::normal("render"))
            .unwrap();
        local.reserve_member_name(ty, "render", false);
        local.prepare(ty).unwrap();

        let mut module = module_with_widget();
        write_module(&model, &mut local, &mut module).unwrap();

        let def = module.type_def(TypeDefIndex(0));
        let type_record = def.record(RecordMarker::ScriptSemantics).unwrap();
        assert_eq!(
            decode_type(&type_record.parse().unwrap()).unwrap(),
            TypeSemantics::normal_type("Widget")
        );
        let names = def.record(RecordMarker::ReservedNames).unwrap();
        assert_eq!(
            decode_reserved_names(&names.parse().unwrap()).unwrap(),
            vec!["render".to_string()]
        );
        let method_record = def.methods[0].record(RecordMarker::ScriptSemantics).unwrap();
        assert_eq!(
            decode_method(&method_record.parse().unwrap()).unwrap(),
            MethodSemantics::normal("render")
        );
    }

    #[test]
    fn invisible_declarations_get_no_records() {
        let mut model = SemanticModel::new();
        let ty = model.add_symbol(
            SymbolData::new_type(module_id(), vec![], "Helper", 0)
                .with_accessibility(Accessibility::Internal),
        );
        let mut local = LocalMetadataImporter::new(&model, module_id());
        local
            .set_type_semantics(ty, TypeSemantics::normal_type("Helper"))
            .unwrap();

        let mut module = CompiledModule::new(module_id());
        module.add_type(CompiledType::new(vec![], "Helper", 0));
        write_module(&model, &mut local, &mut module).unwrap();

        let def = module.type_def(TypeDefIndex(0));
        assert!(def.record(RecordMarker::ScriptSemantics).is_none());
        assert!(def.record(RecordMarker::ReservedNames).is_none());
    }

    #[test]
    fn unmatched_declaration_aborts_the_write() {
        let (model, ty, _) = model_with_type_and_method();
        let mut local = LocalMetadataImporter::new(&model, module_id());
        local
            .set_type_semantics(ty, TypeSemantics::normal_type("Widget"))
            .unwrap();

        // The module contains the type but not the method definition
        let mut module = CompiledModule::new(module_id());
        module.add_type(CompiledType::new(vec![], "Widget", 0));

        let err = write_module(&model, &mut local, &mut module).unwrap_err();
        assert!(matches!(err, MetaError::InternalError(_)));
    }

    #[test]
    fn unset_decisions_persist_as_not_usable() {
        let (model, _, _) = model_with_type_and_method();
        let mut local = LocalMetadataImporter::new(&model, module_id());
        let mut module = module_with_widget();
        write_module(&model, &mut local, &mut module).unwrap();

        let def = module.type_def(TypeDefIndex(0));
        let record = def.record(RecordMarker::ScriptSemantics).unwrap();
        assert_eq!(
            decode_type(&record.parse().unwrap()).unwrap(),
            TypeSemantics::NotUsableFromScript
        );
        // The fallback was reported, not silently invented
        assert!(local.diagnostics().has_internal_errors());
    }
}

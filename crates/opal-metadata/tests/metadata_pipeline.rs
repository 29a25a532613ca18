//! End-to-end pipeline: decide, persist, read back in a later compilation.

use opal_metadata::diagnostics::codes;
use opal_metadata::{MetaError, ProgramMetadata, Severity};
use opal_record::{
    AttachedRecord, CompiledModule, CompiledType, EventDef, FieldDef, MetadataRecord, MethodDef,
    PropertyDef, RecordMarker, RecordValue, TypeDefIndex,
};
use opal_semantics::{
    ConstantValue, ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics,
    MemberSignature, MethodSemantics, ModuleId, ParamShape, PropertySemantics, SemanticModel,
    SymbolData, SymbolId, SymbolKind, TypeSemantics, TypeShape,
};

fn lib_id() -> ModuleId {
    ModuleId::new("sys.ui")
}

fn app_id() -> ModuleId {
    ModuleId::new("app")
}

fn void_shape() -> TypeShape {
    TypeShape::named(lib_id(), vec!["Sys".into()], "Void")
}

fn string_shape() -> TypeShape {
    TypeShape::named(lib_id(), vec!["Sys".into()], "String")
}

/// The library-side declarations: a Control class with one member of each
/// kind, plus a delegate.
struct LibSymbols {
    control: SymbolId,
    focus: SymbolId,
    ctor: SymbolId,
    text: SymbolId,
    count: SymbolId,
    changed: SymbolId,
    callback: SymbolId,
}

fn build_lib(model: &mut SemanticModel) -> LibSymbols {
    let control = model.add_symbol(SymbolData::new_type(
        lib_id(),
        vec!["Sys".into(), "UI".into()],
        "Control",
        0,
    ));
    let focus = model.add_symbol(SymbolData::new_member(
        SymbolKind::Method,
        control,
        lib_id(),
        "Focus",
        MemberSignature::Method {
            generic_arity: 0,
            return_shape: void_shape(),
            params: vec![],
        },
    ));
    let ctor = model.add_symbol(SymbolData::new_member(
        SymbolKind::Constructor,
        control,
        lib_id(),
        ".ctor",
        MemberSignature::Method {
            generic_arity: 0,
            return_shape: void_shape(),
            params: vec![ParamShape::by_value(string_shape())],
        },
    ));
    let text = model.add_symbol(SymbolData::new_member(
        SymbolKind::Property,
        control,
        lib_id(),
        "Text",
        MemberSignature::Property {
            shape: string_shape(),
            index_params: vec![],
        },
    ));
    let count = model.add_symbol(SymbolData::new_member(
        SymbolKind::Field,
        control,
        lib_id(),
        "Count",
        MemberSignature::Field,
    ));
    let changed = model.add_symbol(SymbolData::new_member(
        SymbolKind::Event,
        control,
        lib_id(),
        "Changed",
        MemberSignature::Event,
    ));
    let callback = model.add_symbol(SymbolData::new_delegate(
        lib_id(),
        vec!["Sys".into(), "UI".into()],
        "Callback",
        0,
    ));
    LibSymbols {
        control,
        focus,
        ctor,
        text,
        count,
        changed,
        callback,
    }
}

/// The compiled form of the library, mirroring [`build_lib`].
fn build_lib_module() -> CompiledModule {
    let mut module = CompiledModule::new(lib_id());
    let mut control = CompiledType::new(vec!["Sys".into(), "UI".into()], "Control", 0);
    control.methods.push(MethodDef {
        name: "Focus".into(),
        generic_arity: 0,
        return_shape: void_shape(),
        params: vec![],
        records: Vec::new(),
    });
    control.methods.push(MethodDef {
        name: ".ctor".into(),
        generic_arity: 0,
        return_shape: void_shape(),
        params: vec![(&ParamShape::by_value(string_shape())).into()],
        records: Vec::new(),
    });
    control.properties.push(PropertyDef {
        name: "Text".into(),
        shape: string_shape(),
        index_params: vec![],
        records: Vec::new(),
    });
    control.fields.push(FieldDef {
        name: "Count".into(),
        records: Vec::new(),
    });
    control.events.push(EventDef {
        name: "Changed".into(),
        records: Vec::new(),
    });
    module.add_type(control);
    module.add_type(CompiledType::new(
        vec!["Sys".into(), "UI".into()],
        "Callback",
        0,
    ));
    module
}

fn text_semantics() -> PropertySemantics {
    PropertySemantics::get_and_set_methods(
        Some(MethodSemantics::normal("get_text")),
        Some(MethodSemantics::normal("set_text")),
    )
}

fn changed_semantics() -> EventSemantics {
    EventSemantics::add_and_remove_methods(
        Some(MethodSemantics::normal("add_changed")),
        Some(MethodSemantics::normal("remove_changed")),
    )
}

fn callback_semantics() -> DelegateSemantics {
    DelegateSemantics {
        expand_params: true,
        bind_receiver_to_first_parameter: false,
    }
}

/// Compile the library: decide everything, prepare, persist.
fn compile_lib(model: &SemanticModel, lib: &LibSymbols) -> CompiledModule {
    let mut metadata = ProgramMetadata::new(model, lib_id());
    metadata
        .set_type_semantics(lib.control, TypeSemantics::normal_type("Control"))
        .unwrap();
    metadata
        .set_method_semantics(lib.focus, MethodSemantics::normal("focus"))
        .unwrap();
    metadata
        .set_constructor_semantics(
            lib.ctor,
            ConstructorSemantics::unnamed(),
        )
        .unwrap();
    metadata
        .set_property_semantics(lib.text, text_semantics())
        .unwrap();
    metadata
        .set_field_semantics(
            lib.count,
            FieldSemantics::constant(ConstantValue::Number(0.0), "count"),
        )
        .unwrap();
    metadata
        .set_event_semantics(lib.changed, changed_semantics())
        .unwrap();
    metadata
        .set_delegate_semantics(lib.callback, callback_semantics())
        .unwrap();

    metadata
        .reserve_member_name(lib.control, "focus", false)
        .unwrap();
    metadata
        .reserve_member_name(lib.control, "get_text", false)
        .unwrap();

    for ty in metadata.preparation_order().unwrap() {
        metadata.prepare(ty).unwrap();
    }

    let mut module = build_lib_module();
    metadata.write_module(&mut module).unwrap();
    assert!(metadata.take_diagnostics().is_empty());
    module
}

#[test]
fn decisions_survive_persistence_and_read_back_identically() {
    let mut model = SemanticModel::new();
    let lib = build_lib(&mut model);
    let compiled = compile_lib(&model, &lib);

    let mut metadata = ProgramMetadata::new(&model, app_id());
    metadata.add_reference(compiled);

    assert_eq!(
        metadata.type_semantics(lib.control),
        TypeSemantics::normal_type("Control")
    );
    assert_eq!(
        metadata.method_semantics(lib.focus),
        MethodSemantics::normal("focus")
    );
    assert_eq!(
        metadata.constructor_semantics(lib.ctor),
        ConstructorSemantics::unnamed()
    );
    assert_eq!(metadata.property_semantics(lib.text), text_semantics());
    assert_eq!(
        metadata.field_semantics(lib.count),
        FieldSemantics::constant(ConstantValue::Number(0.0), "count")
    );
    assert_eq!(metadata.event_semantics(lib.changed), changed_semantics());
    assert_eq!(
        metadata.delegate_semantics(lib.callback),
        callback_semantics()
    );
    assert!(metadata.take_diagnostics().is_empty());
}

#[test]
fn referenced_reserved_names_block_collisions_in_derived_types() {
    let mut model = SemanticModel::new();
    let lib = build_lib(&mut model);
    let compiled = compile_lib(&model, &lib);

    let button = model.add_symbol(
        SymbolData::new_type(app_id(), vec![], "Button", 0).with_base(lib.control),
    );

    let mut metadata = ProgramMetadata::new(&model, app_id());
    metadata.add_reference(compiled);
    metadata
        .set_type_semantics(button, TypeSemantics::normal_type("Button"))
        .unwrap();

    assert!(!metadata
        .is_member_name_available(button, "focus", false)
        .unwrap());
    assert!(!metadata
        .is_member_name_available(button, "get_text", false)
        .unwrap());
    assert!(metadata
        .is_member_name_available(button, "blur", false)
        .unwrap());
    // Static names never collide across the inheritance graph
    assert!(metadata
        .is_member_name_available(button, "focus", true)
        .unwrap());

    metadata.prepare(button).unwrap();
    assert!(metadata.take_diagnostics().is_empty());
}

#[test]
fn mutating_a_referenced_module_is_not_supported() {
    let mut model = SemanticModel::new();
    let lib = build_lib(&mut model);
    let compiled = compile_lib(&model, &lib);

    let mut metadata = ProgramMetadata::new(&model, app_id());
    metadata.add_reference(compiled);

    let err = metadata
        .set_type_semantics(lib.control, TypeSemantics::normal_type("Nope"))
        .unwrap_err();
    assert!(matches!(err, MetaError::NotSupported { .. }));
    assert!(matches!(
        metadata.reserve_member_name(lib.control, "x", false),
        Err(MetaError::NotSupported { .. })
    ));
    assert!(matches!(
        metadata.prepare(lib.control),
        Err(MetaError::NotSupported { .. })
    ));
    assert!(matches!(
        metadata.is_member_name_available(lib.control, "x", false),
        Err(MetaError::NotSupported { .. })
    ));
}

#[test]
fn unreadable_records_degrade_to_not_usable_without_stopping_the_run() {
    let mut model = SemanticModel::new();
    let lib = build_lib(&mut model);
    let mut compiled = compile_lib(&model, &lib);

    // A module written by a newer compiler: the method record carries a tag
    // this version does not know.
    let future = MetadataRecord::from_values(vec![RecordValue::Tag(42)]);
    let def = compiled.type_def_mut(TypeDefIndex(0));
    def.methods[0].records.clear();
    def.methods[0]
        .records
        .push(AttachedRecord::new(RecordMarker::ScriptSemantics, &future));

    let mut metadata = ProgramMetadata::new(&model, app_id());
    metadata.add_reference(compiled);

    assert_eq!(
        metadata.method_semantics(lib.focus),
        MethodSemantics::NotUsableFromScript
    );
    // The rest of the module is still readable
    assert_eq!(
        metadata.type_semantics(lib.control),
        TypeSemantics::normal_type("Control")
    );
    assert_eq!(metadata.property_semantics(lib.text), text_semantics());

    let diags = metadata.take_diagnostics();
    assert!(diags
        .iter()
        .any(|d| d.code == codes::MALFORMED_RECORD && d.severity == Severity::Error));
}

#[test]
fn absent_records_are_reported_per_declaration() {
    let mut model = SemanticModel::new();
    let lib = build_lib(&mut model);
    // The library module was compiled without persisting any decisions.
    let compiled = build_lib_module();

    let mut metadata = ProgramMetadata::new(&model, app_id());
    metadata.add_reference(compiled);

    assert_eq!(
        metadata.type_semantics(lib.control),
        TypeSemantics::NotUsableFromScript
    );
    assert_eq!(
        metadata.field_semantics(lib.count),
        FieldSemantics::NotUsableFromScript
    );

    let diags = metadata.take_diagnostics();
    assert_eq!(
        diags
            .iter()
            .filter(|d| d.code == codes::MISSING_RECORD)
            .count(),
        2
    );
}

#[test]
fn unregistered_modules_are_an_internal_error() {
    let mut model = SemanticModel::new();
    let ghost = model.add_symbol(SymbolData::new_type(
        ModuleId::new("ghost"),
        vec![],
        "Phantom",
        0,
    ));

    let mut metadata = ProgramMetadata::new(&model, app_id());
    assert_eq!(
        metadata.type_semantics(ghost),
        TypeSemantics::NotUsableFromScript
    );

    let diags = metadata.take_diagnostics();
    assert!(diags
        .iter()
        .any(|d| d.code == codes::UNKNOWN_MODULE && d.severity == Severity::InternalError));
}

#[test]
fn diagnostics_serialize_for_tooling() {
    let mut model = SemanticModel::new();
    let lib = build_lib(&mut model);
    let compiled = build_lib_module();

    let mut metadata = ProgramMetadata::new(&model, app_id());
    metadata.add_reference(compiled);
    let _ = metadata.type_semantics(lib.control);

    let diags = metadata.take_diagnostics();
    let json = serde_json::to_value(&diags).unwrap();
    let first = &json[0];
    assert_eq!(first["severity"], "error");
    assert_eq!(first["code"], "M2002");
    assert_eq!(first["subject"], "Sys.UI.Control");
}

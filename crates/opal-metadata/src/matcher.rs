//! Symbol matcher: cross-representation identity
//!
//! Associates a semantic-model symbol with the one low-level definition in a
//! compiled module that has an identical structural signature. Matching is
//! total and explicit: exactly one candidate must satisfy full shape
//! equality, and zero or many candidates is [`MatchError`], never a silent
//! pick. Results are invariant under reordering of the module's member
//! lists.

use crate::error::MatchError;
use opal_record::{CompiledModule, CompiledType, ParamDef, TypeDefIndex};
use opal_semantics::{MemberSignature, ParamShape, SemanticModel, SymbolId, TypeShape};

/// Structural equality over the type-shape grammar
///
/// Named types compare by declaring module, namespace/container path, simple
/// name and positional type arguments; arrays by rank and element; by-ref
/// markers must agree on both sides; type parameters by owner kind and
/// ordinal, never by name.
pub fn shapes_match(a: &TypeShape, b: &TypeShape) -> bool {
    match (a, b) {
        (
            TypeShape::Named {
                module: am,
                namespace: ans,
                name: an,
                containing: ac,
                type_args: aargs,
            },
            TypeShape::Named {
                module: bm,
                namespace: bns,
                name: bn,
                containing: bc,
                type_args: bargs,
            },
        ) => {
            if am != bm || ans != bns || an != bn {
                return false;
            }
            let containers_match = match (ac, bc) {
                (None, None) => true,
                (Some(ac), Some(bc)) => shapes_match(ac, bc),
                _ => false,
            };
            containers_match
                && aargs.len() == bargs.len()
                && aargs.iter().zip(bargs).all(|(x, y)| shapes_match(x, y))
        }
        (
            TypeShape::Array {
                element: ae,
                rank: ar,
            },
            TypeShape::Array {
                element: be,
                rank: br,
            },
        ) => ar == br && shapes_match(ae, be),
        (TypeShape::ByRef { referenced: ar }, TypeShape::ByRef { referenced: br }) => {
            shapes_match(ar, br)
        }
        (
            TypeShape::TypeParam {
                owner: ao,
                ordinal: ai,
            },
            TypeShape::TypeParam {
                owner: bo,
                ordinal: bi,
            },
        ) => ao == bo && ai == bi,
        _ => false,
    }
}

fn params_match(symbol_params: &[ParamShape], def_params: &[ParamDef]) -> bool {
    symbol_params.len() == def_params.len()
        && symbol_params
            .iter()
            .zip(def_params)
            .all(|(s, d)| s.by_ref == d.by_ref && shapes_match(&s.shape, &d.shape))
}

fn unique<T>(
    model: &SemanticModel,
    symbol: SymbolId,
    candidates: Vec<T>,
) -> Result<T, MatchError> {
    let count = candidates.len();
    let mut candidates = candidates;
    match (candidates.pop(), count) {
        (Some(only), 1) => Ok(only),
        _ => Err(MatchError {
            symbol: model.qualified_name(symbol),
            candidates: count,
        }),
    }
}

/// Does the type definition's container chain match the symbol's containing
/// chain?
fn container_chain_matches(
    model: &SemanticModel,
    symbol: Option<SymbolId>,
    module: &CompiledModule,
    def: Option<TypeDefIndex>,
) -> bool {
    match (symbol, def) {
        (None, None) => true,
        (Some(sym), Some(idx)) => {
            let data = model.symbol(sym);
            let def = module.type_def(idx);
            data.name == def.name
                && data.arity == def.arity
                && data.namespace == def.namespace
                && container_chain_matches(model, data.containing_type, module, def.containing)
        }
        _ => false,
    }
}

/// Find the unique type definition matching a type symbol
pub fn match_type(
    model: &SemanticModel,
    symbol: SymbolId,
    module: &CompiledModule,
) -> Result<TypeDefIndex, MatchError> {
    let data = model.symbol(symbol);
    let candidates: Vec<TypeDefIndex> = module
        .types
        .iter()
        .enumerate()
        .filter(|(_, def)| {
            data.module == module.id
                && def.name == data.name
                && def.arity == data.arity
                && def.namespace == data.namespace
                && container_chain_matches(
                    model,
                    data.containing_type,
                    module,
                    def.containing,
                )
        })
        .map(|(i, _)| TypeDefIndex(i as u32))
        .collect();
    unique(model, symbol, candidates)
}

/// Find the unique method (or constructor) definition matching a symbol
/// within its type definition
pub fn match_method(
    model: &SemanticModel,
    symbol: SymbolId,
    ty: &CompiledType,
) -> Result<usize, MatchError> {
    let data = model.symbol(symbol);
    let (generic_arity, return_shape, params) = match &data.signature {
        Some(MemberSignature::Method {
            generic_arity,
            return_shape,
            params,
        }) => (*generic_arity, return_shape, params),
        _ => {
            return Err(MatchError {
                symbol: model.qualified_name(symbol),
                candidates: 0,
            })
        }
    };
    let candidates: Vec<usize> = ty
        .methods
        .iter()
        .enumerate()
        .filter(|(_, def)| {
            def.name == data.name
                && def.generic_arity == generic_arity
                && shapes_match(&def.return_shape, return_shape)
                && params_match(params, &def.params)
        })
        .map(|(i, _)| i)
        .collect();
    unique(model, symbol, candidates)
}

/// Find the unique field definition matching a symbol (name equality)
pub fn match_field(
    model: &SemanticModel,
    symbol: SymbolId,
    ty: &CompiledType,
) -> Result<usize, MatchError> {
    let data = model.symbol(symbol);
    let candidates: Vec<usize> = ty
        .fields
        .iter()
        .enumerate()
        .filter(|(_, def)| def.name == data.name)
        .map(|(i, _)| i)
        .collect();
    unique(model, symbol, candidates)
}

/// Find the unique property definition matching a symbol (name, type shape
/// and index parameters)
pub fn match_property(
    model: &SemanticModel,
    symbol: SymbolId,
    ty: &CompiledType,
) -> Result<usize, MatchError> {
    let data = model.symbol(symbol);
    let (shape, index_params) = match &data.signature {
        Some(MemberSignature::Property {
            shape,
            index_params,
        }) => (shape, index_params),
        _ => {
            return Err(MatchError {
                symbol: model.qualified_name(symbol),
                candidates: 0,
            })
        }
    };
    let candidates: Vec<usize> = ty
        .properties
        .iter()
        .enumerate()
        .filter(|(_, def)| {
            def.name == data.name
                && shapes_match(&def.shape, shape)
                && params_match(index_params, &def.index_params)
        })
        .map(|(i, _)| i)
        .collect();
    unique(model, symbol, candidates)
}

/// Find the unique event definition matching a symbol (name equality)
pub fn match_event(
    model: &SemanticModel,
    symbol: SymbolId,
    ty: &CompiledType,
) -> Result<usize, MatchError> {
    let data = model.symbol(symbol);
    let candidates: Vec<usize> = ty
        .events
        .iter()
        .enumerate()
        .filter(|(_, def)| def.name == data.name)
        .map(|(i, _)| i)
        .collect();
    unique(model, symbol, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_record::MethodDef;
    use opal_semantics::{ModuleId, SymbolData, SymbolKind, TypeParamOwner};

    fn module_id() -> ModuleId {
        ModuleId::new("lib")
    }

    fn int_shape() -> TypeShape {
        TypeShape::named(module_id(), vec!["Sys".into()], "Int32")
    }

    fn string_shape() -> TypeShape {
        TypeShape::named(module_id(), vec!["Sys".into()], "String")
    }

    fn void_shape() -> TypeShape {
        TypeShape::named(module_id(), vec!["Sys".into()], "Void")
    }

    fn method_def(name: &str, params: Vec<TypeShape>) -> MethodDef {
        MethodDef {
            name: name.into(),
            generic_arity: 0,
            return_shape: void_shape(),
            params: params
                .into_iter()
                .map(|shape| ParamDef {
                    shape,
                    by_ref: false,
                })
                .collect(),
            records: Vec::new(),
        }
    }

    fn model_with_method(params: Vec<ParamShape>) -> (SemanticModel, SymbolId) {
        let mut model = SemanticModel::new();
        let ty = model.add_symbol(SymbolData::new_type(module_id(), vec![], "T", 0));
        let m = model.add_symbol(SymbolData::new_member(
            SymbolKind::Method,
            ty,
            module_id(),
            "m",
            MemberSignature::Method {
                generic_arity: 0,
                return_shape: void_shape(),
                params,
            },
        ));
        (model, m)
    }

    #[test]
    fn type_params_match_by_ordinal_not_name() {
        let a = TypeShape::TypeParam {
            owner: TypeParamOwner::Type,
            ordinal: 0,
        };
        let b = TypeShape::TypeParam {
            owner: TypeParamOwner::Type,
            ordinal: 0,
        };
        let c = TypeShape::TypeParam {
            owner: TypeParamOwner::Method,
            ordinal: 0,
        };
        assert!(shapes_match(&a, &b));
        assert!(!shapes_match(&a, &c));
    }

    #[test]
    fn byref_must_agree_on_both_sides() {
        let by_val = int_shape();
        let by_ref = int_shape().by_ref();
        assert!(!shapes_match(&by_val, &by_ref));
        assert!(shapes_match(&by_ref, &int_shape().by_ref()));
    }

    #[test]
    fn generic_instantiations_match_positionally() {
        let list = TypeShape::named(module_id(), vec!["Sys".into()], "List");
        let of_int = list.clone().with_args(vec![int_shape()]);
        let of_str = list.clone().with_args(vec![string_shape()]);
        assert!(shapes_match(
            &of_int,
            &list.clone().with_args(vec![int_shape()])
        ));
        assert!(!shapes_match(&of_int, &of_str));
        assert!(!shapes_match(&of_int, &list));
    }

    #[test]
    fn overloads_are_distinguished_by_parameter_shapes() {
        let (model, m) = model_with_method(vec![ParamShape::by_value(int_shape())]);
        let mut ty = CompiledType::new(vec![], "T", 0);
        ty.methods.push(method_def("m", vec![int_shape(), string_shape()]));
        ty.methods.push(method_def("m", vec![int_shape()]));
        ty.methods.push(method_def("m", vec![string_shape()]));

        assert_eq!(match_method(&model, m, &ty).unwrap(), 1);
    }

    #[test]
    fn arity_mismatch_is_missing_not_false_positive() {
        // Symbol is m(int); module only declares m(int, string)
        let (model, m) = model_with_method(vec![ParamShape::by_value(int_shape())]);
        let mut ty = CompiledType::new(vec![], "T", 0);
        ty.methods.push(method_def("m", vec![int_shape(), string_shape()]));

        let err = match_method(&model, m, &ty).unwrap_err();
        assert_eq!(err.candidates, 0);
        assert_eq!(err.symbol, "T.m");
    }

    #[test]
    fn duplicate_candidates_are_ambiguous() {
        let (model, m) = model_with_method(vec![]);
        let mut ty = CompiledType::new(vec![], "T", 0);
        ty.methods.push(method_def("m", vec![]));
        ty.methods.push(method_def("m", vec![]));

        let err = match_method(&model, m, &ty).unwrap_err();
        assert_eq!(err.candidates, 2);
    }

    #[test]
    fn matching_is_invariant_under_member_reordering() {
        let (model, m) = model_with_method(vec![ParamShape::by_value(string_shape())]);
        let mut forward = CompiledType::new(vec![], "T", 0);
        forward.methods.push(method_def("m", vec![int_shape()]));
        forward.methods.push(method_def("m", vec![string_shape()]));
        let mut reversed = CompiledType::new(vec![], "T", 0);
        reversed.methods.push(method_def("m", vec![string_shape()]));
        reversed.methods.push(method_def("m", vec![int_shape()]));

        let a = match_method(&model, m, &forward).unwrap();
        let b = match_method(&model, m, &reversed).unwrap();
        assert!(shapes_match(
            &forward.methods[a].params[0].shape,
            &reversed.methods[b].params[0].shape
        ));
    }

    #[test]
    fn nested_types_match_through_container_chain() {
        let mut model = SemanticModel::new();
        let outer = model.add_symbol(SymbolData::new_type(
            module_id(),
            vec!["App".into()],
            "Outer",
            0,
        ));
        let inner = model.add_symbol(
            SymbolData::new_type(module_id(), vec![], "Inner", 0).with_containing_type(outer),
        );

        let mut module = CompiledModule::new(module_id());
        let outer_idx = module.add_type(CompiledType::new(vec!["App".into()], "Outer", 0));
        // A same-named top-level type must not shadow the nested one
        module.add_type(CompiledType::new(vec![], "Inner", 0));
        let inner_idx = module.add_type(CompiledType::new(vec![], "Inner", 0).nested_in(outer_idx));

        assert_eq!(match_type(&model, inner, &module).unwrap(), inner_idx);
        assert_eq!(match_type(&model, outer, &module).unwrap(), outer_idx);
    }
}

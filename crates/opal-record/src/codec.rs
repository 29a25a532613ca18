//! Wire codec: decisions to records and back
//!
//! One encode/decode pair per declaration kind, each an exhaustive switch
//! over that kind's variants. Tag spaces are per declaration kind; a tag
//! outside the kind's space decodes to [`RecordError::UnknownTag`]. The
//! round-trip law `decode(encode(d)) == d` holds for every constructible
//! decision and is locked down by the tests below.

use crate::record::{MetadataRecord, RecordBuilder, RecordCursor, RecordError};
use opal_semantics::{
    ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics, MethodSemantics,
    PropertySemantics, TypeSemantics,
};

// Type decision tags
const TYPE_NORMAL: u8 = 0;
const TYPE_MUTABLE_VALUE: u8 = 1;
const TYPE_NOT_USABLE: u8 = 2;

// Method decision tags
const METHOD_NORMAL: u8 = 0;
const METHOD_STATIC_RECEIVER_FIRST: u8 = 1;
const METHOD_INLINE_CODE: u8 = 2;
const METHOD_NATIVE_INDEXER: u8 = 3;
const METHOD_NATIVE_OPERATOR: u8 = 4;
const METHOD_NOT_USABLE: u8 = 5;

// Constructor decision tags
const CTOR_UNNAMED: u8 = 0;
const CTOR_NAMED: u8 = 1;
const CTOR_STATIC_FACTORY: u8 = 2;
const CTOR_INLINE_CODE: u8 = 3;
const CTOR_OBJECT_LITERAL: u8 = 4;
const CTOR_NOT_USABLE: u8 = 5;

// Property decision tags
const PROP_GET_AND_SET: u8 = 0;
const PROP_FIELD: u8 = 1;
const PROP_NOT_USABLE: u8 = 2;

// Field decision tags
const FIELD_FIELD: u8 = 0;
const FIELD_CONSTANT: u8 = 1;
const FIELD_NOT_USABLE: u8 = 2;

// Event decision tags
const EVENT_ADD_AND_REMOVE: u8 = 0;
const EVENT_NOT_USABLE: u8 = 1;

// Delegate decision tag
const DELEGATE: u8 = 0;

// Reserved-name record tag
const RESERVED_NAMES: u8 = 0;

/// Encode a type decision
pub fn encode_type(semantics: &TypeSemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    match semantics {
        TypeSemantics::NormalType {
            name,
            ignore_generic_arguments,
            generate_code,
        } => {
            b.tag(TYPE_NORMAL)
                .str(name)
                .bool(*ignore_generic_arguments)
                .bool(*generate_code);
        }
        TypeSemantics::MutableValueType {
            name,
            ignore_generic_arguments,
            generate_code,
        } => {
            b.tag(TYPE_MUTABLE_VALUE)
                .str(name)
                .bool(*ignore_generic_arguments)
                .bool(*generate_code);
        }
        TypeSemantics::NotUsableFromScript => {
            b.tag(TYPE_NOT_USABLE);
        }
    }
    b.finish()
}

/// Decode a type decision
pub fn decode_type(record: &MetadataRecord) -> Result<TypeSemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = match c.read_tag()? {
        TYPE_NORMAL => TypeSemantics::NormalType {
            name: c.read_str()?,
            ignore_generic_arguments: c.read_bool()?,
            generate_code: c.read_bool()?,
        },
        TYPE_MUTABLE_VALUE => TypeSemantics::MutableValueType {
            name: c.read_str()?,
            ignore_generic_arguments: c.read_bool()?,
            generate_code: c.read_bool()?,
        },
        TYPE_NOT_USABLE => TypeSemantics::NotUsableFromScript,
        tag => return Err(RecordError::UnknownTag { kind: "type", tag }),
    };
    c.expect_end()?;
    Ok(semantics)
}

fn encode_method_into(b: &mut RecordBuilder, semantics: &MethodSemantics) {
    match semantics {
        MethodSemantics::Normal {
            name,
            ignore_generic_arguments,
            generate_code,
            expand_params,
            enumerate_as_array,
        } => {
            b.tag(METHOD_NORMAL)
                .str(name)
                .bool(*ignore_generic_arguments)
                .bool(*generate_code)
                .bool(*expand_params)
                .bool(*enumerate_as_array);
        }
        MethodSemantics::StaticWithReceiverFirst {
            name,
            ignore_generic_arguments,
            generate_code,
            expand_params,
            enumerate_as_array,
        } => {
            b.tag(METHOD_STATIC_RECEIVER_FIRST)
                .str(name)
                .bool(*ignore_generic_arguments)
                .bool(*generate_code)
                .bool(*expand_params)
                .bool(*enumerate_as_array);
        }
        MethodSemantics::InlineCode {
            literal,
            enumerate_as_array,
            generated_alias_present,
            non_virtual_literal,
            non_expanded_literal,
        } => {
            b.tag(METHOD_INLINE_CODE)
                .str(literal)
                .bool(*enumerate_as_array)
                .bool(*generated_alias_present)
                .opt_str(non_virtual_literal.as_deref())
                .opt_str(non_expanded_literal.as_deref());
        }
        MethodSemantics::NativeIndexer => {
            b.tag(METHOD_NATIVE_INDEXER);
        }
        MethodSemantics::NativeOperator => {
            b.tag(METHOD_NATIVE_OPERATOR);
        }
        MethodSemantics::NotUsableFromScript => {
            b.tag(METHOD_NOT_USABLE);
        }
    }
}

fn decode_method_from(c: &mut RecordCursor<'_>) -> Result<MethodSemantics, RecordError> {
    let semantics = match c.read_tag()? {
        METHOD_NORMAL => MethodSemantics::Normal {
            name: c.read_str()?,
            ignore_generic_arguments: c.read_bool()?,
            generate_code: c.read_bool()?,
            expand_params: c.read_bool()?,
            enumerate_as_array: c.read_bool()?,
        },
        METHOD_STATIC_RECEIVER_FIRST => MethodSemantics::StaticWithReceiverFirst {
            name: c.read_str()?,
            ignore_generic_arguments: c.read_bool()?,
            generate_code: c.read_bool()?,
            expand_params: c.read_bool()?,
            enumerate_as_array: c.read_bool()?,
        },
        METHOD_INLINE_CODE => MethodSemantics::InlineCode {
            literal: c.read_str()?,
            enumerate_as_array: c.read_bool()?,
            generated_alias_present: c.read_bool()?,
            non_virtual_literal: c.read_opt_str()?,
            non_expanded_literal: c.read_opt_str()?,
        },
        METHOD_NATIVE_INDEXER => MethodSemantics::NativeIndexer,
        METHOD_NATIVE_OPERATOR => MethodSemantics::NativeOperator,
        METHOD_NOT_USABLE => MethodSemantics::NotUsableFromScript,
        tag => return Err(RecordError::UnknownTag { kind: "method", tag }),
    };
    Ok(semantics)
}

/// Encode a method decision
pub fn encode_method(semantics: &MethodSemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    encode_method_into(&mut b, semantics);
    b.finish()
}

/// Decode a method decision
pub fn decode_method(record: &MetadataRecord) -> Result<MethodSemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = decode_method_from(&mut c)?;
    c.expect_end()?;
    Ok(semantics)
}

/// Encode a constructor decision
pub fn encode_constructor(semantics: &ConstructorSemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    match semantics {
        ConstructorSemantics::Unnamed {
            generate_code,
            expand_params,
            skip_in_initializer,
        } => {
            b.tag(CTOR_UNNAMED)
                .bool(*generate_code)
                .bool(*expand_params)
                .bool(*skip_in_initializer);
        }
        ConstructorSemantics::Named {
            name,
            generate_code,
            expand_params,
            skip_in_initializer,
        } => {
            b.tag(CTOR_NAMED)
                .str(name)
                .bool(*generate_code)
                .bool(*expand_params)
                .bool(*skip_in_initializer);
        }
        ConstructorSemantics::StaticFactory {
            name,
            generate_code,
            expand_params,
            skip_in_initializer,
        } => {
            b.tag(CTOR_STATIC_FACTORY)
                .str(name)
                .bool(*generate_code)
                .bool(*expand_params)
                .bool(*skip_in_initializer);
        }
        ConstructorSemantics::InlineCode {
            literal,
            skip_in_initializer,
            non_expanded_literal,
        } => {
            b.tag(CTOR_INLINE_CODE)
                .str(literal)
                .bool(*skip_in_initializer)
                .opt_str(non_expanded_literal.as_deref());
        }
        ConstructorSemantics::ObjectLiteral {
            parameter_to_member_map,
            skip_in_initializer,
        } => {
            b.tag(CTOR_OBJECT_LITERAL)
                .str_map(parameter_to_member_map)
                .bool(*skip_in_initializer);
        }
        ConstructorSemantics::NotUsableFromScript => {
            b.tag(CTOR_NOT_USABLE);
        }
    }
    b.finish()
}

/// Decode a constructor decision
pub fn decode_constructor(record: &MetadataRecord) -> Result<ConstructorSemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = match c.read_tag()? {
        CTOR_UNNAMED => ConstructorSemantics::Unnamed {
            generate_code: c.read_bool()?,
            expand_params: c.read_bool()?,
            skip_in_initializer: c.read_bool()?,
        },
        CTOR_NAMED => ConstructorSemantics::Named {
            name: c.read_str()?,
            generate_code: c.read_bool()?,
            expand_params: c.read_bool()?,
            skip_in_initializer: c.read_bool()?,
        },
        CTOR_STATIC_FACTORY => ConstructorSemantics::StaticFactory {
            name: c.read_str()?,
            generate_code: c.read_bool()?,
            expand_params: c.read_bool()?,
            skip_in_initializer: c.read_bool()?,
        },
        CTOR_INLINE_CODE => ConstructorSemantics::InlineCode {
            literal: c.read_str()?,
            skip_in_initializer: c.read_bool()?,
            non_expanded_literal: c.read_opt_str()?,
        },
        CTOR_OBJECT_LITERAL => ConstructorSemantics::ObjectLiteral {
            parameter_to_member_map: c.read_str_map()?,
            skip_in_initializer: c.read_bool()?,
        },
        CTOR_NOT_USABLE => ConstructorSemantics::NotUsableFromScript,
        tag => {
            return Err(RecordError::UnknownTag {
                kind: "constructor",
                tag,
            })
        }
    };
    c.expect_end()?;
    Ok(semantics)
}

fn encode_opt_method_into(b: &mut RecordBuilder, accessor: Option<&MethodSemantics>) {
    match accessor {
        Some(m) => {
            b.bool(true);
            encode_method_into(b, m);
        }
        None => {
            b.bool(false);
        }
    }
}

fn decode_opt_method_from(
    c: &mut RecordCursor<'_>,
) -> Result<Option<MethodSemantics>, RecordError> {
    if c.read_bool()? {
        Ok(Some(decode_method_from(c)?))
    } else {
        Ok(None)
    }
}

/// Encode a property decision; accessor method decisions nest inline
pub fn encode_property(semantics: &PropertySemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    match semantics {
        PropertySemantics::GetAndSetMethods { get, set } => {
            b.tag(PROP_GET_AND_SET);
            encode_opt_method_into(&mut b, get.as_deref());
            encode_opt_method_into(&mut b, set.as_deref());
        }
        PropertySemantics::Field { name } => {
            b.tag(PROP_FIELD).str(name);
        }
        PropertySemantics::NotUsableFromScript => {
            b.tag(PROP_NOT_USABLE);
        }
    }
    b.finish()
}

/// Decode a property decision
pub fn decode_property(record: &MetadataRecord) -> Result<PropertySemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = match c.read_tag()? {
        PROP_GET_AND_SET => PropertySemantics::GetAndSetMethods {
            get: decode_opt_method_from(&mut c)?.map(Box::new),
            set: decode_opt_method_from(&mut c)?.map(Box::new),
        },
        PROP_FIELD => PropertySemantics::Field {
            name: c.read_str()?,
        },
        PROP_NOT_USABLE => PropertySemantics::NotUsableFromScript,
        tag => {
            return Err(RecordError::UnknownTag {
                kind: "property",
                tag,
            })
        }
    };
    c.expect_end()?;
    Ok(semantics)
}

/// Encode a field decision
pub fn encode_field(semantics: &FieldSemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    match semantics {
        FieldSemantics::Field { name } => {
            b.tag(FIELD_FIELD).str(name);
        }
        FieldSemantics::Constant { value, name } => {
            b.tag(FIELD_CONSTANT).constant(value).str(name);
        }
        FieldSemantics::NotUsableFromScript => {
            b.tag(FIELD_NOT_USABLE);
        }
    }
    b.finish()
}

/// Decode a field decision
pub fn decode_field(record: &MetadataRecord) -> Result<FieldSemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = match c.read_tag()? {
        FIELD_FIELD => FieldSemantics::Field {
            name: c.read_str()?,
        },
        FIELD_CONSTANT => FieldSemantics::Constant {
            value: c.read_constant()?,
            name: c.read_str()?,
        },
        FIELD_NOT_USABLE => FieldSemantics::NotUsableFromScript,
        tag => return Err(RecordError::UnknownTag { kind: "field", tag }),
    };
    c.expect_end()?;
    Ok(semantics)
}

/// Encode an event decision; accessor method decisions nest inline
pub fn encode_event(semantics: &EventSemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    match semantics {
        EventSemantics::AddAndRemoveMethods { add, remove } => {
            b.tag(EVENT_ADD_AND_REMOVE);
            encode_opt_method_into(&mut b, add.as_deref());
            encode_opt_method_into(&mut b, remove.as_deref());
        }
        EventSemantics::NotUsableFromScript => {
            b.tag(EVENT_NOT_USABLE);
        }
    }
    b.finish()
}

/// Decode an event decision
pub fn decode_event(record: &MetadataRecord) -> Result<EventSemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = match c.read_tag()? {
        EVENT_ADD_AND_REMOVE => EventSemantics::AddAndRemoveMethods {
            add: decode_opt_method_from(&mut c)?.map(Box::new),
            remove: decode_opt_method_from(&mut c)?.map(Box::new),
        },
        EVENT_NOT_USABLE => EventSemantics::NotUsableFromScript,
        tag => return Err(RecordError::UnknownTag { kind: "event", tag }),
    };
    c.expect_end()?;
    Ok(semantics)
}

/// Encode a delegate decision
pub fn encode_delegate(semantics: &DelegateSemantics) -> MetadataRecord {
    let mut b = RecordBuilder::new();
    b.tag(DELEGATE)
        .bool(semantics.expand_params)
        .bool(semantics.bind_receiver_to_first_parameter);
    b.finish()
}

/// Decode a delegate decision
pub fn decode_delegate(record: &MetadataRecord) -> Result<DelegateSemantics, RecordError> {
    let mut c = record.cursor();
    let semantics = match c.read_tag()? {
        DELEGATE => DelegateSemantics {
            expand_params: c.read_bool()?,
            bind_receiver_to_first_parameter: c.read_bool()?,
        },
        tag => {
            return Err(RecordError::UnknownTag {
                kind: "delegate",
                tag,
            })
        }
    };
    c.expect_end()?;
    Ok(semantics)
}

/// Encode a type's own reserved instance-name set
///
/// Names are sorted so that the record (and therefore the compiled output)
/// does not depend on hash-set iteration order.
pub fn encode_reserved_names<'a>(names: impl IntoIterator<Item = &'a str>) -> MetadataRecord {
    let mut sorted: Vec<String> = names.into_iter().map(str::to_owned).collect();
    sorted.sort_unstable();
    let mut b = RecordBuilder::new();
    b.tag(RESERVED_NAMES).str_list(&sorted);
    b.finish()
}

/// Decode a reserved instance-name set
pub fn decode_reserved_names(record: &MetadataRecord) -> Result<Vec<String>, RecordError> {
    let mut c = record.cursor();
    match c.read_tag()? {
        RESERVED_NAMES => {}
        tag => {
            return Err(RecordError::UnknownTag {
                kind: "reserved names",
                tag,
            })
        }
    }
    let names = c.read_str_list()?;
    c.expect_end()?;
    Ok(names)
}

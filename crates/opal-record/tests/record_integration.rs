//! End-to-end record tests: decision -> record -> blob -> record -> decision

use opal_record::codec::{
    decode_constructor, decode_method, decode_property, encode_constructor, encode_method,
    encode_property,
};
use opal_record::{MetadataRecord, RecordError};
use opal_semantics::{ConstructorSemantics, MethodSemantics, PropertySemantics};

#[test]
fn method_survives_blob_round_trip() {
    let m = MethodSemantics::InlineCode {
        literal: "{this}.call({a}, {b})".into(),
        enumerate_as_array: false,
        generated_alias_present: true,
        non_virtual_literal: None,
        non_expanded_literal: Some("{this}.apply(null, {args})".into()),
    };
    let bytes = encode_method(&m).to_bytes();
    let decoded = decode_method(&MetadataRecord::from_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(decoded, m);
}

#[test]
fn property_with_both_accessors_survives_blob_round_trip() {
    let p = PropertySemantics::get_and_set_methods(
        Some(MethodSemantics::static_with_receiver_first("getValue")),
        Some(MethodSemantics::NotUsableFromScript),
    );
    let bytes = encode_property(&p).to_bytes();
    let decoded = decode_property(&MetadataRecord::from_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(decoded, p);
}

#[test]
fn object_literal_constructor_survives_blob_round_trip() {
    let ct = ConstructorSemantics::ObjectLiteral {
        parameter_to_member_map: vec![
            ("width".into(), "w".into()),
            ("height".into(), "h".into()),
        ],
        skip_in_initializer: true,
    };
    let bytes = encode_constructor(&ct).to_bytes();
    let decoded = decode_constructor(&MetadataRecord::from_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(decoded, ct);
}

#[test]
fn newer_compiler_tag_decodes_to_malformed_record() {
    // Simulates reading output of a newer compiler that introduced a new
    // method variant: the tag is intact on the wire but unknown to us.
    let record = MetadataRecord::from_values(vec![opal_record::RecordValue::Tag(42)]);
    let bytes = record.to_bytes();
    let reparsed = MetadataRecord::from_bytes(&bytes).unwrap();
    assert!(matches!(
        decode_method(&reparsed),
        Err(RecordError::UnknownTag { kind: "method", tag: 42 })
    ));
}

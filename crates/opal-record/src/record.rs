//! The in-memory record model: ordered primitive values plus typed readers
//! and writers over them

use opal_semantics::ConstantValue;
use thiserror::Error;

/// Errors raised while decoding a persisted metadata record
///
/// Every variant is a `MalformedRecord`-class failure: the record was
/// produced by an incompatible compiler version or has been corrupted.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// The record ended before all expected values were read
    #[error("record ended early at value index {index}")]
    UnexpectedEnd {
        /// Index of the missing value
        index: usize,
    },

    /// A value had a different primitive kind than the tag implies
    #[error("expected {expected} at value index {index}, found {found}")]
    WrongValue {
        /// Index of the offending value
        index: usize,
        /// Expected primitive kind
        expected: &'static str,
        /// Actual primitive kind
        found: &'static str,
    },

    /// The tag byte does not name any variant of the declaration kind
    #[error("unknown {kind} record tag {tag}")]
    UnknownTag {
        /// Declaration kind being decoded
        kind: &'static str,
        /// The unrecognized tag byte
        tag: u8,
    },

    /// Values remained after the variant's full payload was read
    #[error("trailing values after index {index}")]
    TrailingValues {
        /// Index of the first trailing value
        index: usize,
    },

    /// A serialized blob ended before its declared contents
    #[error("truncated record blob at offset {0}")]
    TruncatedBlob(usize),

    /// A serialized string was not valid UTF-8
    #[error("invalid UTF-8 in record blob at offset {0}")]
    InvalidUtf8(usize),

    /// A serialized value had an unrecognized kind byte
    #[error("unknown value kind {0} in record blob at offset {1}")]
    UnknownValueKind(u8, usize),

    /// The blob's checksum trailer does not match its contents
    #[error("record blob checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Checksum stored in the blob
        expected: u32,
        /// Checksum computed from the blob contents
        actual: u32,
    },
}

/// One primitive value in a persisted metadata record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// Variant tag byte; the first value of every record
    Tag(u8),
    /// A boolean
    Bool(bool),
    /// A UTF-8 string
    Str(String),
    /// A 64-bit float
    Num(f64),
    /// The null value
    Null,
    /// A list of strings (reserved-name records)
    StrList(Vec<String>),
    /// An ordered string-to-string map (object-literal parameter maps)
    StrMap(Vec<(String, String)>),
}

impl RecordValue {
    /// Name of the value's primitive kind, for error reporting
    pub fn kind_name(&self) -> &'static str {
        match self {
            RecordValue::Tag(_) => "tag",
            RecordValue::Bool(_) => "bool",
            RecordValue::Str(_) => "string",
            RecordValue::Num(_) => "number",
            RecordValue::Null => "null",
            RecordValue::StrList(_) => "string list",
            RecordValue::StrMap(_) => "string map",
        }
    }
}

/// A persisted metadata record: an ordered list of primitive values headed
/// by a variant tag
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    values: Vec<RecordValue>,
}

impl MetadataRecord {
    /// Construct a record from raw values (decoding paths and tests)
    pub fn from_values(values: Vec<RecordValue>) -> Self {
        MetadataRecord { values }
    }

    /// The record's values in order
    pub fn values(&self) -> &[RecordValue] {
        &self.values
    }

    /// A cursor reading the record's values from the start
    pub fn cursor(&self) -> RecordCursor<'_> {
        RecordCursor {
            values: &self.values,
            pos: 0,
        }
    }
}

/// Append-only builder for a metadata record
#[derive(Debug, Default)]
pub struct RecordBuilder {
    values: Vec<RecordValue>,
}

impl RecordBuilder {
    /// Start an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the variant tag
    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.values.push(RecordValue::Tag(tag));
        self
    }

    /// Append a boolean
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.values.push(RecordValue::Bool(value));
        self
    }

    /// Append a string
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.values.push(RecordValue::Str(value.to_owned()));
        self
    }

    /// Append a number
    pub fn num(&mut self, value: f64) -> &mut Self {
        self.values.push(RecordValue::Num(value));
        self
    }

    /// Append the null value
    pub fn null(&mut self) -> &mut Self {
        self.values.push(RecordValue::Null);
        self
    }

    /// Append an optional string as either a string or null
    pub fn opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(s) => self.str(s),
            None => self.null(),
        }
    }

    /// Append a string list
    pub fn str_list(&mut self, values: &[String]) -> &mut Self {
        self.values.push(RecordValue::StrList(values.to_vec()));
        self
    }

    /// Append an ordered string map
    pub fn str_map(&mut self, entries: &[(String, String)]) -> &mut Self {
        self.values.push(RecordValue::StrMap(entries.to_vec()));
        self
    }

    /// Append a constant value as its primitive form
    pub fn constant(&mut self, value: &ConstantValue) -> &mut Self {
        match value {
            ConstantValue::Bool(b) => self.bool(*b),
            ConstantValue::Number(n) => self.num(*n),
            ConstantValue::Str(s) => self.str(s),
            ConstantValue::Null => self.null(),
        }
    }

    /// Finish the record
    pub fn finish(self) -> MetadataRecord {
        MetadataRecord {
            values: self.values,
        }
    }
}

/// Sequential typed reader over a record's values
#[derive(Debug)]
pub struct RecordCursor<'a> {
    values: &'a [RecordValue],
    pos: usize,
}

impl<'a> RecordCursor<'a> {
    fn next(&mut self) -> Result<&'a RecordValue, RecordError> {
        let value = self
            .values
            .get(self.pos)
            .ok_or(RecordError::UnexpectedEnd { index: self.pos })?;
        self.pos += 1;
        Ok(value)
    }

    fn wrong(&self, expected: &'static str, found: &RecordValue) -> RecordError {
        RecordError::WrongValue {
            index: self.pos - 1,
            expected,
            found: found.kind_name(),
        }
    }

    /// Read the variant tag
    pub fn read_tag(&mut self) -> Result<u8, RecordError> {
        match self.next()? {
            RecordValue::Tag(t) => Ok(*t),
            other => Err(self.wrong("tag", other)),
        }
    }

    /// Read a boolean
    pub fn read_bool(&mut self) -> Result<bool, RecordError> {
        match self.next()? {
            RecordValue::Bool(b) => Ok(*b),
            other => Err(self.wrong("bool", other)),
        }
    }

    /// Read a string
    pub fn read_str(&mut self) -> Result<String, RecordError> {
        match self.next()? {
            RecordValue::Str(s) => Ok(s.clone()),
            other => Err(self.wrong("string", other)),
        }
    }

    /// Read a number
    pub fn read_num(&mut self) -> Result<f64, RecordError> {
        match self.next()? {
            RecordValue::Num(n) => Ok(*n),
            other => Err(self.wrong("number", other)),
        }
    }

    /// Read an optional string encoded as string-or-null
    pub fn read_opt_str(&mut self) -> Result<Option<String>, RecordError> {
        match self.next()? {
            RecordValue::Str(s) => Ok(Some(s.clone())),
            RecordValue::Null => Ok(None),
            other => Err(self.wrong("string or null", other)),
        }
    }

    /// Read a string list
    pub fn read_str_list(&mut self) -> Result<Vec<String>, RecordError> {
        match self.next()? {
            RecordValue::StrList(v) => Ok(v.clone()),
            other => Err(self.wrong("string list", other)),
        }
    }

    /// Read an ordered string map
    pub fn read_str_map(&mut self) -> Result<Vec<(String, String)>, RecordError> {
        match self.next()? {
            RecordValue::StrMap(v) => Ok(v.clone()),
            other => Err(self.wrong("string map", other)),
        }
    }

    /// Read a constant value from its primitive form
    pub fn read_constant(&mut self) -> Result<ConstantValue, RecordError> {
        match self.next()? {
            RecordValue::Bool(b) => Ok(ConstantValue::Bool(*b)),
            RecordValue::Num(n) => Ok(ConstantValue::Number(*n)),
            RecordValue::Str(s) => Ok(ConstantValue::Str(s.clone())),
            RecordValue::Null => Ok(ConstantValue::Null),
            other => Err(self.wrong("constant", other)),
        }
    }

    /// Fail with [`RecordError::TrailingValues`] unless the whole record was
    /// consumed
    pub fn expect_end(&self) -> Result<(), RecordError> {
        if self.pos == self.values.len() {
            Ok(())
        } else {
            Err(RecordError::TrailingValues { index: self.pos })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_cursor_round_trip() {
        let mut b = RecordBuilder::new();
        b.tag(3)
            .str("name")
            .bool(true)
            .num(1.5)
            .opt_str(None)
            .str_list(&["a".into(), "b".into()]);
        let record = b.finish();

        let mut c = record.cursor();
        assert_eq!(c.read_tag().unwrap(), 3);
        assert_eq!(c.read_str().unwrap(), "name");
        assert!(c.read_bool().unwrap());
        assert_eq!(c.read_num().unwrap(), 1.5);
        assert_eq!(c.read_opt_str().unwrap(), None);
        assert_eq!(c.read_str_list().unwrap(), vec!["a", "b"]);
        assert!(c.expect_end().is_ok());
    }

    #[test]
    fn wrong_kind_is_reported_with_index() {
        let record = MetadataRecord::from_values(vec![RecordValue::Bool(true)]);
        let mut c = record.cursor();
        let err = c.read_str().unwrap_err();
        assert_eq!(
            err,
            RecordError::WrongValue {
                index: 0,
                expected: "string",
                found: "bool"
            }
        );
    }

    #[test]
    fn underrun_and_trailing_are_detected() {
        let record = MetadataRecord::from_values(vec![RecordValue::Tag(0)]);
        let mut c = record.cursor();
        c.read_tag().unwrap();
        assert_eq!(c.read_bool().unwrap_err(), RecordError::UnexpectedEnd { index: 1 });

        let record = MetadataRecord::from_values(vec![RecordValue::Tag(0), RecordValue::Null]);
        let mut c = record.cursor();
        c.read_tag().unwrap();
        assert_eq!(c.expect_end().unwrap_err(), RecordError::TrailingValues { index: 1 });
    }

    #[test]
    fn constants_round_trip_through_values() {
        for value in [
            ConstantValue::Bool(false),
            ConstantValue::Number(42.0),
            ConstantValue::Str("x".into()),
            ConstantValue::Null,
        ] {
            let mut b = RecordBuilder::new();
            b.constant(&value);
            let record = b.finish();
            assert_eq!(record.cursor().read_constant().unwrap(), value);
        }
    }
}

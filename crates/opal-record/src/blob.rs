//! Binary framing for metadata records
//!
//! The attachable form of a record: `[value count u32][values][crc32]`,
//! little-endian throughout. Each value is one kind byte followed by its
//! payload; strings are u32-length-prefixed UTF-8. The checksum covers
//! everything before the trailer and is verified before any parsing, so a
//! corrupted blob fails fast with [`RecordError::ChecksumMismatch`].

use crate::record::{MetadataRecord, RecordError, RecordValue};

const KIND_TAG: u8 = 0;
const KIND_BOOL: u8 = 1;
const KIND_STR: u8 = 2;
const KIND_NUM: u8 = 3;
const KIND_NULL: u8 = 4;
const KIND_STR_LIST: u8 = 5;
const KIND_STR_MAP: u8 = 6;

/// Writer producing the binary blob form of a record
struct BlobWriter {
    buffer: Vec<u8>,
}

impl BlobWriter {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn emit_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn emit_str(&mut self, value: &str) {
        self.emit_u32(value.len() as u32);
        self.buffer.extend_from_slice(value.as_bytes());
    }

    fn emit_value(&mut self, value: &RecordValue) {
        match value {
            RecordValue::Tag(t) => {
                self.emit_u8(KIND_TAG);
                self.emit_u8(*t);
            }
            RecordValue::Bool(b) => {
                self.emit_u8(KIND_BOOL);
                self.emit_u8(u8::from(*b));
            }
            RecordValue::Str(s) => {
                self.emit_u8(KIND_STR);
                self.emit_str(s);
            }
            RecordValue::Num(n) => {
                self.emit_u8(KIND_NUM);
                self.emit_f64(*n);
            }
            RecordValue::Null => self.emit_u8(KIND_NULL),
            RecordValue::StrList(items) => {
                self.emit_u8(KIND_STR_LIST);
                self.emit_u32(items.len() as u32);
                for item in items {
                    self.emit_str(item);
                }
            }
            RecordValue::StrMap(entries) => {
                self.emit_u8(KIND_STR_MAP);
                self.emit_u32(entries.len() as u32);
                for (key, value) in entries {
                    self.emit_str(key);
                    self.emit_str(value);
                }
            }
        }
    }
}

/// Reader consuming the binary blob form of a record
struct BlobReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, RecordError> {
        let byte = *self
            .data
            .get(self.offset)
            .ok_or(RecordError::TruncatedBlob(self.offset))?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], RecordError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(RecordError::TruncatedBlob(self.offset))?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn read_u32(&mut self) -> Result<u32, RecordError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_f64(&mut self) -> Result<f64, RecordError> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(buf))
    }

    fn read_str(&mut self) -> Result<String, RecordError> {
        let start = self.offset;
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| RecordError::InvalidUtf8(start))
    }

    fn read_value(&mut self) -> Result<RecordValue, RecordError> {
        let kind_offset = self.offset;
        let kind = self.read_u8()?;
        match kind {
            KIND_TAG => Ok(RecordValue::Tag(self.read_u8()?)),
            KIND_BOOL => Ok(RecordValue::Bool(self.read_u8()? != 0)),
            KIND_STR => Ok(RecordValue::Str(self.read_str()?)),
            KIND_NUM => Ok(RecordValue::Num(self.read_f64()?)),
            KIND_NULL => Ok(RecordValue::Null),
            KIND_STR_LIST => {
                let count = self.read_u32()? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_str()?);
                }
                Ok(RecordValue::StrList(items))
            }
            KIND_STR_MAP => {
                let count = self.read_u32()? as usize;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = self.read_str()?;
                    let value = self.read_str()?;
                    entries.push((key, value));
                }
                Ok(RecordValue::StrMap(entries))
            }
            other => Err(RecordError::UnknownValueKind(other, kind_offset)),
        }
    }
}

impl MetadataRecord {
    /// Serialize the record into its attachable blob form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BlobWriter::new();
        writer.emit_u32(self.values().len() as u32);
        for value in self.values() {
            writer.emit_value(value);
        }
        let checksum = crc32fast::hash(&writer.buffer);
        writer.emit_u32(checksum);
        writer.buffer
    }

    /// Parse a record from its blob form, verifying the checksum first
    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        if data.len() < 8 {
            return Err(RecordError::TruncatedBlob(data.len()));
        }
        let (payload, trailer) = data.split_at(data.len() - 4);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let actual = crc32fast::hash(payload);
        if expected != actual {
            return Err(RecordError::ChecksumMismatch { expected, actual });
        }

        let mut reader = BlobReader::new(payload);
        let count = reader.read_u32()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(reader.read_value()?);
        }
        if reader.offset != payload.len() {
            return Err(RecordError::TruncatedBlob(reader.offset));
        }
        Ok(MetadataRecord::from_values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordBuilder;

    fn sample_record() -> MetadataRecord {
        let mut b = RecordBuilder::new();
        b.tag(7)
            .str("doWork")
            .bool(true)
            .bool(false)
            .num(2.5)
            .null()
            .str_list(&["x".into(), "y".into()])
            .str_map(&[("p".into(), "m".into())]);
        b.finish()
    }

    #[test]
    fn blob_round_trip() {
        let record = sample_record();
        let bytes = record.to_bytes();
        let decoded = MetadataRecord::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn corrupted_blob_fails_checksum() {
        let mut bytes = sample_record().to_bytes();
        bytes[6] ^= 0xFF;
        assert!(matches!(
            MetadataRecord::from_bytes(&bytes),
            Err(RecordError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let bytes = sample_record().to_bytes();
        assert!(matches!(
            MetadataRecord::from_bytes(&bytes[..5]),
            Err(RecordError::TruncatedBlob(_)) | Err(RecordError::ChecksumMismatch { .. })
        ));
        assert_eq!(
            MetadataRecord::from_bytes(&[]),
            Err(RecordError::TruncatedBlob(0))
        );
    }

    #[test]
    fn unknown_value_kind_is_rejected() {
        // count = 1, then a bogus kind byte
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.push(0x7F);
        let checksum = crc32fast::hash(&payload);
        payload.extend_from_slice(&checksum.to_le_bytes());
        assert_eq!(
            MetadataRecord::from_bytes(&payload),
            Err(RecordError::UnknownValueKind(0x7F, 4))
        );
    }
}

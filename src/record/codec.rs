use super::{RECORD_SIZE, RECORDS_PER_BLOCK};
use crate::file::{BLOCK_SIZE, BlockId, FileError, FileResult};

/// Map a record id to its block and the byte offset inside that block
pub fn locate(record_id: usize) -> (BlockId, usize) {
    (
        record_id / RECORDS_PER_BLOCK,
        (record_id % RECORDS_PER_BLOCK) * RECORD_SIZE,
    )
}

/// Inverse of [`locate`]. `offset` must be record-aligned and inside a block.
pub fn record_id_at(block_id: BlockId, offset: usize) -> FileResult<usize> {
    if offset >= BLOCK_SIZE || offset % RECORD_SIZE != 0 {
        return Err(FileError::InvalidRecord(format!(
            "offset {} is not a record boundary",
            offset
        )));
    }
    Ok(block_id * RECORDS_PER_BLOCK + offset / RECORD_SIZE)
}

/// A fixed-size record: big-endian `i16` key followed by big-endian `i16` value.
///
/// Only `key` takes part in ordering; `value` rides along with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record {
    pub key: i16,
    pub value: i16,
}

impl Record {
    pub fn new(key: i16, value: i16) -> Self {
        Self { key, value }
    }

    /// Build a record from loose fields; anything but exactly two is rejected
    pub fn from_fields(fields: &[i16]) -> FileResult<Self> {
        match fields {
            [key, value] => Ok(Self::new(*key, *value)),
            _ => Err(FileError::InvalidRecord(format!(
                "expected 2 fields, got {}",
                fields.len()
            ))),
        }
    }

    /// Decode a record from exactly [`RECORD_SIZE`] bytes
    pub fn decode(bytes: &[u8]) -> FileResult<Self> {
        match bytes {
            [k0, k1, v0, v1] => Ok(Self {
                key: i16::from_be_bytes([*k0, *k1]),
                value: i16::from_be_bytes([*v0, *v1]),
            }),
            _ => Err(FileError::InvalidRecord(format!(
                "expected {} bytes, got {}",
                RECORD_SIZE,
                bytes.len()
            ))),
        }
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        self.encode_into(&mut bytes);
        bytes
    }

    /// Write the record into the first [`RECORD_SIZE`] bytes of `buffer`
    pub fn encode_into(&self, buffer: &mut [u8]) {
        buffer[..2].copy_from_slice(&self.key.to_be_bytes());
        buffer[2..RECORD_SIZE].copy_from_slice(&self.value.to_be_bytes());
    }
}

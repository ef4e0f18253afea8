use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Short read: block_id={block_id}, expected {expected} bytes, got {actual}")]
    ShortRead {
        block_id: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Block out of range: block_id={block_id}, block_count={block_count}")]
    BlockOutOfRange { block_id: usize, block_count: usize },

    #[error("Record out of range: record_id={record_id}, record_count={record_count}")]
    RecordOutOfRange {
        record_id: usize,
        record_count: usize,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Invalid buffer pool capacity: {0}")]
    InvalidCapacity(usize),

    #[error("File length {0} is not a multiple of the record size")]
    MisalignedFile(u64),

    #[error("Invalid block size: expected {expected}, got {actual}")]
    InvalidBlockSize { expected: usize, actual: usize },
}

impl FileError {
    /// True for failures of the backing storage itself.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            FileError::Io(_) | FileError::ShortRead { .. } | FileError::BlockOutOfRange { .. }
        )
    }
}

pub type FileResult<T> = Result<T, FileError>;

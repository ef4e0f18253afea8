use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SortError {
    /// Buffer pool failures pass through unchanged
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Record count {requested} exceeds the {available} records in the file")]
    RecordCountExceedsFile { requested: usize, available: usize },

    #[error("Invalid range: low={low}, high={high}, record_count={record_count}")]
    InvalidRange {
        low: usize,
        high: usize,
        record_count: usize,
    },
}

pub type SortResult<T> = Result<T, SortError>;

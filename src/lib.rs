pub mod file;
pub mod generator;
pub mod record;
pub mod report;
pub mod sort;

pub use file::{BLOCK_SIZE, BlockFile, BufferPool, FileError, FileResult, PoolStats, WritePolicy};
pub use generator::{FileGenerator, FileKind};
pub use record::{RECORD_SIZE, RECORDS_PER_BLOCK, Record};
pub use report::{ReportError, ReportFormat, RunReport};
pub use sort::{
    ExternalSorter, RecordArray, SortConfig, SortError, SortResult, SortStats, SortStrategy,
    verify_sorted,
};

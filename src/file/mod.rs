mod block_file;
mod buffer_pool;
mod error;

pub use block_file::BlockFile;
pub use buffer_pool::{BufferPool, PoolStats, WritePolicy};
pub use error::{FileError, FileResult};

/// Block size in bytes (4KB), the unit of disk transfer and caching
pub const BLOCK_SIZE: usize = 4096;

/// Number of blocks kept resident when no capacity is given
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Block ID type
pub type BlockId = usize;

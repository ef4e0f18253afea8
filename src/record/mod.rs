mod codec;

pub use codec::{Record, locate, record_id_at};

use crate::file::BLOCK_SIZE;

/// Record size in bytes: 2-byte key + 2-byte value
pub const RECORD_SIZE: usize = 4;

/// Records held by one block
pub const RECORDS_PER_BLOCK: usize = BLOCK_SIZE / RECORD_SIZE;

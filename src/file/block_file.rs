use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::error::{FileError, FileResult};
use super::{BLOCK_SIZE, BlockId};
use crate::record::RECORD_SIZE;

/// Exclusive handle to a record file, addressed in fixed-size blocks.
///
/// The file length is captured when the file is opened and never changes:
/// blocks are only ever written back over their own on-disk extent, so the
/// last block of a file whose length is not a multiple of [`BLOCK_SIZE`]
/// stays partial.
pub struct BlockFile {
    file: File,
    path: PathBuf,
    len: u64,
}

impl BlockFile {
    /// Open an existing file for reading and writing
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let path_ref = path.as_ref();
        let path = path_ref
            .canonicalize()
            .map_err(|_| FileError::FileNotFound(path_ref.display().to_string()))?;

        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self { file, path, len })
    }

    /// Canonical path of the open file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks, counting a trailing partial block
    pub fn block_count(&self) -> usize {
        self.len.div_ceil(BLOCK_SIZE as u64) as usize
    }

    /// Number of whole records in the file
    pub fn record_count(&self) -> FileResult<usize> {
        if self.len % RECORD_SIZE as u64 != 0 {
            return Err(FileError::MisalignedFile(self.len));
        }
        Ok((self.len / RECORD_SIZE as u64) as usize)
    }

    /// Number of bytes of `block_id` that exist on disk
    pub fn block_extent(&self, block_id: BlockId) -> FileResult<usize> {
        let offset = block_id as u64 * BLOCK_SIZE as u64;
        if offset >= self.len {
            return Err(FileError::BlockOutOfRange {
                block_id,
                block_count: self.block_count(),
            });
        }
        Ok((self.len - offset).min(BLOCK_SIZE as u64) as usize)
    }

    /// Read a block into `buffer`, zero-filling past the end of the file
    pub fn read_block(&mut self, block_id: BlockId, buffer: &mut [u8]) -> FileResult<()> {
        check_block_size(buffer.len())?;
        let extent = self.block_extent(block_id)?;

        self.file
            .seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;

        let mut filled = 0;
        while filled < extent {
            match self.file.read(&mut buffer[filled..extent]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < extent {
            return Err(FileError::ShortRead {
                block_id,
                expected: extent,
                actual: filled,
            });
        }

        buffer[extent..].fill(0);
        Ok(())
    }

    /// Write a block back over its on-disk extent
    pub fn write_block(&mut self, block_id: BlockId, buffer: &[u8]) -> FileResult<()> {
        check_block_size(buffer.len())?;
        let extent = self.block_extent(block_id)?;

        self.file
            .seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;
        self.file.write_all(&buffer[..extent])?;
        // No sync here; the pool syncs once per flush

        Ok(())
    }

    /// Sync file contents to disk
    pub fn sync(&mut self) -> FileResult<()> {
        self.file.sync_data()?;
        Ok(())
    }
}

fn check_block_size(actual: usize) -> FileResult<()> {
    if actual != BLOCK_SIZE {
        return Err(FileError::InvalidBlockSize {
            expected: BLOCK_SIZE,
            actual,
        });
    }
    Ok(())
}

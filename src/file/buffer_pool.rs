use lru::LruCache;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

use super::block_file::BlockFile;
use super::error::{FileError, FileResult};
use super::{BLOCK_SIZE, BlockId};
use crate::record::{RECORD_SIZE, Record, locate};

/// When modified blocks reach the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Mark the block dirty and persist it on eviction or flush
    #[default]
    WriteBack,
    /// Persist the owning block on every record write
    WriteThrough,
}

/// I/O counters of a buffer pool. Monotonic for the pool's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub cache_hits: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
}

/// Bounded LRU cache of file blocks exposing the file as a record array
pub struct BufferPool {
    /// Backing file; `None` once the pool is closed
    file: Option<BlockFile>,
    /// Resident blocks in recency order. Unbounded: eviction is driven by `insert`
    cache: LruCache<BlockId, Vec<u8>>,
    /// Maximum number of resident blocks
    capacity: usize,
    /// Resident blocks not yet persisted, ordered by block id
    dirty: BTreeSet<BlockId>,
    policy: WritePolicy,
    stats: PoolStats,
    record_count: usize,
    block_count: usize,
    /// Buffer recycled from the last eviction
    spare: Vec<u8>,
}

impl BufferPool {
    /// Open a write-back pool over `path` holding at most `capacity` blocks
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> FileResult<Self> {
        Self::open_with_policy(path, capacity, WritePolicy::default())
    }

    pub fn open_with_policy<P: AsRef<Path>>(
        path: P,
        capacity: usize,
        policy: WritePolicy,
    ) -> FileResult<Self> {
        if capacity == 0 {
            return Err(FileError::InvalidCapacity(capacity));
        }

        let file = BlockFile::open(path)?;
        let record_count = file.record_count()?;
        let block_count = file.block_count();

        log::debug!(
            "opened buffer pool over {} ({} records, {} blocks, capacity {}, {:?})",
            file.path().display(),
            record_count,
            block_count,
            capacity,
            policy
        );

        Ok(Self {
            file: Some(file),
            cache: LruCache::unbounded(),
            capacity,
            dirty: BTreeSet::new(),
            policy,
            stats: PoolStats::default(),
            record_count,
            block_count,
            spare: vec![0u8; BLOCK_SIZE],
        })
    }

    /// Get a block, loading it from disk on a miss
    pub fn get_block(&mut self, block_id: BlockId) -> FileResult<&[u8]> {
        self.fetch(block_id)?;
        self.cache
            .peek(&block_id)
            .map(Vec::as_slice)
            .ok_or(FileError::InvalidState("block vanished after fetch"))
    }

    /// Read one record through the cache
    pub fn get_record(&mut self, record_id: usize) -> FileResult<Record> {
        self.check_record_id(record_id)?;
        let (block_id, offset) = locate(record_id);
        let block = self.get_block(block_id)?;
        Record::decode(&block[offset..offset + RECORD_SIZE])
    }

    /// Overwrite one record in the cached block
    pub fn write_record(&mut self, record_id: usize, record: Record) -> FileResult<()> {
        self.check_record_id(record_id)?;
        let (block_id, offset) = locate(record_id);
        self.fetch(block_id)?;

        let block = self
            .cache
            .peek_mut(&block_id)
            .ok_or(FileError::InvalidState("block vanished after fetch"))?;
        record.encode_into(&mut block[offset..offset + RECORD_SIZE]);

        match self.policy {
            WritePolicy::WriteBack => {
                self.dirty.insert(block_id);
            }
            WritePolicy::WriteThrough => self.write_out(block_id)?,
        }
        Ok(())
    }

    /// Write a record given as raw bytes; the payload is checked before the cache is touched
    pub fn write_record_bytes(&mut self, record_id: usize, bytes: &[u8]) -> FileResult<()> {
        let record = Record::decode(bytes)?;
        self.write_record(record_id, record)
    }

    /// Persist every dirty block in ascending block order
    pub fn flush(&mut self) -> FileResult<()> {
        self.ensure_open()?;

        let count = self.dirty.len();
        while let Some(&block_id) = self.dirty.first() {
            self.write_out(block_id)?;
            self.dirty.remove(&block_id);
        }

        if count > 0 {
            if let Some(file) = self.file.as_mut() {
                file.sync()?;
            }
            log::debug!("flushed {} dirty blocks", count);
        }
        Ok(())
    }

    /// Flush and release the file. Every later operation fails with `InvalidState`.
    pub fn close(&mut self) -> FileResult<()> {
        self.flush()?;
        self.file = None;
        self.cache.clear();
        log::debug!(
            "closed buffer pool (hits {}, reads {}, writes {})",
            self.stats.cache_hits,
            self.stats.disk_reads,
            self.stats.disk_writes
        );
        Ok(())
    }

    /// Make `block_id` resident and most recently used
    fn fetch(&mut self, block_id: BlockId) -> FileResult<()> {
        self.ensure_open()?;

        if self.cache.get(&block_id).is_some() {
            self.stats.cache_hits += 1;
            return Ok(());
        }

        self.load(block_id)
    }

    /// Read a block from disk and insert it
    fn load(&mut self, block_id: BlockId) -> FileResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or(FileError::InvalidState("buffer pool is closed"))?;

        let mut data = std::mem::take(&mut self.spare);
        if data.len() != BLOCK_SIZE {
            data = vec![0u8; BLOCK_SIZE];
        }

        if let Err(e) = file.read_block(block_id, &mut data) {
            self.spare = data;
            return Err(e);
        }
        self.stats.disk_reads += 1;

        self.insert(block_id, data)
    }

    /// Insert a freshly loaded block, evicting LRU blocks while over capacity
    fn insert(&mut self, block_id: BlockId, data: Vec<u8>) -> FileResult<()> {
        self.cache.put(block_id, data);

        while self.cache.len() > self.capacity {
            let victim = match self.cache.peek_lru() {
                Some((&victim, _)) => victim,
                None => break,
            };
            self.evict(victim)?;
        }
        Ok(())
    }

    /// Remove a block from the cache, writing it back first if dirty
    fn evict(&mut self, block_id: BlockId) -> FileResult<()> {
        if self.dirty.contains(&block_id) {
            self.write_out(block_id)?;
            self.dirty.remove(&block_id);
            log::trace!("evicted dirty block {}", block_id);
        }

        if let Some(data) = self.cache.pop(&block_id) {
            self.spare = data;
        }
        Ok(())
    }

    /// Write a resident block to disk
    fn write_out(&mut self, block_id: BlockId) -> FileResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or(FileError::InvalidState("buffer pool is closed"))?;
        let data = self
            .cache
            .peek(&block_id)
            .ok_or(FileError::InvalidState("dirty block is not resident"))?;

        file.write_block(block_id, data)?;
        self.stats.disk_writes += 1;
        Ok(())
    }

    fn ensure_open(&self) -> FileResult<()> {
        if self.file.is_none() {
            return Err(FileError::InvalidState("buffer pool is closed"));
        }
        Ok(())
    }

    fn check_record_id(&self, record_id: usize) -> FileResult<()> {
        if record_id >= self.record_count {
            return Err(FileError::RecordOutOfRange {
                record_id,
                record_count: self.record_count,
            });
        }
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn cache_hits(&self) -> u64 {
        self.stats.cache_hits
    }

    pub fn disk_reads(&self) -> u64 {
        self.stats.disk_reads
    }

    pub fn disk_writes(&self) -> u64 {
        self.stats.disk_writes
    }

    /// Maximum number of resident blocks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    /// Number of records in the backing file
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of blocks in the backing file
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Get the number of blocks currently in the cache
    pub fn resident_blocks(&self) -> usize {
        self.cache.len()
    }

    /// Check if a block is in the cache without touching its recency
    pub fn is_resident(&self, block_id: BlockId) -> bool {
        self.cache.contains(&block_id)
    }

    pub fn is_dirty(&self, block_id: BlockId) -> bool {
        self.dirty.contains(&block_id)
    }

    pub fn dirty_block_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        // Flush all dirty blocks when an unclosed pool is dropped
        if !self.is_closed()
            && let Err(e) = self.flush()
        {
            log::warn!("failed to flush buffer pool on drop: {}", e);
        }
    }
}

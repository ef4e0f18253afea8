use super::error::SortResult;
use crate::file::BufferPool;
use crate::record::Record;

/// Indexable record storage the partitioning runs over.
///
/// Implemented by the buffer pool, where every access may cost disk I/O,
/// and by plain record slices for the in-memory path.
pub trait RecordArray {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&mut self, index: usize) -> SortResult<Record>;

    fn set(&mut self, index: usize, record: Record) -> SortResult<()>;

    /// Exchange two records as a read-read-write-write sequence
    fn swap(&mut self, a: usize, b: usize) -> SortResult<()> {
        let first = self.get(a)?;
        let second = self.get(b)?;
        self.set(a, second)?;
        self.set(b, first)
    }
}

impl RecordArray for BufferPool {
    fn len(&self) -> usize {
        self.record_count()
    }

    fn get(&mut self, index: usize) -> SortResult<Record> {
        Ok(self.get_record(index)?)
    }

    fn set(&mut self, index: usize, record: Record) -> SortResult<()> {
        Ok(self.write_record(index, record)?)
    }
}

impl RecordArray for [Record] {
    fn len(&self) -> usize {
        <[Record]>::len(self)
    }

    fn get(&mut self, index: usize) -> SortResult<Record> {
        Ok(self[index])
    }

    fn set(&mut self, index: usize, record: Record) -> SortResult<()> {
        self[index] = record;
        Ok(())
    }

    fn swap(&mut self, a: usize, b: usize) -> SortResult<()> {
        <[Record]>::swap(self, a, b);
        Ok(())
    }
}

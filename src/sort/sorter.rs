use serde::Serialize;

use super::error::{SortError, SortResult};
use super::partition::{Scheme, sort_segments};
use super::{SortConfig, SortStrategy};
use crate::file::BufferPool;
use crate::record::{RECORDS_PER_BLOCK, Record};

/// Work counters of one sorter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SortStats {
    /// Partition passes
    pub partitions: u64,
    /// Key comparisons against a pivot
    pub comparisons: u64,
    /// Record exchanges
    pub swaps: u64,
}

/// Quicksort whose every record access goes through a [`BufferPool`].
pub struct ExternalSorter<'a> {
    pool: &'a mut BufferPool,
    record_count: usize,
    config: SortConfig,
    stats: SortStats,
}

impl<'a> ExternalSorter<'a> {
    /// Create a sorter over the first `record_count` records of the pool
    pub fn new(pool: &'a mut BufferPool, record_count: usize) -> SortResult<Self> {
        Self::with_config(pool, record_count, SortConfig::default())
    }

    pub fn with_config(
        pool: &'a mut BufferPool,
        record_count: usize,
        config: SortConfig,
    ) -> SortResult<Self> {
        if record_count > pool.record_count() {
            return Err(SortError::RecordCountExceedsFile {
                requested: record_count,
                available: pool.record_count(),
            });
        }

        Ok(Self {
            pool,
            record_count,
            config,
            stats: SortStats::default(),
        })
    }

    pub fn stats(&self) -> SortStats {
        self.stats
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// The configured strategy, or full in-memory when every block of the
    /// data fits in the pool and median-of-three otherwise
    pub fn select_strategy(&self) -> SortStrategy {
        self.config.strategy.unwrap_or_else(|| {
            let blocks_needed = self.record_count.div_ceil(RECORDS_PER_BLOCK);
            if self.pool.capacity() >= blocks_needed {
                SortStrategy::FullInMemory
            } else {
                SortStrategy::MedianOfThreeThreeWay
            }
        })
    }

    /// Sort all records ascending by key. Returns the strategy that ran.
    pub fn sort(&mut self) -> SortResult<SortStrategy> {
        let strategy = self.select_strategy();
        log::info!(
            "sorting {} records with {} strategy (pool capacity {} blocks)",
            self.record_count,
            strategy,
            self.pool.capacity()
        );

        if self.record_count > 1 {
            self.run(0, self.record_count, strategy)?;
        }

        log::info!(
            "sort finished: {} partitions, {} comparisons, {} swaps",
            self.stats.partitions,
            self.stats.comparisons,
            self.stats.swaps
        );
        Ok(strategy)
    }

    /// Sort the inclusive range `[low, high]`
    pub fn sort_range(&mut self, low: usize, high: usize) -> SortResult<()> {
        if low > high || high >= self.record_count {
            return Err(SortError::InvalidRange {
                low,
                high,
                record_count: self.record_count,
            });
        }

        let strategy = self.select_strategy();
        self.run(low, high + 1, strategy)
    }

    fn run(&mut self, start: usize, end: usize, strategy: SortStrategy) -> SortResult<()> {
        let hybrid = Scheme::Hybrid {
            threshold: self.config.three_way_threshold,
        };

        match strategy {
            SortStrategy::NaiveTwoWay => {
                sort_segments(&mut *self.pool, start, end, Scheme::TwoWay, &mut self.stats)
            }
            SortStrategy::MedianOfThreeThreeWay => {
                sort_segments(&mut *self.pool, start, end, hybrid, &mut self.stats)
            }
            SortStrategy::FullInMemory => self.sort_in_memory(start, end, hybrid),
        }
    }

    /// Read `[start, end)` into memory, sort it there and write it back.
    ///
    /// The in-memory pass applies the same partitioning rules as the pool
    /// path, so both produce the same permutation of equal keys.
    fn sort_in_memory(&mut self, start: usize, end: usize, scheme: Scheme) -> SortResult<()> {
        let mut records: Vec<Record> = Vec::with_capacity(end - start);
        for record_id in start..end {
            records.push(self.pool.get_record(record_id)?);
        }

        let len = records.len();
        sort_segments(records.as_mut_slice(), 0, len, scheme, &mut self.stats)?;

        for (record_id, record) in (start..end).zip(records) {
            self.pool.write_record(record_id, record)?;
        }
        log::debug!("sorted {} records in memory", len);
        Ok(())
    }
}

//! Quicksort over the virtual record array exposed by a [`BufferPool`].

mod array;
mod error;
mod partition;
mod sorter;

pub use array::RecordArray;
pub use error::{SortError, SortResult};
pub use sorter::{ExternalSorter, SortStats};

use serde::Serialize;
use std::fmt;

use crate::file::{BufferPool, FileResult};

/// Segments longer than this many records use median-of-three with a
/// three-way partition
pub const DEFAULT_THREE_WAY_THRESHOLD: usize = 1500;

/// How the record array is partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortStrategy {
    /// Lomuto partition with the last record as pivot, for every segment
    NaiveTwoWay,
    /// Median-of-three with a three-way partition for long segments, Lomuto below the threshold
    MedianOfThreeThreeWay,
    /// Load the whole range, sort it in memory with the median-of-three
    /// rules, write it back
    FullInMemory,
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortStrategy::NaiveTwoWay => "naive two-way",
            SortStrategy::MedianOfThreeThreeWay => "median-of-three three-way",
            SortStrategy::FullInMemory => "full in-memory",
        };
        f.write_str(name)
    }
}

/// Runtime sorter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    /// Forced strategy; `None` picks one from the pool capacity
    pub strategy: Option<SortStrategy>,
    pub three_way_threshold: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            three_way_threshold: DEFAULT_THREE_WAY_THRESHOLD,
        }
    }
}

impl SortConfig {
    pub fn with_strategy(mut self, strategy: SortStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_three_way_threshold(mut self, threshold: usize) -> Self {
        self.three_way_threshold = threshold;
        self
    }
}

/// Position (0, 1 or 2) of the median of three keys
pub(crate) fn median_position(a: i16, b: i16, c: i16) -> usize {
    if (a <= b) == (b <= c) {
        1
    } else if (b <= a) == (a <= c) {
        0
    } else {
        2
    }
}

/// Return the first record id whose key is smaller than its predecessor's
pub fn verify_sorted(pool: &mut BufferPool, record_count: usize) -> FileResult<Option<usize>> {
    if record_count == 0 {
        return Ok(None);
    }

    let mut previous = pool.get_record(0)?;
    for record_id in 1..record_count {
        let current = pool.get_record(record_id)?;
        if current.key < previous.key {
            return Ok(Some(record_id));
        }
        previous = current;
    }
    Ok(None)
}

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use super::array::RecordArray;
use super::error::SortResult;
use super::sorter::SortStats;
use super::median_position;

/// Partitioning rules applied to each segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scheme {
    /// Lomuto around the last record, whatever the segment length
    TwoWay,
    /// Median-of-three three-way above `threshold` records, Lomuto otherwise
    Hybrid { threshold: usize },
}

/// Quicksort `[start, end)` of `array` on an explicit stack.
///
/// The smaller side of every split is processed first, which bounds the
/// stack by the log of the segment length.
pub(crate) fn sort_segments<A: RecordArray + ?Sized>(
    array: &mut A,
    start: usize,
    end: usize,
    scheme: Scheme,
    stats: &mut SortStats,
) -> SortResult<()> {
    let mut stack = vec![(start, end)];

    while let Some((start, end)) = stack.pop() {
        let len = end - start;
        if len < 2 {
            continue;
        }

        let (left, right) = match scheme {
            Scheme::Hybrid { threshold } if len > threshold => {
                let (lt, gt) = three_way_partition(array, start, end - 1, stats)?;
                ((start, lt), (gt + 1, end))
            }
            _ => {
                let pivot = lomuto_partition(array, start, end - 1, stats)?;
                ((start, pivot), (pivot + 1, end))
            }
        };

        if left.1 - left.0 < right.1 - right.0 {
            stack.push(right);
            stack.push(left);
        } else {
            stack.push(left);
            stack.push(right);
        }
    }
    Ok(())
}

/// Lomuto partition of `[low, high]` around `array[high]`.
/// Returns the pivot's final index.
pub(crate) fn lomuto_partition<A: RecordArray + ?Sized>(
    array: &mut A,
    low: usize,
    high: usize,
    stats: &mut SortStats,
) -> SortResult<usize> {
    stats.partitions += 1;
    let pivot = array.get(high)?;

    let mut boundary = low;
    for j in low..high {
        let record = array.get(j)?;
        stats.comparisons += 1;
        if record.key < pivot.key {
            swap(array, boundary, j, stats)?;
            boundary += 1;
        }
    }

    swap(array, boundary, high, stats)?;
    Ok(boundary)
}

/// Dutch-flag partition of `[low, high]` around the median of `low`, `mid`
/// and `high`. Returns the inclusive bounds of the run equal to the pivot;
/// that run is in its final place.
pub(crate) fn three_way_partition<A: RecordArray + ?Sized>(
    array: &mut A,
    low: usize,
    high: usize,
    stats: &mut SortStats,
) -> SortResult<(usize, usize)> {
    stats.partitions += 1;
    let pivot_index = median_of_three(array, low, high)?;
    swap(array, low, pivot_index, stats)?;
    let pivot = array.get(low)?;

    let (mut lt, mut gt, mut i) = (low, high, low + 1);
    while i <= gt {
        let current = array.get(i)?;
        stats.comparisons += 1;
        match current.key.cmp(&pivot.key) {
            Ordering::Less => {
                swap(array, lt, i, stats)?;
                lt += 1;
                i += 1;
            }
            Ordering::Greater => {
                swap(array, i, gt, stats)?;
                gt -= 1;
            }
            Ordering::Equal => i += 1,
        }
    }
    Ok((lt, gt))
}

fn median_of_three<A: RecordArray + ?Sized>(
    array: &mut A,
    low: usize,
    high: usize,
) -> SortResult<usize> {
    let mid = low + (high - low) / 2;
    let a = array.get(low)?.key;
    let b = array.get(mid)?.key;
    let c = array.get(high)?.key;
    Ok([low, mid, high][median_position(a, b, c)])
}

fn swap<A: RecordArray + ?Sized>(
    array: &mut A,
    a: usize,
    b: usize,
    stats: &mut SortStats,
) -> SortResult<()> {
    if a == b {
        return Ok(());
    }
    array.swap(a, b)?;
    stats.swaps += 1;
    Ok(())
}

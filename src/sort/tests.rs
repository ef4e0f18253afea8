//! Scenario tests for sorting through the buffer pool

use std::path::{Path, PathBuf};

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::file::{BLOCK_SIZE, FileError, WritePolicy};
use crate::generator::{FileGenerator, FileKind};
use crate::record::{RECORDS_PER_BLOCK, Record};

fn write_records(path: &Path, records: &[Record]) {
    let bytes: Vec<u8> = records.iter().flat_map(|r| r.encode()).collect();
    std::fs::write(path, bytes).unwrap();
}

fn read_records(path: &Path) -> Vec<Record> {
    std::fs::read(path)
        .unwrap()
        .chunks(4)
        .map(|chunk| Record::decode(chunk).unwrap())
        .collect()
}

fn setup_records(records: &[Record]) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("data.bin");
    write_records(&path, records);
    (temp_dir, path)
}

fn setup_generated(blocks: usize, seed: u64, kind: FileKind) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("data.bin");
    FileGenerator::new(&path, blocks)
        .with_seed(seed)
        .generate(kind)
        .unwrap();
    (temp_dir, path)
}

/// Sort the file in place and return the strategy and sorter counters
fn sort_file(path: &Path, capacity: usize, config: SortConfig) -> (SortStrategy, SortStats) {
    let mut pool = BufferPool::open(path, capacity).unwrap();
    let record_count = pool.record_count();
    let (strategy, stats) = {
        let mut sorter = ExternalSorter::with_config(&mut pool, record_count, config).unwrap();
        let strategy = sorter.sort().unwrap();
        (strategy, sorter.stats())
    };
    pool.close().unwrap();
    (strategy, stats)
}

fn assert_sorted(records: &[Record]) {
    for (i, pair) in records.windows(2).enumerate() {
        assert!(
            pair[0].key <= pair[1].key,
            "records {} and {} out of order: {:?}",
            i,
            i + 1,
            pair
        );
    }
}

fn multiset(records: &[Record]) -> Vec<(i16, i16)> {
    let mut pairs: Vec<(i16, i16)> = records.iter().map(|r| (r.key, r.value)).collect();
    pairs.sort_unstable();
    pairs
}

fn records_from(pairs: &[(i16, i16)]) -> Vec<Record> {
    pairs.iter().map(|&(k, v)| Record::new(k, v)).collect()
}

#[rstest]
#[case(SortStrategy::NaiveTwoWay)]
#[case(SortStrategy::MedianOfThreeThreeWay)]
#[case(SortStrategy::FullInMemory)]
fn test_four_record_scenario(#[case] strategy: SortStrategy) {
    let (_temp_dir, path) = setup_records(&records_from(&[(40, 1), (10, 2), (30, 3), (20, 4)]));

    sort_file(&path, 1, SortConfig::default().with_strategy(strategy));

    assert_eq!(
        read_records(&path),
        records_from(&[(10, 2), (20, 4), (30, 3), (40, 1)])
    );
}

#[rstest]
#[case(SortStrategy::NaiveTwoWay)]
#[case(SortStrategy::MedianOfThreeThreeWay)]
#[case(SortStrategy::FullInMemory)]
fn test_duplicate_key_scenario(#[case] strategy: SortStrategy) {
    let (_temp_dir, path) = setup_records(&records_from(&[(5, 1), (5, 2), (5, 3), (1, 4), (5, 5)]));

    sort_file(&path, 1, SortConfig::default().with_strategy(strategy));

    let keys: Vec<i16> = read_records(&path).iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![1, 5, 5, 5, 5]);
}

#[test]
fn test_three_way_never_revisits_equal_run() {
    let (_temp_dir, path) = setup_records(&records_from(&[(5, 1), (5, 2), (5, 3), (1, 4), (5, 5)]));

    let config = SortConfig::default()
        .with_strategy(SortStrategy::MedianOfThreeThreeWay)
        .with_three_way_threshold(0);
    let (_, stats) = sort_file(&path, 1, config);

    // One pass leaves [1] and the run of fives, both final
    assert_eq!(stats.partitions, 1);
    assert_eq!(stats.comparisons, 4);
    assert_sorted(&read_records(&path));
}

#[test]
fn test_all_equal_keys_single_pass() {
    let records: Vec<Record> = (0..3000).map(|i| Record::new(7, i as i16)).collect();
    let (_temp_dir, path) = setup_records(&records);

    let config = SortConfig::default().with_strategy(SortStrategy::MedianOfThreeThreeWay);
    let (_, stats) = sort_file(&path, 1, config);

    assert_eq!(stats.partitions, 1);
    assert_eq!(stats.comparisons, 2999);
    assert_eq!(multiset(&read_records(&path)), multiset(&records));
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(8)]
fn test_capacity_independence(#[case] capacity: usize) {
    let (_reference_dir, reference) = setup_generated(8, 99, FileKind::Binary);
    let (_dir, path) = setup_generated(8, 99, FileKind::Binary);
    let original = read_records(&path);

    sort_file(&reference, 8, SortConfig::default());
    sort_file(&path, capacity, SortConfig::default());

    let sorted = read_records(&path);
    assert_sorted(&sorted);
    assert_eq!(multiset(&sorted), multiset(&original));
    assert_eq!(std::fs::read(&path).unwrap(), std::fs::read(&reference).unwrap());
}

#[rstest]
#[case(SortStrategy::NaiveTwoWay, 2)]
#[case(SortStrategy::MedianOfThreeThreeWay, 1)]
#[case(SortStrategy::MedianOfThreeThreeWay, 3)]
#[case(SortStrategy::FullInMemory, 4)]
fn test_sort_preserves_records(#[case] strategy: SortStrategy, #[case] capacity: usize) {
    let (_temp_dir, path) = setup_generated(4, 5, FileKind::Binary);
    let original = read_records(&path);

    sort_file(&path, capacity, SortConfig::default().with_strategy(strategy));

    let sorted = read_records(&path);
    assert_eq!(sorted.len(), original.len());
    assert_sorted(&sorted);
    assert_eq!(multiset(&sorted), multiset(&original));
}

#[test]
fn test_ascii_file_with_many_duplicates() {
    let (_temp_dir, path) = setup_generated(3, 11, FileKind::Ascii);
    let original = read_records(&path);

    let (strategy, _) = sort_file(&path, 2, SortConfig::default().with_three_way_threshold(64));
    assert_eq!(strategy, SortStrategy::MedianOfThreeThreeWay);

    let sorted = read_records(&path);
    assert_sorted(&sorted);
    assert_eq!(multiset(&sorted), multiset(&original));
}

#[test]
fn test_partial_last_block() {
    let records: Vec<Record> = (0..RECORDS_PER_BLOCK + 37)
        .map(|i| Record::new(((i * 7919) % 2003) as i16, i as i16))
        .collect();
    let (_temp_dir, path) = setup_records(&records);

    sort_file(&path, 1, SortConfig::default().with_three_way_threshold(100));

    let sorted = read_records(&path);
    assert_eq!(
        std::fs::metadata(&path).unwrap().len() as usize,
        (RECORDS_PER_BLOCK + 37) * 4
    );
    assert_sorted(&sorted);
    assert_eq!(multiset(&sorted), multiset(&records));
}

#[test]
fn test_negative_keys() {
    let (_temp_dir, path) = setup_records(&records_from(&[(3, 0), (-1, 1), (i16::MIN, 2), (i16::MAX, 3), (0, 4)]));

    sort_file(&path, 1, SortConfig::default());

    let keys: Vec<i16> = read_records(&path).iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![i16::MIN, -1, 0, 3, i16::MAX]);
}

#[test]
fn test_naive_sorted_input_does_not_overflow_stack() {
    let records: Vec<Record> = (0..2 * RECORDS_PER_BLOCK)
        .map(|i| Record::new(i as i16, 0))
        .collect();
    let (_temp_dir, path) = setup_records(&records);

    sort_file(&path, 2, SortConfig::default().with_strategy(SortStrategy::NaiveTwoWay));

    assert_eq!(read_records(&path), records);
}

#[test]
fn test_strategy_heuristic() {
    let (_temp_dir, path) = setup_generated(4, 3, FileKind::Binary);

    let mut pool = BufferPool::open(&path, 4).unwrap();
    let record_count = pool.record_count();
    let sorter = ExternalSorter::new(&mut pool, record_count).unwrap();
    assert_eq!(sorter.select_strategy(), SortStrategy::FullInMemory);
    drop(sorter);

    let mut pool = BufferPool::open(&path, 3).unwrap();
    let sorter = ExternalSorter::new(&mut pool, record_count).unwrap();
    assert_eq!(sorter.select_strategy(), SortStrategy::MedianOfThreeThreeWay);
    drop(sorter);

    // Only the sorted prefix has to fit
    let sorter = ExternalSorter::new(&mut pool, 3 * RECORDS_PER_BLOCK).unwrap();
    assert_eq!(sorter.select_strategy(), SortStrategy::FullInMemory);
}

#[test]
fn test_in_memory_costs_one_pass_of_io() {
    let (_temp_dir, path) = setup_generated(4, 8, FileKind::Binary);

    let mut pool = BufferPool::open(&path, 4).unwrap();
    let record_count = pool.record_count();
    ExternalSorter::new(&mut pool, record_count)
        .unwrap()
        .sort()
        .unwrap();
    pool.close().unwrap();

    assert_eq!(pool.disk_reads(), 4);
    assert_eq!(pool.disk_writes(), 4);
}

#[test]
fn test_sort_range() {
    let records = records_from(&[(9, 0), (8, 1), (3, 2), (1, 3), (2, 4), (0, 5)]);
    let (_temp_dir, path) = setup_records(&records);

    let mut pool = BufferPool::open(&path, 1).unwrap();
    {
        let config = SortConfig::default().with_strategy(SortStrategy::NaiveTwoWay);
        let mut sorter = ExternalSorter::with_config(&mut pool, 6, config).unwrap();
        sorter.sort_range(1, 4).unwrap();
    }
    pool.close().unwrap();

    assert_eq!(
        read_records(&path),
        records_from(&[(9, 0), (1, 3), (2, 4), (3, 2), (8, 1), (0, 5)])
    );
}

#[test]
fn test_sort_range_rejects_bad_bounds() {
    let (_temp_dir, path) = setup_records(&records_from(&[(1, 0), (2, 0)]));
    let mut pool = BufferPool::open(&path, 1).unwrap();
    let mut sorter = ExternalSorter::new(&mut pool, 2).unwrap();

    assert!(matches!(
        sorter.sort_range(1, 2),
        Err(SortError::InvalidRange { .. })
    ));
    assert!(matches!(
        sorter.sort_range(1, 0),
        Err(SortError::InvalidRange { .. })
    ));
}

#[test]
fn test_record_count_larger_than_file() {
    let (_temp_dir, path) = setup_records(&records_from(&[(1, 0), (2, 0)]));
    let mut pool = BufferPool::open(&path, 1).unwrap();

    let result = ExternalSorter::new(&mut pool, 3);
    assert!(matches!(
        result,
        Err(SortError::RecordCountExceedsFile {
            requested: 3,
            available: 2
        })
    ));
}

#[test]
fn test_closed_pool_error_propagates() {
    let (_temp_dir, path) = setup_records(&records_from(&[(2, 0), (1, 0)]));
    let mut pool = BufferPool::open(&path, 1).unwrap();
    pool.close().unwrap();

    let mut sorter = ExternalSorter::new(&mut pool, 2).unwrap();
    let err = sorter.sort().unwrap_err();
    assert!(matches!(err, SortError::File(FileError::InvalidState(_))));
}

#[test]
fn test_empty_and_single_record_files() {
    let (_temp_dir, path) = setup_records(&[]);
    let (strategy, stats) = sort_file(&path, 1, SortConfig::default());
    assert_eq!(strategy, SortStrategy::FullInMemory);
    assert_eq!(stats, SortStats::default());

    let (_temp_dir, path) = setup_records(&records_from(&[(4, 4)]));
    sort_file(&path, 1, SortConfig::default());
    assert_eq!(read_records(&path), records_from(&[(4, 4)]));
}

#[test]
fn test_write_through_produces_same_output() {
    let (_back_dir, back) = setup_generated(3, 21, FileKind::Binary);
    let (_through_dir, through) = setup_generated(3, 21, FileKind::Binary);

    sort_file(&back, 2, SortConfig::default());

    let mut pool = BufferPool::open_with_policy(&through, 2, WritePolicy::WriteThrough).unwrap();
    let record_count = pool.record_count();
    ExternalSorter::new(&mut pool, record_count)
        .unwrap()
        .sort()
        .unwrap();
    assert_eq!(pool.dirty_block_count(), 0);
    pool.close().unwrap();

    assert_eq!(std::fs::read(&back).unwrap(), std::fs::read(&through).unwrap());
    assert_eq!(std::fs::metadata(&back).unwrap().len(), 3 * BLOCK_SIZE as u64);
}

#[test]
fn test_verify_sorted() {
    let (_temp_dir, path) = setup_records(&records_from(&[(1, 0), (3, 0), (2, 0), (4, 0)]));
    let mut pool = BufferPool::open(&path, 1).unwrap();
    assert_eq!(verify_sorted(&mut pool, 4).unwrap(), Some(2));
    assert_eq!(verify_sorted(&mut pool, 2).unwrap(), None);
    assert_eq!(verify_sorted(&mut pool, 0).unwrap(), None);

    ExternalSorter::new(&mut pool, 4).unwrap().sort().unwrap();
    assert_eq!(verify_sorted(&mut pool, 4).unwrap(), None);
}

#[test]
fn test_median_position() {
    assert_eq!(median_position(1, 2, 3), 1);
    assert_eq!(median_position(3, 2, 1), 1);
    assert_eq!(median_position(2, 1, 3), 0);
    assert_eq!(median_position(2, 3, 1), 0);
    assert_eq!(median_position(1, 3, 2), 2);
    assert_eq!(median_position(3, 1, 2), 2);
    assert_eq!(median_position(5, 5, 5), 1);
}

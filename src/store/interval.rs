//! Sorted, merged interval index
//!
//! Ranges are appended to a pending list as they arrive. A build sorts the
//! pending list and sweeps it once, merging overlapping or touching
//! intervals, so the result is the minimal disjoint cover:
//!
//! ```text
//! pending:  [10.0.0.0-10.255.255.255] [1.2.3.4] [10.0.1.0-10.0.1.255] [1.2.3.5]
//! built:    [1.2.3.4-1.2.3.5] [10.0.0.0-10.255.255.255]
//! ```
//!
//! Lookups binary-search the built array for the first interval whose upper
//! bound is at or above the address.

use super::{Freshness, RangeIndex};
use crate::cidr::{Cidr, Interval};
use log::debug;
use rayon::prelude::*;
use std::sync::Arc;

/// Below this many pending ranges a plain sort beats rayon's overhead
const PARALLEL_SORT_THRESHOLD: usize = 1 << 16;

/// Interval index with a lazy, batched build
#[derive(Debug, Clone)]
pub struct IntervalIndex {
    /// Every inserted interval, in insertion order until the next build
    pending: Vec<Interval>,
    /// Sorted, disjoint, non-adjacent intervals from the last build
    ranges: Arc<[Interval]>,
    freshness: Freshness,
}

impl Default for IntervalIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalIndex {
    /// Empty index
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            ranges: Arc::from(Vec::new()),
            freshness: Freshness::Clean,
        }
    }

    /// Reserve room for `additional` more ranges
    pub fn reserve(&mut self, additional: usize) {
        self.pending.reserve(additional);
    }

    /// Append an interval without merging
    pub fn insert_interval(&mut self, interval: Interval) {
        self.pending.push(interval);
        self.freshness = Freshness::Dirty;
    }

    /// Built intervals from the last build
    ///
    /// Cheap to clone and safe to keep after later rebuilds.
    pub fn ranges(&self) -> Arc<[Interval]> {
        Arc::clone(&self.ranges)
    }

    /// Number of inserted intervals (before merging)
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total addresses covered by the last build
    pub fn covered_addresses(&self) -> u64 {
        self.ranges.iter().map(Interval::len).sum()
    }
}

impl RangeIndex for IntervalIndex {
    fn insert(&mut self, block: Cidr) {
        self.insert_interval(block.interval());
    }

    fn freshness(&self) -> Freshness {
        self.freshness
    }

    fn build(&mut self) {
        if self.pending.len() >= PARALLEL_SORT_THRESHOLD {
            self.pending.par_sort_unstable_by_key(|r| r.lo);
        } else {
            self.pending.sort_unstable_by_key(|r| r.lo);
        }

        let merged = merge_sorted(&self.pending);
        debug!(
            "merged {} pending ranges into {} intervals",
            self.pending.len(),
            merged.len()
        );

        // Single assignment: holders of the old Arc keep a complete snapshot
        self.ranges = merged.into();
        self.freshness = Freshness::Clean;
    }

    fn contains(&self, addr: u32) -> bool {
        let idx = self.ranges.partition_point(|r| r.hi < addr);
        self.ranges.get(idx).is_some_and(|r| r.lo <= addr)
    }

    fn range_count(&self) -> usize {
        match self.freshness {
            Freshness::Clean => self.ranges.len(),
            Freshness::Dirty => self.pending.len(),
        }
    }
}

/// Merge intervals sorted by `lo` into a disjoint, non-adjacent cover
pub fn merge_sorted(sorted: &[Interval]) -> Vec<Interval> {
    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());

    for &candidate in sorted {
        if let Some(last) = merged.last_mut() {
            // Overlapping or touching; widened to u64 so hi = u32::MAX can't wrap
            if u64::from(candidate.lo) <= u64::from(last.hi) + 1 {
                last.hi = last.hi.max(candidate.hi);
                continue;
            }
        }
        merged.push(candidate);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cidr::{parse_block, parse_ip};

    fn index_of(ranges: &[&str]) -> IntervalIndex {
        let mut index = IntervalIndex::new();
        for range in ranges {
            index.insert(parse_block(range).unwrap());
        }
        index.build();
        index
    }

    fn ip(text: &str) -> u32 {
        parse_ip(text).unwrap()
    }

    #[test]
    fn test_adjacent_singletons_merge() {
        let index = index_of(&["1.2.3.4/32", "1.2.3.5/32"]);
        assert_eq!(
            &*index.ranges(),
            &[Interval {
                lo: ip("1.2.3.4"),
                hi: ip("1.2.3.5")
            }]
        );
    }

    #[test]
    fn test_gap_of_one_not_merged() {
        let index = index_of(&["1.2.3.4/32", "1.2.3.6/32"]);
        assert_eq!(index.ranges().len(), 2);
        assert!(!index.contains(ip("1.2.3.5")));
    }

    #[test]
    fn test_unsorted_overlapping_input() {
        let index = index_of(&[
            "10.0.1.0/24",
            "192.168.0.0/16",
            "10.0.0.0/8",
            "192.168.4.0/24",
            "10.0.0.0/8",
        ]);
        let ranges = index.ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].to_string(), "10.0.0.0-10.255.255.255");
        assert_eq!(ranges[1].to_string(), "192.168.0.0-192.168.255.255");
    }

    #[test]
    fn test_merge_extends_to_max_hi() {
        // Second interval starts inside the first but ends earlier
        let merged = merge_sorted(&[Interval::new(0, 100), Interval::new(10, 20)]);
        assert_eq!(merged, vec![Interval::new(0, 100)]);
    }

    #[test]
    fn test_top_of_address_space() {
        let index = index_of(&["255.255.255.255/32", "255.255.255.254/32", "0.0.0.0/32"]);
        assert_eq!(index.ranges().len(), 2);
        assert!(index.contains(u32::MAX));
        assert!(index.contains(0));
        assert!(!index.contains(1));
    }

    #[test]
    fn test_whole_space() {
        let index = index_of(&["0.0.0.0/0", "1.2.3.4/32"]);
        assert_eq!(index.range_count(), 1);
        assert_eq!(index.covered_addresses(), 1u64 << 32);
    }

    #[test]
    fn test_build_idempotent() {
        let mut index = index_of(&["5.5.5.0/24", "1.0.0.0/8", "5.5.6.0/24"]);
        let first = index.ranges();
        index.build();
        assert_eq!(first, index.ranges());
    }

    #[test]
    fn test_range_count_before_build() {
        let mut index = IntervalIndex::new();
        index.insert(parse_block("10.0.0.0/8").unwrap());
        index.insert(parse_block("10.0.1.0/24").unwrap());
        assert_eq!(index.freshness(), Freshness::Dirty);
        assert_eq!(index.range_count(), 2);
        index.build();
        assert_eq!(index.range_count(), 1);
        assert_eq!(index.pending_len(), 2);
    }

    #[test]
    fn test_old_snapshot_survives_rebuild() {
        let mut index = index_of(&["1.0.0.0/8"]);
        let snapshot = index.ranges();
        index.insert(parse_block("3.0.0.0/8").unwrap());
        index.build();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(index.ranges().len(), 2);
    }

    #[test]
    fn test_parallel_sort_path() {
        let mut index = IntervalIndex::new();
        // Descending /32s, every other address: nothing merges
        for i in (0..PARALLEL_SORT_THRESHOLD as u32 + 10).rev() {
            index.insert(Cidr::host(i * 2));
        }
        index.build();
        assert_eq!(index.range_count(), PARALLEL_SORT_THRESHOLD + 10);
        assert!(index.contains(0));
        assert!(!index.contains(1));
        assert!(index.contains(2 * (PARALLEL_SORT_THRESHOLD as u32 + 9)));
    }
}

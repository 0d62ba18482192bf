//! Range stores: ingest CIDR text, answer IPv4 membership queries
//!
//! The actual lookup structure is a [`RangeIndex`]; two are provided:
//!
//! - [`IntervalIndex`]: sorted, merged intervals searched by binary search.
//!   Ingestion is O(1); the merge runs lazily on the first query after a
//!   mutation. Smallest steady-state footprint.
//! - [`BitTrie`]: binary trie over the address bits. Every insert is
//!   immediately queryable, at the cost of up to 32 nodes per range.
//!
//! Indexes are wrapped in one of two stores, chosen at construction:
//!
//! - [`RangeStore`]: exclusive-owner mode. No locking; the lazy build needs
//!   `&mut self`, so the borrow checker enforces single access. Use it while
//!   populating a list before publishing it.
//! - [`SharedRangeStore`]: shared-read mode. One `RwLock` covers the whole
//!   index. Queries take the read lock and only escalate to the write lock
//!   when a rebuild is due (double-checked, so concurrent readers rebuild
//!   once).
//!
//! # Example
//!
//! ```
//! use ipfence::store::{RangeStore, SharedRangeStore};
//!
//! let mut store = RangeStore::new();
//! store.ingest("10.0.0.0/8")?;
//! store.ingest("10.0.1.0/24")?;
//! assert!(store.check_ip("10.45.167.89")?);
//! assert_eq!(store.merged_range_count(), 1);
//! assert_eq!(store.total_ingested(), 2);
//!
//! // Publish for concurrent readers
//! let shared: SharedRangeStore = store.into_shared();
//! assert!(!shared.check_ip("11.0.0.1")?);
//! # Ok::<(), ipfence::FormatError>(())
//! ```

pub mod interval;
pub mod trie;

pub use interval::IntervalIndex;
pub use trie::BitTrie;

use crate::cidr::{parse_block, parse_ip, Cidr};
use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Whether the query structure reflects every ingested range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Query structure is current
    #[default]
    Clean,
    /// At least one range was ingested since the last build
    Dirty,
}

/// Outcome of a membership query that tolerates unparsable input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Address is inside a stored range
    Member,
    /// Address is outside every stored range
    NotMember,
    /// Address text could not be parsed; the caller's policy decides
    Indeterminate,
}

impl Membership {
    fn from_result(result: Result<bool, FormatError>) -> Self {
        match result {
            Ok(true) => Membership::Member,
            Ok(false) => Membership::NotMember,
            Err(_) => Membership::Indeterminate,
        }
    }
}

/// Lookup structure behind a store
///
/// Implementations only handle already-validated ranges; parsing and the
/// ingestion counter live in [`RangeStore`].
pub trait RangeIndex: Send + Sync {
    /// Add a range. Must leave the index `Dirty` or already queryable.
    fn insert(&mut self, block: Cidr);

    /// Current freshness; indexes without a build phase are always `Clean`
    fn freshness(&self) -> Freshness;

    /// Make every inserted range queryable. Idempotent.
    fn build(&mut self);

    /// Membership test against the last build
    fn contains(&self, addr: u32) -> bool;

    /// Number of distinct ranges held
    ///
    /// Backends count differently: [`IntervalIndex`] reports merged
    /// intervals, so `1.2.3.4/32` and `1.2.3.5/32` count as 1, while
    /// [`BitTrie`] reports live terminals that aren't covered by a wider
    /// range and counts the same pair as 2. Membership is identical.
    fn range_count(&self) -> usize;
}

/// Which index implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Sorted merged intervals ([`IntervalIndex`])
    #[default]
    Intervals,
    /// Bit trie ([`BitTrie`])
    Trie,
}

impl Backend {
    /// Fresh, empty index of this kind
    pub fn new_index(self) -> AnyIndex {
        match self {
            Backend::Intervals => AnyIndex::Intervals(IntervalIndex::new()),
            Backend::Trie => AnyIndex::Trie(BitTrie::new()),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intervals" | "interval" => Ok(Backend::Intervals),
            "trie" => Ok(Backend::Trie),
            other => Err(format!(
                "unknown backend '{}' (expected 'intervals' or 'trie')",
                other
            )),
        }
    }
}

/// Index chosen at runtime, e.g. from configuration
#[derive(Debug, Clone)]
pub enum AnyIndex {
    /// Interval backend
    Intervals(IntervalIndex),
    /// Trie backend
    Trie(BitTrie),
}

impl Default for AnyIndex {
    fn default() -> Self {
        Backend::default().new_index()
    }
}

impl AnyIndex {
    /// Which backend this is
    pub fn backend(&self) -> Backend {
        match self {
            AnyIndex::Intervals(_) => Backend::Intervals,
            AnyIndex::Trie(_) => Backend::Trie,
        }
    }
}

impl RangeIndex for AnyIndex {
    fn insert(&mut self, block: Cidr) {
        match self {
            AnyIndex::Intervals(index) => index.insert(block),
            AnyIndex::Trie(index) => index.insert(block),
        }
    }

    fn freshness(&self) -> Freshness {
        match self {
            AnyIndex::Intervals(index) => index.freshness(),
            AnyIndex::Trie(index) => index.freshness(),
        }
    }

    fn build(&mut self) {
        match self {
            AnyIndex::Intervals(index) => index.build(),
            AnyIndex::Trie(index) => index.build(),
        }
    }

    fn contains(&self, addr: u32) -> bool {
        match self {
            AnyIndex::Intervals(index) => index.contains(addr),
            AnyIndex::Trie(index) => index.contains(addr),
        }
    }

    fn range_count(&self) -> usize {
        match self {
            AnyIndex::Intervals(index) => index.range_count(),
            AnyIndex::Trie(index) => index.range_count(),
        }
    }
}

/// Exclusive-owner range store
///
/// Not internally synchronized. Queries may trigger a rebuild and therefore
/// take `&mut self`; for a store that is already clean,
/// [`RangeStore::contains`] answers through `&self`.
#[derive(Debug, Clone, Default)]
pub struct RangeStore<I: RangeIndex = IntervalIndex> {
    index: I,
    ingested: usize,
}

impl RangeStore<IntervalIndex> {
    /// Empty store using the interval backend
    pub fn new() -> Self {
        Self::with_index(IntervalIndex::new())
    }
}

impl RangeStore<AnyIndex> {
    /// Empty store using the given backend
    pub fn with_backend(backend: Backend) -> Self {
        Self::with_index(backend.new_index())
    }
}

impl<I: RangeIndex> RangeStore<I> {
    /// Wrap an (empty or pre-populated) index
    pub fn with_index(index: I) -> Self {
        Self { index, ingested: 0 }
    }

    /// Parse `a.b.c.d/p` and add it
    ///
    /// On error the store is left unchanged.
    pub fn ingest(&mut self, range: &str) -> Result<(), FormatError> {
        let block = parse_block(range)?;
        self.insert_block(block);
        Ok(())
    }

    /// Add an already-parsed block
    pub fn insert_block(&mut self, block: Cidr) {
        self.index.insert(block);
        self.ingested += 1;
    }

    /// Make every ingested range queryable
    pub fn build(&mut self) {
        self.index.build();
    }

    /// Is the dotted-quad `ip` in any ingested range?
    ///
    /// Builds first if ranges were ingested since the last build.
    pub fn check_ip(&mut self, ip: &str) -> Result<bool, FormatError> {
        let addr = parse_ip(ip)?;
        Ok(self.check_addr(addr))
    }

    /// [`RangeStore::check_ip`] for an already-parsed address
    pub fn check_addr(&mut self, addr: u32) -> bool {
        if self.index.freshness() == Freshness::Dirty {
            self.index.build();
        }
        self.index.contains(addr)
    }

    /// Like [`RangeStore::check_ip`], folding parse failures into
    /// [`Membership::Indeterminate`]
    pub fn check_membership(&mut self, ip: &str) -> Membership {
        Membership::from_result(self.check_ip(ip))
    }

    /// Read-only probe; `None` while a rebuild is pending
    pub fn contains(&self, addr: u32) -> Option<bool> {
        match self.index.freshness() {
            Freshness::Clean => Some(self.index.contains(addr)),
            Freshness::Dirty => None,
        }
    }

    /// Number of successfully ingested entries (never decreases)
    pub fn total_ingested(&self) -> usize {
        self.ingested
    }

    /// Distinct ranges after merging; before a build, the pending count
    pub fn merged_range_count(&self) -> usize {
        self.index.range_count()
    }

    /// Current freshness of the index
    pub fn freshness(&self) -> Freshness {
        self.index.freshness()
    }

    /// The underlying index
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Publish for concurrent readers
    pub fn into_shared(self) -> SharedRangeStore<I> {
        SharedRangeStore {
            inner: RwLock::new(self),
        }
    }
}

/// Shared-read range store
///
/// Lock discipline:
/// - `ingest`/`build` take the write lock.
/// - `check_ip` takes the read lock. If the index is dirty it releases it,
///   takes the write lock, re-checks (another reader may have rebuilt
///   meanwhile), rebuilds only if still dirty, then reads under a fresh
///   read lock.
///
/// Rebuilds complete under the write lock and publish the new lookup
/// structure in one assignment, so readers never see a partial merge.
#[derive(Debug, Default)]
pub struct SharedRangeStore<I: RangeIndex = IntervalIndex> {
    inner: RwLock<RangeStore<I>>,
}

impl SharedRangeStore<IntervalIndex> {
    /// Empty shared store using the interval backend
    pub fn new() -> Self {
        RangeStore::new().into_shared()
    }
}

impl SharedRangeStore<AnyIndex> {
    /// Empty shared store using the given backend
    pub fn with_backend(backend: Backend) -> Self {
        RangeStore::with_backend(backend).into_shared()
    }
}

impl<I: RangeIndex> SharedRangeStore<I> {
    // Every transition leaves the store consistent, so a panic in another
    // thread while holding the lock doesn't invalidate the data
    fn read(&self) -> RwLockReadGuard<'_, RangeStore<I>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RangeStore<I>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `a.b.c.d/p` and add it (write lock)
    pub fn ingest(&self, range: &str) -> Result<(), FormatError> {
        // Parse outside the lock
        let block = parse_block(range)?;
        self.write().insert_block(block);
        Ok(())
    }

    /// Rebuild now instead of on the next query (write lock)
    pub fn build(&self) {
        let mut store = self.write();
        if store.freshness() == Freshness::Dirty {
            store.build();
        }
    }

    /// Is the dotted-quad `ip` in any ingested range?
    pub fn check_ip(&self, ip: &str) -> Result<bool, FormatError> {
        let addr = parse_ip(ip)?;
        Ok(self.check_addr(addr))
    }

    /// [`SharedRangeStore::check_ip`] for an already-parsed address
    pub fn check_addr(&self, addr: u32) -> bool {
        {
            let store = self.read();
            if let Some(found) = store.contains(addr) {
                return found;
            }
        }

        {
            let mut store = self.write();
            if store.freshness() == Freshness::Dirty {
                store.build();
            }
        }

        // An ingest may land between the two locks; the index then answers
        // from the build above, which is still a complete snapshot
        self.read().index.contains(addr)
    }

    /// Like [`SharedRangeStore::check_ip`], folding parse failures into
    /// [`Membership::Indeterminate`]
    pub fn check_membership(&self, ip: &str) -> Membership {
        Membership::from_result(self.check_ip(ip))
    }

    /// Number of successfully ingested entries
    pub fn total_ingested(&self) -> usize {
        self.read().total_ingested()
    }

    /// Distinct ranges after merging; before a build, the pending count
    pub fn merged_range_count(&self) -> usize {
        self.read().merged_range_count()
    }

    /// Current freshness of the index
    pub fn freshness(&self) -> Freshness {
        self.read().freshness()
    }

    /// Run `f` against the index under the read lock
    pub fn with_index<R>(&self, f: impl FnOnce(&I) -> R) -> R {
        f(self.read().index())
    }

    /// Take the store back for exclusive use
    pub fn into_inner(self) -> RangeStore<I> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I: RangeIndex> From<RangeStore<I>> for SharedRangeStore<I> {
    fn from(store: RangeStore<I>) -> Self {
        store.into_shared()
    }
}

/// Locking discipline of a store chosen at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// No locking; one owner ([`RangeStore`])
    #[default]
    Exclusive,
    /// `RwLock`-guarded, many readers ([`SharedRangeStore`])
    Shared,
}

impl std::str::FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exclusive" => Ok(StoreMode::Exclusive),
            "shared" => Ok(StoreMode::Shared),
            other => Err(format!(
                "unknown store mode '{}' (expected 'exclusive' or 'shared')",
                other
            )),
        }
    }
}

/// Store whose mode and backend were picked at runtime
///
/// Methods mirror [`RangeStore`]; the exclusive variant needs `&mut self`
/// for lazily-building queries, so every method here takes the stricter
/// receiver the variants require.
#[derive(Debug)]
pub enum AnyStore {
    /// Exclusive-owner store
    Exclusive(RangeStore<AnyIndex>),
    /// Shared-read store
    Shared(SharedRangeStore<AnyIndex>),
}

impl AnyStore {
    /// Empty store of the given mode and backend
    pub fn new(mode: StoreMode, backend: Backend) -> Self {
        Self::from_exclusive(RangeStore::with_backend(backend), mode)
    }

    /// Wrap an already-populated store in the requested mode
    pub fn from_exclusive(store: RangeStore<AnyIndex>, mode: StoreMode) -> Self {
        match mode {
            StoreMode::Exclusive => AnyStore::Exclusive(store),
            StoreMode::Shared => AnyStore::Shared(store.into_shared()),
        }
    }

    /// Which mode this store runs in
    pub fn mode(&self) -> StoreMode {
        match self {
            AnyStore::Exclusive(_) => StoreMode::Exclusive,
            AnyStore::Shared(_) => StoreMode::Shared,
        }
    }

    /// Which backend holds the ranges
    pub fn backend(&self) -> Backend {
        match self {
            AnyStore::Exclusive(store) => store.index().backend(),
            AnyStore::Shared(store) => store.with_index(AnyIndex::backend),
        }
    }

    /// Parse `a.b.c.d/p` and add it
    pub fn ingest(&mut self, range: &str) -> Result<(), FormatError> {
        match self {
            AnyStore::Exclusive(store) => store.ingest(range),
            AnyStore::Shared(store) => store.ingest(range),
        }
    }

    /// Rebuild now instead of on the next query
    pub fn build(&mut self) {
        match self {
            AnyStore::Exclusive(store) => store.build(),
            AnyStore::Shared(store) => store.build(),
        }
    }

    /// Is the dotted-quad `ip` in any ingested range?
    pub fn check_ip(&mut self, ip: &str) -> Result<bool, FormatError> {
        match self {
            AnyStore::Exclusive(store) => store.check_ip(ip),
            AnyStore::Shared(store) => store.check_ip(ip),
        }
    }

    /// Membership with parse failures folded into [`Membership::Indeterminate`]
    pub fn check_membership(&mut self, ip: &str) -> Membership {
        match self {
            AnyStore::Exclusive(store) => store.check_membership(ip),
            AnyStore::Shared(store) => store.check_membership(ip),
        }
    }

    /// Number of successfully ingested entries
    pub fn total_ingested(&self) -> usize {
        match self {
            AnyStore::Exclusive(store) => store.total_ingested(),
            AnyStore::Shared(store) => store.total_ingested(),
        }
    }

    /// Distinct ranges after merging; before a build, the pending count
    pub fn merged_range_count(&self) -> usize {
        match self {
            AnyStore::Exclusive(store) => store.merged_range_count(),
            AnyStore::Shared(store) => store.merged_range_count(),
        }
    }

    /// Current freshness of the index
    pub fn freshness(&self) -> Freshness {
        match self {
            AnyStore::Exclusive(store) => store.freshness(),
            AnyStore::Shared(store) => store.freshness(),
        }
    }

    /// Shared-read store, converting if needed
    pub fn into_shared(self) -> SharedRangeStore<AnyIndex> {
        match self {
            AnyStore::Exclusive(store) => store.into_shared(),
            AnyStore::Shared(store) => store,
        }
    }

    /// Exclusive-owner store, converting if needed
    pub fn into_exclusive(self) -> RangeStore<AnyIndex> {
        match self {
            AnyStore::Exclusive(store) => store,
            AnyStore::Shared(store) => store.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn backends() -> [Backend; 2] {
        [Backend::Intervals, Backend::Trie]
    }

    #[test]
    fn test_rfc1918_membership() {
        for backend in backends() {
            let mut store = RangeStore::with_backend(backend);
            store.ingest("192.168.0.0/16").unwrap();

            assert!(store.check_ip("192.168.45.78").unwrap(), "{:?}", backend);
            assert!(!store.check_ip("192.169.0.1").unwrap(), "{:?}", backend);
        }
    }

    #[test]
    fn test_nested_ranges_merge() {
        for backend in backends() {
            let mut store = RangeStore::with_backend(backend);
            store.ingest("10.0.0.0/8").unwrap();
            store.ingest("10.0.1.0/24").unwrap();
            store.build();

            assert_eq!(store.merged_range_count(), 1, "{:?}", backend);
            assert_eq!(store.total_ingested(), 2, "{:?}", backend);
        }
    }

    #[test]
    fn test_invalid_range_leaves_store_unchanged() {
        for backend in backends() {
            let mut store = RangeStore::with_backend(backend);
            store.ingest("1.2.3.0/24").unwrap();

            assert!(store.ingest("999.1.1.1/33").is_err());
            assert_eq!(store.total_ingested(), 1);
            assert!(store.check_ip("1.2.3.200").unwrap());
        }
    }

    #[test]
    fn test_empty_store() {
        for backend in backends() {
            let mut store = RangeStore::with_backend(backend);
            assert!(!store.check_ip("8.8.8.8").unwrap());
            assert!(!store.check_ip("0.0.0.0").unwrap());
            assert_eq!(store.merged_range_count(), 0);
            assert_eq!(store.total_ingested(), 0);
        }
    }

    #[test]
    fn test_check_ip_rejects_malformed_address() {
        for backend in backends() {
            let mut store = RangeStore::with_backend(backend);
            store.ingest("0.0.0.0/0").unwrap();

            assert!(store.check_ip("1.2.3").is_err());
            assert!(store.check_ip("300.1.1.1").is_err());
            assert_eq!(store.check_membership("nonsense"), Membership::Indeterminate);
            assert_eq!(store.check_membership("1.1.1.1"), Membership::Member);
        }
    }

    #[test]
    fn test_freshness_transitions() {
        let mut store = RangeStore::new();
        assert_eq!(store.freshness(), Freshness::Clean);

        store.ingest("1.2.3.4/32").unwrap();
        assert_eq!(store.freshness(), Freshness::Dirty);
        assert_eq!(store.contains(0x01020304), None);

        assert!(store.check_ip("1.2.3.4").unwrap());
        assert_eq!(store.freshness(), Freshness::Clean);
        assert_eq!(store.contains(0x01020304), Some(true));

        // The trie never needs a build
        let mut trie = RangeStore::with_backend(Backend::Trie);
        trie.ingest("1.2.3.4/32").unwrap();
        assert_eq!(trie.freshness(), Freshness::Clean);
        assert_eq!(trie.contains(0x01020304), Some(true));
    }

    #[test]
    fn test_shared_store_lazy_build() {
        let shared = SharedRangeStore::new();
        shared.ingest("10.0.0.0/8").unwrap();
        shared.ingest("10.0.0.0/8").unwrap();
        assert_eq!(shared.freshness(), Freshness::Dirty);
        assert_eq!(shared.merged_range_count(), 2);

        assert!(shared.check_ip("10.1.1.1").unwrap());
        assert_eq!(shared.freshness(), Freshness::Clean);
        assert_eq!(shared.merged_range_count(), 1);
        assert_eq!(shared.total_ingested(), 2);
    }

    #[test]
    fn test_shared_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedRangeStore>();
        assert_send_sync::<SharedRangeStore<BitTrie>>();
        assert_send_sync::<SharedRangeStore<AnyIndex>>();
    }

    #[test]
    fn test_concurrent_readers_single_rebuild() {
        for backend in backends() {
            let shared = Arc::new(SharedRangeStore::with_backend(backend));
            for i in 0..64u32 {
                shared.ingest(&format!("10.{}.0.0/16", i * 2)).unwrap();
            }

            let handles: Vec<_> = (0..8)
                .map(|thread_id| {
                    let shared = Arc::clone(&shared);
                    thread::spawn(move || {
                        for i in 0..200u32 {
                            let second = (i + thread_id) % 128;
                            let ip = format!("10.{}.1.1", second);
                            let expected = second % 2 == 0;
                            assert_eq!(shared.check_ip(&ip).unwrap(), expected, "{}", ip);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(shared.merged_range_count(), 64);
        }
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("trie".parse::<Backend>().unwrap(), Backend::Trie);
        assert_eq!("Intervals".parse::<Backend>().unwrap(), Backend::Intervals);
        assert!("btree".parse::<Backend>().is_err());
    }

    #[test]
    fn test_adjacent_singletons_count_per_backend() {
        let mut intervals = RangeStore::with_backend(Backend::Intervals);
        let mut trie = RangeStore::with_backend(Backend::Trie);
        for store in [&mut intervals, &mut trie] {
            store.ingest("1.2.3.4/32").unwrap();
            store.ingest("1.2.3.5/32").unwrap();
            assert!(store.check_ip("1.2.3.5").unwrap());
            assert!(!store.check_ip("1.2.3.6").unwrap());
        }
        assert_eq!(intervals.merged_range_count(), 1);
        assert_eq!(trie.merged_range_count(), 2);
    }

    #[test]
    fn test_any_store_modes() {
        for mode in [StoreMode::Exclusive, StoreMode::Shared] {
            for backend in backends() {
                let mut store = AnyStore::new(mode, backend);
                assert_eq!(store.mode(), mode);
                assert_eq!(store.backend(), backend);

                store.ingest("10.0.0.0/8").unwrap();
                store.ingest("10.0.1.0/24").unwrap();
                assert!(store.ingest("10.0.0.0/33").is_err());

                assert!(store.check_ip("10.45.167.89").unwrap());
                assert_eq!(store.check_membership("11.0.0.1"), Membership::NotMember);
                assert_eq!(store.check_membership("bogus"), Membership::Indeterminate);
                assert_eq!(store.freshness(), Freshness::Clean);
                assert_eq!(store.total_ingested(), 2);
                assert_eq!(store.merged_range_count(), 1);
            }
        }
    }

    #[test]
    fn test_any_store_conversions() {
        let mut store = RangeStore::with_backend(Backend::Trie);
        store.ingest("192.168.0.0/16").unwrap();

        let any = AnyStore::from_exclusive(store, StoreMode::Shared);
        assert!(matches!(any, AnyStore::Shared(_)));
        let shared = any.into_shared();
        assert!(shared.check_ip("192.168.4.4").unwrap());

        let mut exclusive = AnyStore::Shared(shared).into_exclusive();
        assert_eq!(exclusive.index().backend(), Backend::Trie);
        assert!(exclusive.check_ip("192.168.4.4").unwrap());
    }

    #[test]
    fn test_store_mode_from_str() {
        assert_eq!("shared".parse::<StoreMode>().unwrap(), StoreMode::Shared);
        assert_eq!("Exclusive".parse::<StoreMode>().unwrap(), StoreMode::Exclusive);
        assert!("locked".parse::<StoreMode>().is_err());
    }

    #[test]
    fn test_into_inner_roundtrip() {
        let mut store = RangeStore::new();
        store.ingest("1.0.0.0/8").unwrap();
        let shared = store.into_shared();
        let mut store = shared.into_inner();
        assert_eq!(store.total_ingested(), 1);
        assert!(store.check_ip("1.2.3.4").unwrap());
    }
}

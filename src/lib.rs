//! ipfence - IPv4 range membership for blocklists and allowlists
//!
//! ipfence answers one question fast: is this IPv4 address inside any of
//! the CIDR ranges of a list? Lists are the kind published by FireHOL,
//! Spamhaus DROP and friends: one range per line, mixed with comments,
//! headers and the occasional garbage line.
//!
//! # Quick Start
//!
//! ```rust
//! use ipfence::RangeStore;
//!
//! let mut store = RangeStore::new();
//! store.ingest("192.168.0.0/16")?;
//! store.ingest("10.0.0.0/8")?;
//! store.ingest("10.0.1.0/24")?; // nested, merged away
//!
//! assert!(store.check_ip("192.168.45.78")?);
//! assert!(!store.check_ip("192.169.0.1")?);
//! assert_eq!(store.merged_range_count(), 2);
//! # Ok::<(), ipfence::FormatError>(())
//! ```
//!
//! # Loading Lists
//!
//! ```rust
//! use ipfence::{load_lines, OnBadEntry, RangeStore};
//!
//! let list = "\
//! # FireHOL level 1
//! 0.0.0.0/8
//! 1.2.3.4  ; single host, written without a prefix
//! not an address
//! ";
//!
//! let mut store = RangeStore::new();
//! let report = load_lines(&mut store, list.lines(), OnBadEntry::Skip)?;
//! assert_eq!(report.ingested, 2);
//! assert!(store.check_ip("1.2.3.4")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//!  list text ──► extractor ──► cidr parser ──► RangeIndex
//!  (files, .gz,   (find a.b.c.d/p   (validate,     ├─ IntervalIndex (sorted, merged,
//!   stdin, URLs)   in noisy lines)   clear host     │   lazily rebuilt)
//!                                    bits)          └─ BitTrie (immediate)
//!
//!  RangeStore        exclusive owner, &mut queries, no locking
//!  SharedRangeStore  RwLock, concurrent readers, double-checked rebuild
//!  AnyStore          either of the above, picked by StoreMode at runtime
//!  Shield            ordered allow/deny rules over several stores
//! ```
//!
//! # Key Features
//!
//! - **Lazy batching**: ingest is O(1); one sort and merge runs on the
//!   first query after a batch of inserts
//! - **Two backends**: merged intervals (compact, O(log n) lookups) or a
//!   bit trie (no build phase, at most 32 steps per lookup)
//! - **Concurrent reads**: share a store across threads; only a rebuild
//!   takes the write lock
//! - **Policy chains**: allow/deny rules over several lists, hot reloadable
//!   from a JSON config

#![warn(missing_docs)]
#![warn(clippy::all)]

/// IPv4 and CIDR parsing
pub mod cidr;
/// Policy configuration files
pub mod config;
pub mod error;
/// Finding ranges in list lines
pub mod extractor;
pub mod loader;
pub mod policy;
pub mod reload;
pub mod source;
pub mod store;

// Re-exports for Rust consumers

pub use crate::cidr::{parse_cidr, parse_ip, Cidr, Interval};
pub use crate::config::ShieldConfig;
pub use crate::error::{
    ConfigError, FenceError, FormatError, LoadError, Result, RetrievalError,
};
pub use crate::extractor::extract_range;
pub use crate::loader::{load_from_source, load_lines, LoadReport, OnBadEntry};
pub use crate::policy::{Action, Decision, DecisionReason, ListRule, Shield};
pub use crate::reload::ReloadableShield;
pub use crate::source::{AnySource, FileSource, ListSource, RetryingSource, StaticSource};
#[cfg(feature = "http")]
pub use crate::source::HttpSource;
pub use crate::store::{
    AnyIndex, AnyStore, Backend, BitTrie, Freshness, IntervalIndex, Membership, RangeIndex,
    RangeStore, SharedRangeStore, StoreMode,
};

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(VERSION.starts_with("0."));
    }
}

//! Populating stores from list text
//!
//! Each line goes through the extractor; lines with a range are ingested,
//! comments and lines without an address are counted and skipped. What
//! happens to an IP-shaped entry that fails to parse (`300.1.1.1`,
//! `10.0.0.0/40`) is up to the caller via [`OnBadEntry`].
//!
//! Stores are built before they are returned, so the first query against a
//! freshly loaded list doesn't pay for the merge.

use crate::error::{FenceError, FormatError, LoadError};
use crate::extractor::{classify, LineClass};
use crate::source::ListSource;
use crate::store::{AnyStore, Backend, RangeIndex, RangeStore, StoreMode};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// What to do with an entry that looks like an address but doesn't parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnBadEntry {
    /// Log it, record it in the report, keep loading
    #[default]
    Skip,
    /// Stop loading and fail
    Abort,
}

/// An entry rejected during a lenient load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    /// 1-based line number
    pub line: usize,
    /// The extracted range text
    pub entry: String,
    /// Why it was rejected
    pub reason: String,
}

/// Counts from one load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Lines read
    pub lines: usize,
    /// Entries ingested
    pub ingested: usize,
    /// Blank lines, comments and lines without an address
    pub ignored: usize,
    /// Entries that failed to parse
    pub rejected: Vec<RejectedEntry>,
}

/// Ingest every line into `store`
///
/// Returns the report, or the first bad entry when `on_bad_entry` is
/// [`OnBadEntry::Abort`]. The store is built before returning; on abort it
/// keeps whatever was ingested before the bad line.
pub fn load_lines<I, L, S>(
    store: &mut RangeStore<I>,
    lines: L,
    on_bad_entry: OnBadEntry,
) -> Result<LoadReport, LoadError>
where
    I: RangeIndex,
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = LoadReport::default();

    for (idx, line) in lines.into_iter().enumerate() {
        report.lines += 1;
        let range = match classify(line.as_ref()) {
            LineClass::Range(range) => range,
            LineClass::Blank | LineClass::Comment | LineClass::NoAddress => {
                report.ignored += 1;
                continue;
            }
        };

        match store.ingest(&range) {
            Ok(()) => report.ingested += 1,
            Err(err) => handle_bad_entry(&mut report, idx + 1, range, err, on_bad_entry)?,
        }
    }

    store.build();
    debug!(
        "loaded {} of {} lines into {} ranges",
        report.ingested,
        report.lines,
        store.merged_range_count()
    );
    Ok(report)
}

fn handle_bad_entry(
    report: &mut LoadReport,
    line: usize,
    entry: String,
    err: FormatError,
    on_bad_entry: OnBadEntry,
) -> Result<(), LoadError> {
    match on_bad_entry {
        OnBadEntry::Abort => Err(LoadError { line, source: err }),
        OnBadEntry::Skip => {
            warn!("line {}: skipping '{}': {}", line, entry, err);
            report.rejected.push(RejectedEntry {
                line,
                entry,
                reason: err.to_string(),
            });
            Ok(())
        }
    }
}

/// Fetch a list and load it into a new store of the given backend and mode
///
/// Loading always runs exclusively; a `Shared` store is published once
/// the build is done.
pub fn load_from_source<S: ListSource>(
    source: &S,
    backend: Backend,
    mode: StoreMode,
    on_bad_entry: OnBadEntry,
) -> Result<(AnyStore, LoadReport), FenceError> {
    let lines = source.fetch()?;
    let mut store = RangeStore::with_backend(backend);
    let report = load_lines(&mut store, &lines, on_bad_entry).map_err(|source_err| {
        FenceError::Load {
            location: source.location().to_string(),
            source: source_err,
        }
    })?;

    info!(
        "{}: {} ranges ingested ({} merged), {} ignored, {} rejected",
        source.location(),
        report.ingested,
        store.merged_range_count(),
        report.ignored,
        report.rejected.len()
    );
    Ok((AnyStore::from_exclusive(store, mode), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use crate::store::Freshness;

    const NETSET: &str = "\
#
# firehol_level1 (excerpt)
#
; spamhaus drop
0.0.0.0/8
10.0.0.0/8
1.2.3.4
not an address

999.1.1.1/33
5.6.7.8 # a host with a comment
";

    #[test]
    fn test_lenient_load() {
        let mut store = RangeStore::new();
        let report = load_lines(&mut store, NETSET.lines(), OnBadEntry::Skip).unwrap();

        assert_eq!(report.lines, 11);
        assert_eq!(report.ingested, 4);
        assert_eq!(report.ignored, 6);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 10);
        assert_eq!(report.rejected[0].entry, "999.1.1.1/33");

        assert_eq!(store.total_ingested(), 4);
        assert_eq!(store.freshness(), Freshness::Clean);
        assert_eq!(store.contains(0x01020304), Some(true));
        assert_eq!(store.contains(0x05060708), Some(true));
    }

    #[test]
    fn test_strict_load_aborts() {
        let mut store = RangeStore::new();
        let err = load_lines(&mut store, NETSET.lines(), OnBadEntry::Abort).unwrap_err();
        assert_eq!(err.line, 10);
        assert!(matches!(err.source, FormatError::InvalidPrefix { .. }));
        // Entries before the bad line were kept
        assert_eq!(store.total_ingested(), 3);
    }

    #[test]
    fn test_load_from_source_trie() {
        let source = StaticSource::from_text("netset", NETSET);
        let (mut store, report) =
            load_from_source(&source, Backend::Trie, StoreMode::Exclusive, OnBadEntry::Skip)
                .unwrap();

        assert_eq!(store.backend(), Backend::Trie);
        assert_eq!(store.mode(), StoreMode::Exclusive);
        assert_eq!(report.ingested, 4);
        assert!(store.check_ip("10.20.30.40").unwrap());
        assert!(!store.check_ip("11.0.0.1").unwrap());
    }

    #[test]
    fn test_load_from_source_strict_names_location() {
        let source = StaticSource::from_text("drop.txt", "1.1.1.1\n1.1.1/8\n300.0.0.0\n");
        let err = load_from_source(
            &source,
            Backend::Intervals,
            StoreMode::Exclusive,
            OnBadEntry::Abort,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("drop.txt: line 3:"), "{}", msg);
    }

    #[test]
    fn test_load_from_source_shared_is_built() {
        let source = StaticSource::from_text("netset", NETSET);
        let (store, report) =
            load_from_source(&source, Backend::Intervals, StoreMode::Shared, OnBadEntry::Skip)
                .unwrap();

        assert_eq!(store.mode(), StoreMode::Shared);
        assert_eq!(store.freshness(), Freshness::Clean);
        let shared = store.into_shared();
        assert!(shared.check_ip("5.6.7.8").unwrap());
        assert_eq!(shared.total_ingested(), report.ingested);
    }
}

#![no_main]
use ipfence::{load_lines, Backend, OnBadEntry, RangeStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (probe, list) = data.split_at(4);
    let probe = u32::from_be_bytes([probe[0], probe[1], probe[2], probe[3]]);
    let text = String::from_utf8_lossy(list);

    let mut intervals = RangeStore::with_backend(Backend::Intervals);
    let mut trie = RangeStore::with_backend(Backend::Trie);
    let a = load_lines(&mut intervals, text.lines(), OnBadEntry::Skip).unwrap();
    let b = load_lines(&mut trie, text.lines(), OnBadEntry::Skip).unwrap();

    assert_eq!(a, b);
    assert_eq!(intervals.check_addr(probe), trie.check_addr(probe));
});

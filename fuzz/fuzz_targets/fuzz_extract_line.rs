#![no_main]
use ipfence::cidr::parse_block;
use ipfence::extractor::{classify, LineClass};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);

    if let LineClass::Range(range) = classify(&line) {
        // Extracted text always has the quad/prefix shape
        let (addr, prefix) = range.split_once('/').expect("range without prefix");
        assert_eq!(addr.split('.').count(), 4);
        assert!(!prefix.is_empty() && prefix.len() <= 2);
        // Values may still be out of range; parsing must not panic
        let _ = parse_block(&range);
    }
});

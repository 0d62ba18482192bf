#![no_main]
use ipfence::cidr::{format_ipv4, parse_block, parse_ip};
use libfuzzer_sys::fuzz_target;
use std::net::Ipv4Addr;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Anything parse_ip accepts, the standard library reads the same way
    // (std is stricter: it rejects leading zeros)
    if let Ok(addr) = parse_ip(s) {
        let text = format_ipv4(addr);
        assert_eq!(text.parse::<Ipv4Addr>().map(u32::from), Ok(addr));
    }

    if let Ok(block) = parse_block(s) {
        assert!(block.prefix <= 32);
        let range = block.interval();
        assert!(range.lo <= range.hi);
        assert_eq!(range.lo, block.addr);
        // Canonical text parses back to the same block
        assert_eq!(parse_block(&block.to_string()), Ok(block));
    }
});

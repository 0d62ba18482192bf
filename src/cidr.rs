//! CIDR and IPv4 literal parsing
//!
//! Converts dotted-quad text into 32-bit values and CIDR text into closed
//! intervals. Every octet and prefix is range-checked; out-of-range input is
//! rejected with a [`FormatError`] rather than wrapped or truncated.

use crate::error::FormatError;
use std::fmt;
use std::net::Ipv4Addr;

/// Inclusive range of IPv4 addresses, `lo <= hi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    /// First address in the range
    pub lo: u32,
    /// Last address in the range
    pub hi: u32,
}

impl Interval {
    /// Create an interval, swapping the bounds if given out of order
    pub fn new(lo: u32, hi: u32) -> Self {
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    /// Interval covering a single address
    pub fn single(addr: u32) -> Self {
        Self { lo: addr, hi: addr }
    }

    /// Whether `addr` lies inside the interval
    #[inline]
    pub fn contains(&self, addr: u32) -> bool {
        self.lo <= addr && addr <= self.hi
    }

    /// Number of addresses covered (up to 2^32, hence u64)
    pub fn len(&self) -> u64 {
        u64::from(self.hi - self.lo) + 1
    }

    /// Intervals are never empty; provided for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_ipv4(self.lo), format_ipv4(self.hi))
    }
}

/// A CIDR block: network address plus prefix length
///
/// The address is stored with host bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    /// Network address, host bits zero
    pub addr: u32,
    /// Prefix length, 0..=32
    pub prefix: u8,
}

impl Cidr {
    /// Build a block from any address inside it; `prefix` must be in 0..=32
    pub fn new(addr: u32, prefix: u8) -> Result<Self, FormatError> {
        if prefix > 32 {
            return Err(FormatError::InvalidPrefix {
                text: format!("{}/{}", format_ipv4(addr), prefix),
                prefix: prefix.to_string(),
            });
        }
        Ok(Self {
            addr: addr & prefix_mask(prefix),
            prefix,
        })
    }

    /// Single-address block
    pub fn host(addr: u32) -> Self {
        Self { addr, prefix: 32 }
    }

    /// The closed interval this block covers
    pub fn interval(&self) -> Interval {
        cidr_bounds(self.addr, self.prefix)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", format_ipv4(self.addr), self.prefix)
    }
}

/// Netmask for a prefix length; `prefix` must be in 0..=32
#[inline]
pub fn prefix_mask(prefix: u8) -> u32 {
    debug_assert!(prefix <= 32);
    // Shifting a u32 by 32 overflows, so /0 is special-cased
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

/// Canonical interval for `addr/prefix`
///
/// Host bits of `addr` are ignored, so `10.1.2.3/8` and `10.0.0.0/8`
/// produce the same interval.
pub fn cidr_bounds(addr: u32, prefix: u8) -> Interval {
    let mask = prefix_mask(prefix);
    let lo = addr & mask;
    Interval { lo, hi: lo | !mask }
}

/// Parse `a.b.c.d/p` into its interval
///
/// # Example
///
/// ```
/// use ipfence::cidr::{parse_cidr, parse_ip};
///
/// let range = parse_cidr("192.168.0.0/16")?;
/// assert!(range.contains(parse_ip("192.168.45.78")?));
/// assert!(!range.contains(parse_ip("192.169.0.1")?));
/// # Ok::<(), ipfence::FormatError>(())
/// ```
pub fn parse_cidr(text: &str) -> Result<Interval, FormatError> {
    parse_block(text).map(|block| block.interval())
}

/// Parse `a.b.c.d/p` into a [`Cidr`] block
pub fn parse_block(text: &str) -> Result<Cidr, FormatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FormatError::Empty);
    }

    let (addr_part, prefix_part) = trimmed
        .split_once('/')
        .ok_or_else(|| FormatError::MissingPrefix(trimmed.to_string()))?;

    let prefix = parse_prefix(prefix_part).ok_or_else(|| FormatError::InvalidPrefix {
        text: trimmed.to_string(),
        prefix: prefix_part.to_string(),
    })?;
    let addr = parse_octets(addr_part, trimmed)?;

    Ok(Cidr {
        addr: addr & prefix_mask(prefix),
        prefix,
    })
}

/// Parse a bare dotted-quad address into its 32-bit value
pub fn parse_ip(text: &str) -> Result<u32, FormatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FormatError::Empty);
    }
    if trimmed.contains('/') {
        return Err(FormatError::UnexpectedPrefix(trimmed.to_string()));
    }
    parse_octets(trimmed, trimmed)
}

/// Render a 32-bit value as dotted quad
pub fn format_ipv4(addr: u32) -> String {
    Ipv4Addr::from(addr).to_string()
}

/// Convert an IPv4 address to its 32-bit value
#[inline]
pub fn ipv4_to_bits(addr: Ipv4Addr) -> u32 {
    u32::from_be_bytes(addr.octets())
}

/// Decimal prefix in 0..=32, digits only (no sign, no whitespace)
fn parse_prefix(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let prefix: u8 = part.parse().ok()?;
    (prefix <= 32).then_some(prefix)
}

/// Pack four dot-separated octets, most significant first
///
/// `text` is the full original input, used only for error messages.
fn parse_octets(addr: &str, text: &str) -> Result<u32, FormatError> {
    let mut value = 0u32;
    let mut found = 0usize;

    for part in addr.split('.') {
        found += 1;
        if found > 4 {
            continue; // keep counting for the error message
        }
        let octet = parse_octet(part).ok_or_else(|| FormatError::InvalidOctet {
            text: text.to_string(),
            octet: part.to_string(),
        })?;
        value = (value << 8) | u32::from(octet);
    }

    if found != 4 {
        return Err(FormatError::OctetCount {
            text: text.to_string(),
            found,
        });
    }
    Ok(value)
}

/// One octet: 1-3 ASCII digits with value 0..=255
fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // u8::parse already ensures 0-255 range
    part.parse().ok()
}

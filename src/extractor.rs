//! Extraction of CIDR ranges and IPv4 addresses from list lines.
//!
//! Blocklists come in many loosely related formats: plain CIDR lists,
//! `netset` files, hosts-style `addr name` lines, log excerpts with
//! trailing commentary. Rather than parsing each format, every line is
//! scanned for the first dotted-quad token and that token is taken as the
//! entry:
//!
//! 1. the leftmost `a.b.c.d/p` token, if any
//! 2. otherwise the leftmost bare `a.b.c.d`, promoted to `/32`
//!
//! Tokens are recognized by *shape* only (1-3 digit octets, 1-2 digit
//! prefix, word boundaries on both sides). Octet and prefix values are
//! checked later by [`crate::cidr::parse_cidr`], so an IP-shaped but invalid
//! token such as `999.1.1.1/33` surfaces as a format error instead of being
//! silently skipped.

use memchr::{memchr, memchr_iter};

/// What a single list line contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Empty or whitespace-only line
    Blank,
    /// Line starting with `#` or `;`
    Comment,
    /// Normalized `a.b.c.d/p` text of the first range token
    Range(String),
    /// No IPv4-shaped token anywhere in the line
    NoAddress,
}

/// Classify one line of list text
pub fn classify(line: &str) -> LineClass {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        return LineClass::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return LineClass::Comment;
    }
    match find_range(trimmed.as_bytes()) {
        Some(range) => LineClass::Range(range),
        None => LineClass::NoAddress,
    }
}

/// Extract the normalized range from a line, if it has one
///
/// # Example
///
/// ```
/// use ipfence::extractor::extract_range;
///
/// assert_eq!(extract_range("10.0.0.0/8 ; RFC1918").as_deref(), Some("10.0.0.0/8"));
/// assert_eq!(extract_range("0.0.0.0 ads.example.com").as_deref(), Some("0.0.0.0/32"));
/// assert_eq!(extract_range("# 1.2.3.4"), None);
/// assert_eq!(extract_range("no address here"), None);
/// ```
pub fn extract_range(line: &str) -> Option<String> {
    match classify(line) {
        LineClass::Range(range) => Some(range),
        _ => None,
    }
}

/// Find the range token in a non-comment line
fn find_range(line: &[u8]) -> Option<String> {
    // Quick reject: a dotted quad needs at least 3 dots
    if memchr_iter(b'.', line).nth(2).is_none() {
        return None;
    }

    if memchr(b'/', line).is_some() {
        if let Some((start, end)) = scan(line, true) {
            return Some(to_string(&line[start..end]));
        }
    }

    scan(line, false).map(|(start, end)| {
        let mut range = to_string(&line[start..end]);
        range.push_str("/32");
        range
    })
}

/// Leftmost token matching the quad (or quad/prefix) shape
fn scan(line: &[u8], with_prefix: bool) -> Option<(usize, usize)> {
    let mut pos = 0;
    while pos < line.len() {
        let b = line[pos];
        if b.is_ascii_digit() && (pos == 0 || !is_word_byte(line[pos - 1])) {
            if let Some(end) = match_token(line, pos, with_prefix) {
                return Some((pos, end));
            }
        }
        pos += 1;
    }
    None
}

/// Try to match a token starting at `start`, returning its exclusive end
fn match_token(line: &[u8], start: usize, with_prefix: bool) -> Option<usize> {
    let mut pos = start;

    for octet_idx in 0..4 {
        pos = digit_run(line, pos, 3)?;

        if octet_idx < 3 {
            if line.get(pos) != Some(&b'.') {
                return None; // Missing dot
            }
            pos += 1;
        }
    }

    if with_prefix {
        if line.get(pos) != Some(&b'/') {
            return None;
        }
        pos = digit_run(line, pos + 1, 2)?;
    }

    // Token must end on a word boundary
    match line.get(pos) {
        Some(&b) if is_word_byte(b) => None,
        _ => Some(pos),
    }
}

/// Consume a run of 1..=max digits; a longer run doesn't match
fn digit_run(line: &[u8], start: usize, max: usize) -> Option<usize> {
    let len = line[start.min(line.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len == 0 || len > max {
        None
    } else {
        Some(start + len)
    }
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn to_string(token: &[u8]) -> String {
    // Tokens contain only ASCII digits, dots and a slash
    token.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_blanks() {
        assert_eq!(classify(""), LineClass::Blank);
        assert_eq!(classify("   \t"), LineClass::Blank);
        assert_eq!(classify("# 10.0.0.0/8"), LineClass::Comment);
        assert_eq!(classify("; 10.0.0.0/8"), LineClass::Comment);
        assert_eq!(classify("  # indented"), LineClass::Comment);
    }

    #[test]
    fn test_cidr_extraction() {
        assert_eq!(extract_range("10.0.0.0/8").as_deref(), Some("10.0.0.0/8"));
        assert_eq!(
            extract_range("  192.168.0.0/16  # private").as_deref(),
            Some("192.168.0.0/16")
        );
        assert_eq!(
            extract_range("1.2.3.0/24 ; SBL123456").as_deref(),
            Some("1.2.3.0/24")
        );
    }

    #[test]
    fn test_bare_ip_promoted() {
        assert_eq!(extract_range("1.2.3.4").as_deref(), Some("1.2.3.4/32"));
        assert_eq!(
            extract_range("Server at 192.168.1.1 responded").as_deref(),
            Some("192.168.1.1/32")
        );
    }

    #[test]
    fn test_cidr_preferred_over_earlier_ip() {
        assert_eq!(
            extract_range("1.1.1.1 via 10.0.0.0/8").as_deref(),
            Some("10.0.0.0/8")
        );
    }

    #[test]
    fn test_leftmost_ip_wins() {
        assert_eq!(
            extract_range("from 10.0.0.5 to 172.16.0.10").as_deref(),
            Some("10.0.0.5/32")
        );
    }

    #[test]
    fn test_shape_only_no_value_check() {
        // Invalid values are extracted so the parser can report them
        assert_eq!(
            extract_range("999.1.1.1/33").as_deref(),
            Some("999.1.1.1/33")
        );
        assert_eq!(extract_range("256.1.1.1").as_deref(), Some("256.1.1.1/32"));
    }

    #[test]
    fn test_word_boundaries() {
        // Leading word character: no boundary
        assert_eq!(extract_range("a1.2.3.4"), None);
        assert_eq!(extract_range("1.2.3.4b"), None);
        // Too many digits in an octet
        assert_eq!(extract_range("1234.1.1.1"), None);
        assert_eq!(extract_range("1.2.3.4567"), None);
        // A later quad after a dot boundary still matches
        assert_eq!(extract_range("1234.5.6.7.8").as_deref(), Some("5.6.7.8/32"));
        // Too few octets
        assert_eq!(extract_range("1.2.3"), None);
    }

    #[test]
    fn test_three_digit_prefix_falls_back_to_ip() {
        assert_eq!(extract_range("1.2.3.4/245").as_deref(), Some("1.2.3.4/32"));
    }

    #[test]
    fn test_trailing_dot_quad() {
        assert_eq!(extract_range("1.2.3.4.5.6").as_deref(), Some("1.2.3.4/32"));
    }

    #[test]
    fn test_no_address() {
        assert_eq!(classify("example.com"), LineClass::NoAddress);
        assert_eq!(classify("::1 localhost"), LineClass::NoAddress);
        assert_eq!(classify("version 1.2.3"), LineClass::NoAddress);
    }
}

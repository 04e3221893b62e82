//! @dose
//! purpose: Code-unit classification for the scanner. All structural tokens are ASCII, so the
//!     scanner works on bytes.
//!
//! gotchas:
//!     - Any byte >= 0x80 is an identifier part. This keeps non-ASCII identifiers intact and
//!       every slice boundary on a char boundary

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

#[inline]
pub fn is_line_break(b: u8) -> bool {
    matches!(b, b'\n' | b'\r')
}

#[inline]
pub fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

#[inline]
pub fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

#[inline]
pub fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline]
pub fn is_quote(b: u8) -> bool {
    matches!(b, b'\'' | b'"' | b'`')
}

/// Byte length of the UTF-8 sequence introduced by `b`
#[inline]
pub fn utf8_len(b: u8) -> usize {
    match b {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        // Continuation or invalid lead byte; advance one byte
        _ => 1,
    }
}

/// Whether `word` is a valid identifier (used for names and `export default x`)
pub fn is_identifier(word: &str) -> bool {
    let bytes = word.as_bytes();
    match bytes.first() {
        Some(&b) if is_ident_start(b) => bytes.iter().all(|&b| is_ident_part(b)),
        _ => false,
    }
}

/// Whether `text` is a dotted identifier path such as `a.b.c`
pub fn is_entity_name(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_classes() {
        assert!(is_ident_start(b'a'));
        assert!(is_ident_start(b'$'));
        assert!(is_ident_start(b'_'));
        assert!(!is_ident_start(b'1'));
        assert!(is_ident_part(b'1'));
        assert!(!is_ident_part(b'-'));
        // Non-ASCII bytes continue identifiers
        assert!(is_ident_start("é".as_bytes()[0]));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("foo"));
        assert!(is_identifier("$el"));
        assert!(is_identifier("café"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
        assert!(is_entity_name("a.b.c"));
        assert!(!is_entity_name("a..b"));
    }

    #[test]
    fn test_utf8_len() {
        assert_eq!(utf8_len(b'a'), 1);
        assert_eq!(utf8_len("é".as_bytes()[0]), 2);
        assert_eq!(utf8_len("中".as_bytes()[0]), 3);
        assert_eq!(utf8_len("🌍".as_bytes()[0]), 4);
    }

    #[test]
    fn test_whitespace() {
        assert!(is_whitespace(b' '));
        assert!(is_whitespace(b'\n'));
        assert!(is_line_break(b'\r'));
        assert!(!is_line_break(b' '));
        assert!(!is_whitespace(b'x'));
    }
}

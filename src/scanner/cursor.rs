//! @dose
//! purpose: The scan cursor, a source buffer plus a byte offset. The lexical skippers, the
//!     structural matcher and the boundary heuristic are all methods on Cursor, so sub-scans
//!     over slices share one set of primitives.
//!
//! invariants:
//!     - seek() never moves backward; rewind() is for lookahead probes only
//!     - slice() returns "" rather than panicking off a char boundary

use super::chars::{is_ident_part, is_ident_start, utf8_len};

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pub(crate) pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    pub fn byte_at(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Advance by `n` bytes, clamped to end of input
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.bytes.len());
    }

    /// Advance past one whole character
    #[inline]
    pub fn bump(&mut self) {
        if let Some(b) = self.peek() {
            self.advance(utf8_len(b));
        }
    }

    /// Move to `to`; the cursor never moves backward
    #[inline]
    pub fn seek(&mut self, to: usize) {
        if to > self.pos {
            self.pos = to.min(self.bytes.len());
        }
    }

    /// Restore a previously saved position (lookahead probes only)
    #[inline]
    pub(crate) fn rewind(&mut self, to: usize) {
        self.pos = to;
    }

    /// Bytes between the start of the line holding `pos` and `pos`
    pub fn column_of(&self, pos: usize) -> usize {
        let pos = pos.min(self.bytes.len());
        self.bytes[..pos]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .count()
    }

    /// Source text between two offsets; empty if the range is not on char boundaries
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.bytes.len());
        if start >= end {
            return "";
        }
        self.src.get(start..end).unwrap_or_default()
    }

    #[inline]
    pub fn rest(&self) -> &'a str {
        self.slice(self.pos, self.bytes.len())
    }

    #[inline]
    pub fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos.min(self.bytes.len())..].starts_with(s.as_bytes())
    }

    /// Consume `b` if it is the next byte
    #[inline]
    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Identifier starting at `index`, without consuming it
    pub fn word_at(&self, index: usize) -> &'a str {
        match self.byte_at(index) {
            Some(b) if is_ident_start(b) => {}
            _ => return "",
        }
        let mut end = index;
        while let Some(b) = self.byte_at(end) {
            if !is_ident_part(b) {
                break;
            }
            end += 1;
        }
        self.slice(index, end)
    }

    #[inline]
    pub fn peek_word(&self) -> &'a str {
        self.word_at(self.pos)
    }

    /// Consume and return the identifier at the cursor (empty if none)
    pub fn read_word(&mut self) -> &'a str {
        let word = self.peek_word();
        self.advance(word.len());
        word
    }

    /// Consume `word` if it is the identifier at the cursor
    pub fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_word() == word {
            self.advance(word.len());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_navigation() {
        let mut cur = Cursor::new("export const x");
        assert_eq!(cur.peek_word(), "export");
        assert!(!cur.eat_word("exp"));
        assert!(cur.eat_word("export"));
        assert_eq!(cur.peek(), Some(b' '));
        cur.advance(1);
        assert_eq!(cur.read_word(), "const");
        assert_eq!(cur.pos(), 12);
    }

    #[test]
    fn test_column_of() {
        let cur = Cursor::new("a\n    b\nc");
        assert_eq!(cur.column_of(0), 0);
        assert_eq!(cur.column_of(6), 4);
        assert_eq!(cur.column_of(8), 0);
        assert_eq!(cur.column_of(99), 1);
    }

    #[test]
    fn test_seek_never_moves_backward() {
        let mut cur = Cursor::new("abcdef");
        cur.seek(4);
        cur.seek(2);
        assert_eq!(cur.pos(), 4);
        cur.seek(100);
        assert!(cur.at_end());
    }

    #[test]
    fn test_slice_off_char_boundary_is_empty() {
        let cur = Cursor::new("é!");
        assert_eq!(cur.slice(0, 2), "é");
        assert_eq!(cur.slice(1, 3), "");
        assert_eq!(cur.slice(2, 1), "");
    }

    #[test]
    fn test_bump_steps_whole_chars() {
        let mut cur = Cursor::new("中x");
        cur.bump();
        assert_eq!(cur.peek(), Some(b'x'));
    }
}

//! @dose
//! purpose: The structural matcher and the depth-aware span scanners built on it. Given the
//!     cursor on an opening delimiter, find_matching advances past its matching close while
//!     treating strings, templates, comments and regex literals as opaque. The span scanners
//!     read type annotations, return types and initializer expressions up to a statement or
//!     member boundary.
//!
//! when-editing:
//!     - !A '>' immediately preceded by '=' is part of an arrow token, never a closing angle
//!     - !find_matching runs to end of input when no close exists; it never fails
//!     - Return types absorb a '{' only when it starts an object-shaped type
//!
//! invariants:
//!     - Every scanner here only moves the cursor forward
//!     - Only the delimiter kind being matched is depth-counted; other kinds are ignored
//!
//! gotchas:
//!     - A line ending in an operator (`:`, `|`, `=>`, `,` ...) always continues, whatever
//!       the next line starts with
//!     - Expressions only match '<' when it is the first token (a generic arrow function);
//!       anywhere else it may be a less-than operator
//!     - split_top_level treats '<' as an angle only after an identifier or a type operator

use super::chars::{is_ident_part, is_whitespace};
use super::cursor::Cursor;

/// Which statement-boundary variant applies while scanning a span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    TopLevel,
    Member,
}

/// Type text endings after which a '{' opens an object type rather than a body
const OBJECT_TYPE_LEADERS: &[&str] = &["|", "&", "=>", "?", ":", "<", ",", "("];
const OBJECT_TYPE_LEADER_WORDS: &[&str] = &["is", "extends", "keyof", "readonly"];

/// Marker recorded as the previous significant byte after an opaque operand
const OPERAND: u8 = b'a';

/// Whether a line ending in `prev` is incomplete, so the next line continues it
fn continues_line(prev: Option<u8>) -> bool {
    matches!(
        prev,
        Some(b':' | b'|' | b'&' | b',' | b'=' | b'?' | b'.' | b'+' | b'-' | b'*' | b'%')
    )
}

fn closer_for(open: u8) -> Option<u8> {
    match open {
        b'{' => Some(b'}'),
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'<' => Some(b'>'),
        _ => None,
    }
}

/// Whether `text` ends with `word` as a whole word
pub fn ends_with_word(text: &str, word: &str) -> bool {
    if !text.ends_with(word) {
        return false;
    }
    let before = text.len() - word.len();
    before == 0 || !is_ident_part(text.as_bytes()[before - 1])
}

/// Whether a '{' following `so_far` starts an object-shaped type
pub fn opens_object_type(so_far: &str) -> bool {
    let so_far = so_far.trim_end();
    so_far.is_empty()
        || OBJECT_TYPE_LEADERS.iter().any(|op| so_far.ends_with(op))
        || OBJECT_TYPE_LEADER_WORDS
            .iter()
            .any(|word| ends_with_word(so_far, word))
}

impl<'a> Cursor<'a> {
    /// Skip an opaque span at the cursor, updating `prev` like a token would
    fn skip_opaque_tracking(&mut self, prev: &mut Option<u8>) -> bool {
        let is_comment = self.peek() == Some(b'/') && matches!(self.peek_at(1), Some(b'/' | b'*'));
        if !self.skip_opaque(*prev) {
            return false;
        }
        if !is_comment {
            *prev = Some(OPERAND);
        }
        true
    }

    /// With the cursor on an opening delimiter, advance past its matching close and return
    /// the new position. Runs to end of input if the close is missing.
    pub fn find_matching(&mut self) -> usize {
        let Some(open) = self.peek() else {
            return self.pos;
        };
        let Some(close) = closer_for(open) else {
            self.bump();
            return self.pos;
        };
        self.advance(1);
        let mut depth = 1usize;
        let mut prev = Some(open);
        while let Some(b) = self.peek() {
            if self.skip_opaque_tracking(&mut prev) {
                continue;
            }
            if b == close {
                let arrow = close == b'>' && self.pos > 0 && self.byte_at(self.pos - 1) == Some(b'=');
                if !arrow {
                    depth -= 1;
                    if depth == 0 {
                        self.advance(1);
                        return self.pos;
                    }
                }
            } else if b == open {
                depth += 1;
            }
            if !is_whitespace(b) {
                prev = Some(b);
            }
            self.bump();
        }
        self.pos
    }

    /// Slice of a balanced span starting at the cursor; the cursor moves past it
    pub fn read_balanced(&mut self) -> &'a str {
        let start = self.pos;
        let end = self.find_matching();
        self.slice(start, end)
    }

    fn at_boundary(&mut self, ctx: Context) -> bool {
        match ctx {
            Context::TopLevel => self.is_statement_boundary(),
            Context::Member => self.is_member_boundary(),
        }
    }

    /// Scan a type annotation up to a byte in `stops`, ';', an unmatched closer or a
    /// boundary line break. Returns the trimmed type text.
    pub fn scan_type(&mut self, stops: &[u8], ctx: Context) -> &'a str {
        let start = self.pos;
        let mut prev = None;
        while let Some(b) = self.peek() {
            if self.skip_opaque_tracking(&mut prev) {
                continue;
            }
            match b {
                b'(' | b'[' | b'{' | b'<' => {
                    self.find_matching();
                    prev = closer_for(b);
                    continue;
                }
                b')' | b']' | b'}' | b';' => break,
                b'=' if self.peek_at(1) == Some(b'>') => {
                    self.advance(2);
                    prev = Some(b'=');
                    continue;
                }
                b'\n' if !continues_line(prev) && self.at_boundary(ctx) => break,
                _ if stops.contains(&b) => break,
                _ => {}
            }
            if !is_whitespace(b) {
                prev = Some(b);
            }
            self.bump();
        }
        self.slice(start, self.pos).trim()
    }

    /// Scan a return type. A '{' is absorbed into the type only when it starts an
    /// object-shaped type; otherwise it is the implementation body and ends the scan.
    pub fn scan_return_type(&mut self, ctx: Context) -> &'a str {
        let start = self.pos;
        let mut prev = None;
        while let Some(b) = self.peek() {
            if self.skip_opaque_tracking(&mut prev) {
                continue;
            }
            match b {
                b'{' => {
                    if !opens_object_type(self.slice(start, self.pos)) {
                        break;
                    }
                    self.find_matching();
                    prev = Some(b'}');
                    continue;
                }
                b'(' | b'[' | b'<' => {
                    self.find_matching();
                    prev = closer_for(b);
                    continue;
                }
                b')' | b']' | b'}' | b';' | b',' => break,
                b'=' if self.peek_at(1) == Some(b'>') => {
                    self.advance(2);
                    prev = Some(b'=');
                    continue;
                }
                b'\n' if !continues_line(prev) && self.at_boundary(ctx) => break,
                _ => {}
            }
            if !is_whitespace(b) {
                prev = Some(b);
            }
            self.bump();
        }
        self.slice(start, self.pos).trim()
    }

    /// Scan an initializer or statement expression up to a byte in `stops`, ';', an
    /// unmatched closer or a boundary line break. Returns the trimmed expression text.
    pub fn scan_expression(&mut self, stops: &[u8], ctx: Context) -> &'a str {
        let start = self.pos;
        let mut prev = None;
        while let Some(b) = self.peek() {
            if self.skip_opaque_tracking(&mut prev) {
                continue;
            }
            match b {
                b'(' | b'[' | b'{' => {
                    self.find_matching();
                    prev = closer_for(b);
                    continue;
                }
                b'<' if self.slice(start, self.pos).trim().is_empty() => {
                    self.find_matching();
                    prev = Some(b'>');
                    continue;
                }
                b')' | b']' | b'}' | b';' => break,
                b'\n' if !continues_line(prev) && self.at_boundary(ctx) => break,
                _ if stops.contains(&b) => break,
                _ => {}
            }
            if !is_whitespace(b) {
                prev = Some(b);
            }
            self.bump();
        }
        self.slice(start, self.pos).trim()
    }

    /// Generic fallback: skip the statement at the cursor, always making progress
    pub fn skip_statement(&mut self, ctx: Context) {
        let start = self.pos;
        self.scan_expression(&[], ctx);
        self.eat(b';');
        if self.pos == start {
            self.bump();
        }
    }
}

/// Visit every byte of `text` that sits at nesting depth zero outside opaque spans,
/// including the openers of top-level groups. The visitor returns true to stop the walk.
fn walk_top_level(text: &str, mut visit: impl FnMut(usize, u8) -> bool) {
    let mut cur = Cursor::new(text);
    let mut depth = 0usize;
    let mut angle = 0usize;
    let mut prev: Option<u8> = None;
    while let Some(b) = cur.peek() {
        if cur.skip_opaque_tracking(&mut prev) {
            continue;
        }
        let pos = cur.pos();
        let raw_prev = if pos > 0 { cur.byte_at(pos - 1) } else { None };
        match b {
            b'(' | b'[' | b'{' => {
                if depth == 0 && angle == 0 && visit(pos, b) {
                    return;
                }
                depth += 1
            }
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'<' if raw_prev.is_some_and(is_ident_part)
                || prev.map_or(true, |p| b"(,:=|&<".contains(&p)) =>
            {
                angle += 1
            }
            b'>' if angle > 0 && raw_prev != Some(b'=') => angle -= 1,
            _ if depth == 0 && angle == 0 => {
                if visit(pos, b) {
                    return;
                }
            }
            _ => {}
        }
        if !is_whitespace(b) {
            prev = Some(b);
        }
        cur.bump();
    }
}

/// Split `text` on `sep` at nesting depth zero. Pieces are trimmed; empty pieces dropped.
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    walk_top_level(text, |pos, b| {
        if b == sep {
            parts.push(&text[start..pos]);
            start = pos + 1;
        }
        false
    });
    parts.push(&text[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Offset of the first `target` byte at nesting depth zero. When looking for '=', the
/// operators '=>', '==', '!=', '<=' and '>=' are not matches.
pub fn find_top_level(text: &str, target: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut found = None;
    walk_top_level(text, |pos, b| {
        if b != target {
            return false;
        }
        if target == b'=' {
            let next = bytes.get(pos + 1).copied();
            let before = if pos > 0 { bytes.get(pos - 1).copied() } else { None };
            if matches!(next, Some(b'>' | b'='))
                || matches!(before, Some(b'=' | b'!' | b'<' | b'>'))
            {
                return false;
            }
        }
        found = Some(pos);
        true
    });
    found
}

/// Offset of the first top-level `=>`
pub fn find_top_level_arrow(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut found = None;
    walk_top_level(text, |pos, b| {
        if b == b'=' && bytes.get(pos + 1) == Some(&b'>') {
            found = Some(pos);
            return true;
        }
        false
    });
    found
}

/// Offset of the last occurrence of `word` (as a whole word) at nesting depth zero
pub fn rfind_top_level_word(text: &str, word: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let first = word.as_bytes()[0];
    let mut found = None;
    walk_top_level(text, |pos, b| {
        if b == first && text[pos..].starts_with(word) {
            let before_ok = pos == 0 || !is_ident_part(bytes[pos - 1]);
            let after_ok = bytes
                .get(pos + word.len())
                .map_or(true, |&next| !is_ident_part(next));
            if before_ok && after_ok {
                found = Some(pos);
            }
        }
        false
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(src: &str) -> &str {
        let mut cur = Cursor::new(src);
        let end = cur.find_matching();
        &src[end..]
    }

    #[test]
    fn test_match_braces_with_opaque_contents() {
        assert_eq!(matched("{ a: '}', b: `}` } rest"), " rest");
        assert_eq!(matched("{ // }\n x } rest"), " rest");
        assert_eq!(matched("{ /* } */ } rest"), " rest");
        assert_eq!(matched("{ r = /}/ } rest"), " rest");
    }

    #[test]
    fn test_match_angles_skips_arrows() {
        assert_eq!(matched("<T extends (a: string) => void> rest"), " rest");
        assert_eq!(matched("<Map<K, Array<V>>> rest"), " rest");
    }

    #[test]
    fn test_unbalanced_runs_to_end() {
        let src = "{ never closed (";
        let mut cur = Cursor::new(src);
        assert_eq!(cur.find_matching(), src.len());
    }

    #[test]
    fn test_scan_type_stops_at_boundary() {
        let mut cur = Cursor::new("Map<string,\n  number>\nexport const y = 1");
        assert_eq!(cur.scan_type(&[b'='], Context::TopLevel), "Map<string,\n  number>");
        assert_eq!(cur.peek(), Some(b'\n'));
    }

    #[test]
    fn test_scan_type_member_continuation() {
        let mut cur = Cursor::new("'a'\n    | 'b'\n  next: number");
        assert_eq!(cur.scan_type(&[b'='], Context::Member), "'a'\n    | 'b'");
    }

    #[test]
    fn test_trailing_operator_continues_line() {
        let mut cur = Cursor::new("A |\n  export\nexport");
        assert_eq!(cur.scan_type(&[], Context::TopLevel), "A |\n  export");
        let mut cur = Cursor::new("(x: number) =>\n  void\n  b: 1");
        assert_eq!(cur.scan_type(&[], Context::Member), "(x: number) =>\n  void");
    }

    #[test]
    fn test_scan_type_does_not_stop_on_arrow() {
        let mut cur = Cursor::new("(a: number) => void = noop");
        assert_eq!(cur.scan_type(&[b'='], Context::TopLevel), "(a: number) => void");
    }

    #[test]
    fn test_return_type_object_vs_body() {
        let mut cur = Cursor::new("{ a: number } { return x }");
        assert_eq!(cur.scan_return_type(Context::TopLevel), "{ a: number }");

        let mut cur = Cursor::new("string { return x }");
        assert_eq!(cur.scan_return_type(Context::TopLevel), "string");
        assert_eq!(cur.peek(), Some(b'{'));

        let mut cur = Cursor::new("A | { b: 1 } {}");
        assert_eq!(cur.scan_return_type(Context::TopLevel), "A | { b: 1 }");

        let mut cur = Cursor::new("x is { id: string } {}");
        assert_eq!(cur.scan_return_type(Context::TopLevel), "x is { id: string }");
    }

    #[test]
    fn test_scan_expression_generic_arrow() {
        let mut cur = Cursor::new("<T, U>(a: T, b: U) => a, next = 1");
        assert_eq!(cur.scan_expression(b",", Context::TopLevel), "<T, U>(a: T, b: U) => a");
    }

    #[test]
    fn test_skip_statement_makes_progress() {
        let mut cur = Cursor::new("}");
        cur.skip_statement(Context::TopLevel);
        assert!(cur.at_end());

        let mut cur = Cursor::new("console.log('x');\nexport");
        cur.skip_statement(Context::TopLevel);
        assert_eq!(cur.rest(), "\nexport");
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a: Map<K, V>, b = f(1, 2), { c, d }: T", b','),
            vec!["a: Map<K, V>", "b = f(1, 2)", "{ c, d }: T"]
        );
        assert_eq!(split_top_level("a, , b,", b','), vec!["a", "b"]);
        assert_eq!(split_top_level("", b','), Vec::<&str>::new());
    }

    #[test]
    fn test_find_top_level_equals() {
        assert_eq!(find_top_level("cb: (x) => void = noop", b'='), Some(16));
        assert_eq!(find_top_level("a: T", b'='), None);
        assert_eq!(find_top_level("x = a == b", b'='), Some(2));
    }

    #[test]
    fn test_find_top_level_openers_and_arrows() {
        assert_eq!(find_top_level("run<T>(x: T): void", b'('), Some(6));
        assert_eq!(find_top_level("a: { b: 1 }", b'{'), Some(3));
        assert_eq!(find_top_level_arrow("(a: number) => void"), Some(12));
        assert_eq!(find_top_level_arrow("{ f: () => 1 }"), None);
    }

    #[test]
    fn test_rfind_top_level_word() {
        assert_eq!(rfind_top_level_word("x as Foo", "as"), Some(2));
        assert_eq!(rfind_top_level_word("f(x as A) as B", "as"), Some(10));
        assert_eq!(rfind_top_level_word("alias", "as"), None);
    }

    #[test]
    fn test_opens_object_type() {
        assert!(opens_object_type(""));
        assert!(opens_object_type("A |"));
        assert!(opens_object_type("x is"));
        assert!(opens_object_type("T extends"));
        assert!(!opens_object_type("void"));
        assert!(!opens_object_type("this"));
    }
}

//! @dose
//! purpose: Lexical skippers. These consume whitespace, comments, quoted strings, template
//!     literals and regex literals as opaque spans so that no structural token inside them is
//!     ever seen by the matcher, the boundary heuristic or an extractor.
//!
//! when-editing:
//!     - !Every skipper must advance at least one byte when it is positioned on its opener
//!     - !Unterminated quoted strings stop at the line break (the break is not consumed)
//!     - Template interpolations track their own brace depth; a backtick only closes the
//!       literal at interpolation depth zero
//!
//! invariants:
//!     - Skippers never move the cursor backward and never run past end of input
//!     - Template recursion is bounded by limits::MAX_TEMPLATE_DEPTH
//!
//! gotchas:
//!     - A '/' is a regex opener only when the previous significant byte cannot end an
//!       operand; after an identifier or ')' it is division, unless that identifier is an
//!       operator keyword such as `return` or `typeof`
//!     - A keyword after `.` is a property name, so `a.return / 2` stays division

use super::chars::{is_ident_part, is_line_break, is_whitespace};
use super::cursor::Cursor;
use crate::limits::MAX_TEMPLATE_DEPTH;

/// Bytes after which a '/' starts a regex literal rather than a division
const REGEX_PRECEDERS: &[u8] = b"(,=:[!&|?{};+-*%<>~^";

/// Keywords after which an expression, and therefore a regex literal, may start
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "throw", "yield", "await", "in", "of", "delete", "void", "new",
    "instanceof", "else", "do",
];

/// Longest entry of REGEX_KEYWORDS
const MAX_REGEX_KEYWORD_LEN: usize = 10;

/// Whether a '/' following `prev` opens a regex literal
#[inline]
pub fn regex_allowed(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(b) => REGEX_PRECEDERS.contains(&b),
    }
}

/// Whether the word ending just before `end` in `bytes` is an operator keyword
fn keyword_before(bytes: &[u8], end: usize) -> bool {
    let mut end = end.min(bytes.len());
    while end > 0 && is_whitespace(bytes[end - 1]) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_ident_part(bytes[start - 1]) {
        start -= 1;
        if end - start > MAX_REGEX_KEYWORD_LEN {
            return false;
        }
    }
    if start == end || (start > 0 && matches!(bytes[start - 1], b'.' | b'$')) {
        return false;
    }
    std::str::from_utf8(&bytes[start..end]).is_ok_and(|word| REGEX_KEYWORDS.contains(&word))
}

impl<'a> Cursor<'a> {
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skip whitespace on the current line only
    pub fn skip_inline_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) || is_line_break(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skip whitespace and comments
    pub fn skip_trivia(&mut self) {
        self.skip_trivia_into(None);
    }

    /// Skip whitespace and comments, collecting the comments that immediately precede the
    /// next token into `sink`. A blank line detaches earlier comments.
    pub fn skip_trivia_into(&mut self, mut sink: Option<&mut Vec<String>>) {
        let mut line_breaks = 0usize;
        let mut seen_comment = false;
        loop {
            match self.peek() {
                Some(b'\n') => {
                    line_breaks += 1;
                    self.pos += 1;
                }
                Some(b) if is_whitespace(b) => self.pos += 1,
                Some(b'/') if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => {
                    let start = self.pos;
                    if self.peek_at(1) == Some(b'/') {
                        self.skip_line_comment();
                    } else {
                        self.skip_block_comment();
                    }
                    if let Some(sink) = sink.as_deref_mut() {
                        if seen_comment && line_breaks >= 2 {
                            sink.clear();
                        }
                        let text = self.slice(start, self.pos);
                        if is_doc_comment(text) {
                            sink.push(text.trim_end().to_string());
                            seen_comment = true;
                        }
                    }
                    line_breaks = 0;
                }
                _ => break,
            }
        }
        if let Some(sink) = sink {
            if seen_comment && line_breaks >= 2 {
                sink.clear();
            }
        }
    }

    /// Skip a `//` comment up to (not including) the line break
    pub fn skip_line_comment(&mut self) {
        self.advance(2);
        while let Some(b) = self.peek() {
            if is_line_break(b) {
                break;
            }
            self.bump();
        }
    }

    /// Skip a `/* ... */` comment; unterminated comments run to end of input
    pub fn skip_block_comment(&mut self) {
        self.advance(2);
        while !self.at_end() {
            if self.starts_with("*/") {
                self.advance(2);
                return;
            }
            self.bump();
        }
    }

    /// Skip a single- or double-quoted string
    pub fn skip_string(&mut self) {
        let Some(quote) = self.peek() else { return };
        self.advance(1);
        while let Some(b) = self.peek() {
            match b {
                b'\\' => {
                    self.advance(1);
                    self.bump();
                }
                _ if b == quote => {
                    self.advance(1);
                    return;
                }
                _ if is_line_break(b) => return,
                _ => self.bump(),
            }
        }
    }

    /// Skip a template literal including nested interpolations
    pub fn skip_template(&mut self) {
        self.skip_template_nested(0);
    }

    fn skip_template_nested(&mut self, depth: usize) {
        self.advance(1);
        let mut interpolation = 0usize;
        while let Some(b) = self.peek() {
            if interpolation == 0 {
                match b {
                    b'\\' => {
                        self.advance(1);
                        self.bump();
                    }
                    b'`' => {
                        self.advance(1);
                        return;
                    }
                    b'$' if self.peek_at(1) == Some(b'{') => {
                        interpolation = 1;
                        self.advance(2);
                    }
                    _ => self.bump(),
                }
                continue;
            }
            match b {
                b'{' => {
                    interpolation += 1;
                    self.advance(1);
                }
                b'}' => {
                    interpolation -= 1;
                    self.advance(1);
                }
                b'`' if depth < MAX_TEMPLATE_DEPTH => self.skip_template_nested(depth + 1),
                b'\'' | b'"' => self.skip_string(),
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                _ => self.bump(),
            }
        }
    }

    /// Skip a regex literal and its flags
    pub fn skip_regex(&mut self) {
        self.advance(1);
        let mut in_class = false;
        while let Some(b) = self.peek() {
            match b {
                b'\\' => {
                    self.advance(1);
                    self.bump();
                }
                b'[' => {
                    in_class = true;
                    self.advance(1);
                }
                b']' => {
                    in_class = false;
                    self.advance(1);
                }
                b'/' if !in_class => {
                    self.advance(1);
                    while matches!(self.peek(), Some(b) if is_ident_part(b)) {
                        self.advance(1);
                    }
                    return;
                }
                _ if is_line_break(b) => return,
                _ => self.bump(),
            }
        }
    }

    fn after_regex_keyword(&self) -> bool {
        keyword_before(self.slice(0, self.pos).as_bytes(), self.pos)
    }

    /// If the cursor is on a string, template, comment or regex opener, skip that span.
    /// `prev` is the previous significant byte, used to recognise regex literals.
    pub fn skip_opaque(&mut self, prev: Option<u8>) -> bool {
        match self.peek() {
            Some(b'\'') | Some(b'"') => self.skip_string(),
            Some(b'`') => self.skip_template(),
            Some(b'/') => match self.peek_at(1) {
                Some(b'/') => self.skip_line_comment(),
                Some(b'*') => self.skip_block_comment(),
                _ if regex_allowed(prev) => self.skip_regex(),
                _ if prev.is_some_and(is_ident_part) && self.after_regex_keyword() => {
                    self.skip_regex()
                }
                _ => return false,
            },
            _ => return false,
        }
        true
    }
}

/// Comments retained as declaration documentation
fn is_doc_comment(text: &str) -> bool {
    (text.starts_with("/**") && text != "/**/") || (text.starts_with("//") && !text.starts_with("///"))
}

/// Remove comments from a source fragment, collapsing each comment to a single space
pub fn strip_comments(text: &str) -> String {
    let mut cur = Cursor::new(text);
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    while let Some(b) = cur.peek() {
        let start = cur.pos();
        if b == b'/' && matches!(cur.peek_at(1), Some(b'/') | Some(b'*')) {
            cur.skip_opaque(prev);
            if !out.ends_with(char::is_whitespace) && !out.is_empty() {
                out.push(' ');
            }
            cur.skip_inline_whitespace();
            continue;
        }
        if matches!(b, b'\'' | b'"' | b'`') {
            cur.skip_opaque(prev);
        } else {
            cur.bump();
        }
        out.push_str(cur.slice(start, cur.pos()));
        if !is_whitespace(b) {
            prev = Some(b);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped(src: &str, f: impl Fn(&mut Cursor)) -> usize {
        let mut cur = Cursor::new(src);
        f(&mut cur);
        cur.pos()
    }

    #[test]
    fn test_skip_string_with_escapes() {
        assert_eq!(skipped(r#"'a\'b' rest"#, |c| c.skip_string()), 6);
        assert_eq!(skipped(r#""x{y}" rest"#, |c| c.skip_string()), 6);
    }

    #[test]
    fn test_unterminated_string_stops_at_line_break() {
        assert_eq!(skipped("'abc\nnext", |c| c.skip_string()), 4);
        assert_eq!(skipped("'abc", |c| c.skip_string()), 4);
    }

    #[test]
    fn test_template_with_nested_interpolation() {
        let src = "`a ${ `b ${ { c: '}' } }` } d` tail";
        let end = skipped(src, |c| c.skip_template());
        assert_eq!(&src[end..], " tail");
    }

    #[test]
    fn test_template_braces_inside_interpolation() {
        let src = "`${ fn({ a: 1 }) }` x";
        let end = skipped(src, |c| c.skip_template());
        assert_eq!(&src[end..], " x");
    }

    #[test]
    fn test_unterminated_template_runs_to_end() {
        let src = "`abc ${ x";
        assert_eq!(skipped(src, |c| c.skip_template()), src.len());
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(skipped("/* a } */x", |c| c.skip_block_comment()), 9);
        assert_eq!(skipped("/* open", |c| c.skip_block_comment()), 7);
    }

    #[test]
    fn test_regex_with_class() {
        let src = "/[/{]+/gi, next";
        let end = skipped(src, |c| c.skip_regex());
        assert_eq!(&src[end..], ", next");
    }

    #[test]
    fn test_regex_allowed() {
        assert!(regex_allowed(None));
        assert!(regex_allowed(Some(b'=')));
        assert!(regex_allowed(Some(b'(')));
        assert!(!regex_allowed(Some(b')')));
        assert!(!regex_allowed(Some(b'x')));
    }

    #[test]
    fn test_regex_after_operator_keyword() {
        for src in ["return /{/.test(s) }", "typeof /}/", "x = await\n  /[{]/g ;", "case /a/:"] {
            let slash = src.find('/').unwrap();
            let mut cur = Cursor::new(src);
            cur.advance(slash);
            assert!(cur.skip_opaque(Some(b'x')), "no regex in {src:?}");
            assert!(cur.pos() > slash + 2, "regex not consumed in {src:?}");
        }
    }

    #[test]
    fn test_division_after_identifier_and_property_keyword() {
        for src in ["total / 2", "a.return / 2 / b", "returned / x", "$return / 3"] {
            let slash = src.find(" /").unwrap() + 1;
            let mut cur = Cursor::new(src);
            cur.advance(slash);
            assert!(!cur.skip_opaque(Some(b'x')), "division read as regex in {src:?}");
            assert_eq!(cur.pos(), slash);
        }
    }

    #[test]
    fn test_collects_adjacent_doc_comments() {
        let mut cur = Cursor::new("/** Detached */\n\n/** Attached */\n// note\nexport");
        let mut sink = Vec::new();
        cur.skip_trivia_into(Some(&mut sink));
        assert_eq!(sink, vec!["/** Attached */", "// note"]);
        assert_eq!(cur.peek_word(), "export");
    }

    #[test]
    fn test_blank_line_detaches_comment() {
        let mut cur = Cursor::new("/** Lonely */\n\nexport");
        let mut sink = Vec::new();
        cur.skip_trivia_into(Some(&mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_plain_block_comments_are_not_documentation() {
        let mut cur = Cursor::new("/* license */\nexport");
        let mut sink = Vec::new();
        cur.skip_trivia_into(Some(&mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a: string // note"), "a: string ");
        assert_eq!(strip_comments("x /* y */ z"), "x z");
        assert_eq!(strip_comments("s: '// not a comment'"), "s: '// not a comment'");
    }
}

//! @dose
//! purpose: The statement-boundary heuristic. Source in this language does not require
//!     statement terminators, so when a scan reaches a line break at nesting depth zero it
//!     asks whether the next significant token starts something new. Two variants exist: one
//!     for top-level statements and one for class and interface members.
//!
//! when-editing:
//!     - !The keyword and operator lists below are the whole contract; do not generalise them
//!     - !Both probes rewind the cursor before returning
//!
//! invariants:
//!     - End of input and a closing brace are always boundaries
//!     - A member line starting with a type-continuation operator or keyword is never a boundary
//!
//! gotchas:
//!     - Line comments between the break and the next token are skipped by the probe

use super::chars::{is_digit, is_ident_start, is_whitespace};
use super::cursor::Cursor;

/// Keywords that start a new top-level statement
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "export",
    "import",
    "function",
    "class",
    "interface",
    "type",
    "enum",
    "const",
    "let",
    "var",
    "declare",
    "namespace",
    "module",
    "abstract",
    "async",
    "if",
    "for",
    "while",
    "do",
    "switch",
    "try",
    "return",
    "throw",
];

/// Keywords that continue a type expression onto the next line
pub const TYPE_CONTINUATION_KEYWORDS: &[&str] =
    &["extends", "keyof", "typeof", "infer", "is", "as", "in"];

/// Operators that continue a type expression onto the next line
pub const TYPE_CONTINUATION_OPERATORS: &[u8] = b"|&.?";

impl<'a> Cursor<'a> {
    /// Position of the next byte that is not whitespace or part of a line comment
    fn probe_next_significant(&mut self) -> usize {
        let saved = self.pos;
        loop {
            match self.peek() {
                Some(b) if is_whitespace(b) => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                _ => break,
            }
        }
        let next = self.pos;
        self.rewind(saved);
        next
    }

    /// Whether the line break at the cursor ends a top-level statement
    pub fn is_statement_boundary(&mut self) -> bool {
        let next = self.probe_next_significant();
        match self.byte_at(next) {
            None | Some(b'}') => true,
            Some(b) if is_ident_start(b) => STATEMENT_KEYWORDS.contains(&self.word_at(next)),
            _ => false,
        }
    }

    /// Whether the line break at the cursor ends a class or interface member
    pub fn is_member_boundary(&mut self) -> bool {
        let next = self.probe_next_significant();
        match self.byte_at(next) {
            None | Some(b'}') | Some(b';') => true,
            Some(b) if TYPE_CONTINUATION_OPERATORS.contains(&b) => false,
            Some(b) if is_ident_start(b) => {
                !TYPE_CONTINUATION_KEYWORDS.contains(&self.word_at(next))
            }
            Some(b'#' | b'[' | b'(' | b'<' | b'@' | b'*' | b'\'' | b'"') => true,
            Some(b) if is_digit(b) => true,
            _ => false,
        }
    }
}

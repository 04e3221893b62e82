//! @dose
//! purpose: The string-based declaration scanner. A Scanner owns the source buffer and one
//!     forward cursor; a dispatch loop reads modifiers, picks the extractor for the leading
//!     keyword and collects one record per declaration. Statements with no declaration
//!     surface are skipped through the generic fallback. The collected records are then
//!     handed to the resolver, which collapses overloads, renders text and decides which
//!     non-exported declarations the public surface needs.
//!
//! when-editing:
//!     - !Every loop iteration must advance the cursor; the dispatch loop bumps one char when
//!       an extractor made no progress
//!     - !Extractors receive the modifiers already consumed and start at the keyword
//!     - Comments are only collected when ScanOptions::keep_comments is set
//!
//! invariants:
//!     - The cursor never moves backward outside lookahead probes
//!     - A scan is a pure function of (source, options); no state survives between scans
//!       except the shared pattern cache, which only memoizes compiled patterns
//!
//! gotchas:
//!     - `declare`, `async`, `abstract` and `type` are only keywords when followed by the
//!       right token; otherwise they are identifiers and the statement is skipped
//!     - `import(` and `import.meta` are expressions, not import declarations
//!
//! flows:
//!     - scan: new Scanner -> scan_statements -> resolve::finalize -> Vec<Declaration>

mod classes;
pub(crate) mod functions;
mod imports;
mod modules;
mod types;
mod variables;

pub mod asi;
pub mod chars;
pub mod cursor;
pub mod lexical;
pub mod matcher;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolve::{self, PatternCache, Scope, DEFAULT_PATTERN_CAPACITY};
use crate::types::{Declaration, DeclarationDetail};
use chars::{is_ident_part, is_ident_start};
use cursor::Cursor;
use matcher::Context;

/// Flags that change what a scan produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Retain documentation comments preceding declarations and members
    pub keep_comments: bool,
    /// Restrict type inference to assertions and literals
    pub isolated: bool,
}

/// Keywords that may follow `declare`
const DECLARABLE: &[&str] = &[
    "const",
    "let",
    "var",
    "function",
    "class",
    "interface",
    "type",
    "enum",
    "namespace",
    "module",
    "global",
    "abstract",
    "async",
];

/// Statement modifiers read before the declaration keyword
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Modifiers {
    pub start: usize,
    pub exported: bool,
    pub default: bool,
    pub declare: bool,
    pub is_async: bool,
    pub is_abstract: bool,
}

pub struct Scanner<'a, 'p> {
    pub(crate) cur: Cursor<'a>,
    pub(crate) options: ScanOptions,
    comments: Vec<String>,
    patterns: &'p Mutex<PatternCache>,
    module_depth: usize,
}

impl<'a, 'p> Scanner<'a, 'p> {
    pub fn new(source: &'a str, options: ScanOptions, patterns: &'p Mutex<PatternCache>) -> Self {
        Self {
            cur: Cursor::new(source),
            options,
            comments: Vec::new(),
            patterns,
            module_depth: 0,
        }
    }

    /// Scan the whole source and resolve the public declaration list
    pub fn run(mut self) -> Vec<Declaration> {
        let items = self.scan_statements(false);
        resolve::finalize(items, self.patterns, Scope::TopLevel)
    }

    /// Dispatch statements until end of input, or until the closing brace of a body when
    /// `in_body` is set (the brace is left for the caller)
    fn scan_statements(&mut self, in_body: bool) -> Vec<Declaration> {
        let mut out = Vec::new();
        loop {
            self.comments.clear();
            let sink = if self.options.keep_comments {
                Some(&mut self.comments)
            } else {
                None
            };
            self.cur.skip_trivia_into(sink);
            let Some(b) = self.cur.peek() else { break };
            if b == b'}' {
                if in_body {
                    break;
                }
                self.cur.advance(1);
                continue;
            }
            if b == b';' {
                self.cur.advance(1);
                continue;
            }
            let start = self.cur.pos();
            self.scan_statement(&mut out);
            if self.cur.pos() == start {
                self.cur.bump();
            }
        }
        out
    }

    fn scan_statement(&mut self, out: &mut Vec<Declaration>) {
        let comments = std::mem::take(&mut self.comments);
        let mods = self.read_modifiers();
        let word = self.cur.peek_word();
        let (next_byte, next_word) = self.lookahead();

        if mods.exported && !mods.default {
            match self.cur.peek() {
                Some(b'{') | Some(b'*') => return self.scan_export_clause(mods, comments, false, out),
                Some(b'=') => return self.scan_export_assignment(mods, comments, out),
                _ => {}
            }
            match word {
                "as" if next_word == "namespace" => {
                    return self.scan_export_as_namespace(mods, comments, out)
                }
                "type" if matches!(next_byte, Some(b'{') | Some(b'*')) => {
                    self.cur.advance(word.len());
                    self.cur.skip_trivia();
                    return self.scan_export_clause(mods, comments, true, out);
                }
                _ => {}
            }
        }

        match word {
            "import" if !matches!(next_byte, Some(b'(') | Some(b'.')) => {
                self.scan_import(mods, comments, out)
            }
            "function" => self.scan_function(mods, comments, out),
            "class" => self.scan_class(mods, comments, out),
            "interface" if next_byte.is_some_and(is_ident_start) => {
                self.scan_interface(mods, comments, out)
            }
            "type" if next_byte.is_some_and(is_ident_start) => {
                self.scan_type_alias(mods, comments, out)
            }
            "enum" => self.scan_enum(mods, comments, false, out),
            "const" if next_word == "enum" => {
                self.cur.advance(word.len());
                self.cur.skip_trivia();
                self.scan_enum(mods, comments, true, out)
            }
            "const" | "let" | "var"
                if next_byte.is_some_and(|b| is_ident_start(b) || b == b'{' || b == b'[') =>
            {
                self.scan_variables(mods, comments, out)
            }
            "namespace" | "module"
                if next_byte.is_some_and(|b| is_ident_start(b) || b == b'\'' || b == b'"') =>
            {
                self.scan_module(mods, comments, out)
            }
            "global" if mods.declare && next_byte == Some(b'{') => {
                self.scan_global(mods, comments, out)
            }
            _ if mods.default => self.scan_export_default_expression(mods, comments, out),
            _ => self.cur.skip_statement(Context::TopLevel),
        }
    }

    fn read_modifiers(&mut self) -> Modifiers {
        let mut mods = Modifiers {
            start: self.cur.pos(),
            ..Default::default()
        };
        loop {
            if self.cur.peek() == Some(b'@') {
                self.cur.skip_decorator();
                self.cur.skip_trivia();
                continue;
            }
            let word = self.cur.peek_word();
            let (_, next) = self.lookahead();
            let taken = match word {
                "export" if !mods.exported => {
                    mods.exported = true;
                    true
                }
                "default" if mods.exported && !mods.default => {
                    mods.default = true;
                    true
                }
                "declare" if DECLARABLE.contains(&next) => {
                    mods.declare = true;
                    true
                }
                "async" if next == "function" => {
                    mods.is_async = true;
                    true
                }
                "abstract" if next == "class" => {
                    mods.is_abstract = true;
                    true
                }
                _ => false,
            };
            if !taken {
                return mods;
            }
            self.cur.advance(word.len());
            self.cur.skip_trivia();
        }
    }

    /// The byte and word that follow the word at the cursor, without consuming anything
    fn lookahead(&mut self) -> (Option<u8>, &'a str) {
        let saved = self.cur.pos();
        let word = self.cur.read_word();
        if word.is_empty() {
            return (None, "");
        }
        self.cur.skip_trivia();
        let next = (self.cur.peek(), self.cur.peek_word());
        self.cur.rewind(saved);
        next
    }

    /// Build a record spanning from the modifiers to the cursor
    pub(crate) fn declaration(
        &self,
        name: impl Into<String>,
        detail: DeclarationDetail,
        mods: &Modifiers,
        comments: Vec<String>,
    ) -> Declaration {
        let end = self.cur.pos().max(mods.start + 1);
        let mut decl = Declaration::new(name, detail, mods.start, end);
        decl.is_exported = mods.exported;
        decl.is_default = mods.default;
        decl.is_async = mods.is_async;
        if self.options.keep_comments {
            decl.leading_comments = comments;
        }
        decl
    }

    /// Generics span `<...>` at the cursor, if any
    pub(crate) fn read_generics(&mut self) -> Option<String> {
        self.cur.skip_trivia();
        if self.cur.peek() != Some(b'<') {
            return None;
        }
        let span = self.cur.read_balanced();
        Some(lexical::strip_comments(span).trim().to_string())
    }

    /// Heritage text up to the `{` that opens a class or interface body
    pub(crate) fn read_heritage(&mut self) -> &'a str {
        let start = self.cur.pos();
        let mut prev = None;
        while let Some(b) = self.cur.peek() {
            if b == b'{' || b == b';' {
                break;
            }
            if self.cur.skip_opaque(prev) {
                continue;
            }
            match b {
                b'(' | b'[' | b'<' => {
                    self.cur.find_matching();
                    prev = Some(b')');
                    continue;
                }
                b'\n' if self.cur.is_statement_boundary() => break,
                _ => {}
            }
            if !chars::is_whitespace(b) {
                prev = Some(b);
            }
            self.cur.bump();
        }
        self.cur.slice(start, self.cur.pos())
    }
}

impl<'a> Cursor<'a> {
    /// Skip a decorator: `@name`, `@a.b` or `@name(...)`
    pub fn skip_decorator(&mut self) {
        self.advance(1);
        while let Some(b) = self.peek() {
            if !(is_ident_part(b) || b == b'.') {
                break;
            }
            self.advance(1);
        }
        if self.peek() == Some(b'<') {
            self.find_matching();
        }
        if self.peek() == Some(b'(') {
            self.find_matching();
        }
    }
}

/// Scan `source` with a private pattern cache
pub fn scan(source: &str, file: &str, options: ScanOptions) -> Vec<Declaration> {
    let patterns = Mutex::new(PatternCache::new(DEFAULT_PATTERN_CAPACITY));
    scan_with(source, file, options, &patterns)
}

/// Scan `source`, sharing compiled name patterns through `patterns`
pub fn scan_with(
    source: &str,
    file: &str,
    options: ScanOptions,
    patterns: &Mutex<PatternCache>,
) -> Vec<Declaration> {
    let declarations = Scanner::new(source, options, patterns).run();
    debug!(
        file,
        bytes = source.len(),
        declarations = declarations.len(),
        "scanned"
    );
    declarations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclarationKind;

    fn texts(source: &str) -> Vec<String> {
        scan(source, "test.ts", ScanOptions::default())
            .into_iter()
            .map(|d| d.text)
            .collect()
    }

    #[test]
    fn test_referenced_interface_is_promoted() {
        let source = "export function f(x: Widget): void {}\ninterface Widget { id: number }\n";
        let decls = scan(source, "widget.ts", ScanOptions::default());
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].text, "export declare function f(x: Widget): void;");
        assert_eq!(decls[1].name, "Widget");
        assert_eq!(decls[1].text, "declare interface Widget {\n  id: number\n}");
    }

    #[test]
    fn test_unreferenced_interface_is_dropped() {
        let source = "export const a = 1\ninterface Hidden { id: number }\n";
        assert_eq!(texts(source), vec!["export declare const a: 1;"]);
    }

    #[test]
    fn test_const_assertion_on_string() {
        assert_eq!(
            texts("export const x = 'hi' as const"),
            vec!["export declare const x: 'hi';"]
        );
    }

    #[test]
    fn test_overload_implementation_is_removed() {
        let source = "export function g(a: number): void;\nexport function g(a: number, b?: string): void { }\n";
        assert_eq!(texts(source), vec!["export declare function g(a: number): void;"]);
    }

    #[test]
    fn test_single_function_with_body_is_kept() {
        let decls = scan("export function h() { return 1 }", "h.ts", ScanOptions::default());
        assert_eq!(decls.len(), 1);
        assert!(decls[0].has_body());
        assert_eq!(decls[0].text, "export declare function h(): void;");
    }

    #[test]
    fn test_non_exported_variables_are_not_materialized() {
        assert!(texts("const a = 1\nlet b = 'x'\nfoo(a, b)\n").is_empty());
    }

    #[test]
    fn test_statements_without_terminators() {
        let source = "export const a = 1\nexport let b = 'x'\nexport type T = A\n  | B\nexport function f() {}\n";
        assert_eq!(
            texts(source),
            vec![
                "export declare const a: 1;",
                "export declare let b: string;",
                "export type T = A\n  | B;",
                "export declare function f(): void;",
            ]
        );
    }

    #[test]
    fn test_expression_statements_are_skipped() {
        let source = "console.log(`${a} }`)\nif (x) { y() } else { z() }\nexport const n: number = 2\n";
        assert_eq!(texts(source), vec!["export declare const n: number;"]);
    }

    #[test]
    fn test_spans_are_ordered_and_non_empty() {
        let source = "import { a } from './a'\nexport interface I { x: a }\nexport enum E { A }\nexport const { b, c: [d] } = a\n";
        let decls = scan(source, "s.ts", ScanOptions::default());
        assert_eq!(decls.len(), 5);
        for pair in decls.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for decl in &decls {
            assert!(decl.start < decl.end);
        }
        assert_eq!(decls[0].kind(), DeclarationKind::Import);
    }

    #[test]
    fn test_regex_after_keyword_keeps_later_declarations() {
        let source = "export function f(s: string): boolean { return /{/.test(s) }\n\
                      export function g(v: unknown) { if (typeof /}/ === 'object') throw /[{]/ }\n\
                      export const after = 1\n";
        assert_eq!(
            texts(source),
            vec![
                "export declare function f(s: string): boolean;",
                "export declare function g(v: unknown): void;",
                "export declare const after: 1;",
            ]
        );
    }

    #[test]
    fn test_keep_comments_attaches_docs() {
        let source = "/** Adds. */\nexport function add(a: number, b: number): number { return a + b }\n";
        let plain = scan(source, "c.ts", ScanOptions::default());
        assert!(plain[0].leading_comments.is_empty());

        let options = ScanOptions {
            keep_comments: true,
            ..Default::default()
        };
        let kept = scan(source, "c.ts", options);
        assert_eq!(kept[0].leading_comments, vec!["/** Adds. */"]);
        assert_eq!(
            kept[0].text,
            "/** Adds. */\nexport declare function add(a: number, b: number): number;"
        );
    }

    #[test]
    fn test_decorators_are_skipped() {
        let source = "@Component({ selector: 'x' })\nexport class Widget {\n  @Input() name: string\n}\n";
        assert_eq!(
            texts(source),
            vec!["export declare class Widget {\n  name: string;\n}"]
        );
    }

    #[test]
    fn test_identifiers_named_like_keywords() {
        let source = "declare = 1\ntype = 2\nasync()\nexport const ok = true\n";
        assert_eq!(texts(source), vec!["export declare const ok: true;"]);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let source = include_str!("../../test_fixtures/sample.ts");
        let first = scan(source, "sample.ts", ScanOptions::default());
        let second = scan(source, "sample.ts", ScanOptions::default());
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_terminates_on_malformed_input() {
        let inputs = [
            "export function f(a: string",
            "export class C { m() { '",
            "export const x = `${ {{{ `",
            "/* never closed",
            "export interface I { a: Array<",
            "}}}}))))]]]>>>",
            "export default",
            "export enum E { A = (",
            "\u{0}\u{1}\u{ff}é中🌍 export const",
            "namespace A { namespace B { namespace C {",
            "export type T = ",
        ];
        for input in inputs {
            let decls = scan(input, "bad.ts", ScanOptions::default());
            for decl in &decls {
                assert!(decl.start < decl.end, "bad span for {input:?}");
                assert!(decl.end <= input.len());
            }
        }
    }

    #[test]
    fn test_terminates_on_deep_nesting() {
        let n = 20_000;
        let inputs = [
            format!("export const {}a{} = y\nexport const after = 1", "[".repeat(n), "]".repeat(n)),
            format!("export const {}a{} = y\nexport const after = 1", "{ a: ".repeat(n), " }".repeat(n)),
            format!("export function f({}a{}) {{}}\nexport const after = 1", "[".repeat(n), "]".repeat(n)),
            format!("export const x = {}1{}\nexport const after = 1", "(".repeat(n), ")".repeat(n)),
        ];
        for input in &inputs {
            let decls = scan(input, "deep.ts", ScanOptions::default());
            let last = decls.last().expect("declarations");
            assert_eq!(last.text, "export declare const after: 1;");
        }
    }

    #[test]
    fn test_terminates_on_byte_noise() {
        let noise: String = (0u32..4096)
            .map(|i| {
                let b = (i.wrapping_mul(2654435761) >> 13) as u8;
                char::from(b % 128)
            })
            .collect();
        scan(&noise, "noise.ts", ScanOptions::default());
    }
}

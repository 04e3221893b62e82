//! @dose
//! purpose: Interface, type alias and enum extractors. Interface members are split with the
//!     member boundary heuristic and kept as text; type alias definitions are kept verbatim up
//!     to the statement boundary.
//!
//! when-editing:
//!     - Comments are stripped from members unless the scan retains them
//!     - Continuation lines of a member are dedented by the member's own column

use super::cursor::Cursor;
use super::lexical::strip_comments;
use super::matcher::{split_top_level, Context};
use super::{Modifiers, Scanner};
use crate::emit::{dedent_continuation, DEFAULT_NAME};
use crate::types::{Declaration, DeclarationDetail, EnumMember};

/// Split an interface or object-type body into member texts
pub(crate) fn split_members(body: &str, keep_comments: bool) -> Vec<String> {
    let mut cur = Cursor::new(body);
    let mut members = Vec::new();
    let mut comments = Vec::new();
    loop {
        comments.clear();
        cur.skip_trivia_into(keep_comments.then_some(&mut comments));
        match cur.peek() {
            None => break,
            Some(b';') | Some(b',') => {
                cur.advance(1);
                continue;
            }
            _ => {}
        }
        let start = cur.pos();
        cur.scan_type(b",", Context::Member);
        let raw = cur.slice(start, cur.pos());
        if !cur.eat(b';') && !cur.eat(b',') && cur.pos() == start {
            cur.bump();
        }
        let column = start - body[..start].rfind('\n').map_or(0, |nl| nl + 1);
        let text = if keep_comments {
            raw.trim().to_string()
        } else {
            strip_comments(raw).trim().to_string()
        };
        if text.is_empty() {
            continue;
        }
        let mut member = dedent_continuation(&text, column);
        if !comments.is_empty() {
            member = format!("{}\n{member}", comments.join("\n"));
        }
        members.push(member);
    }
    members
}

impl<'a, 'p> Scanner<'a, 'p> {
    pub(crate) fn scan_interface(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("interface".len());
        self.cur.skip_trivia();
        let mut name = self.cur.read_word();
        if name.is_empty() {
            name = DEFAULT_NAME;
        }
        let generics = self.read_generics();
        self.cur.skip_trivia();
        let extends = if self.cur.eat_word("extends") {
            let heritage = strip_comments(self.read_heritage());
            Some(heritage.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|h| !h.is_empty())
        } else {
            None
        };
        self.cur.skip_trivia();
        let members = if self.cur.peek() == Some(b'{') {
            let body = self.cur.read_balanced();
            let inner = body.get(1..body.len().saturating_sub(1)).unwrap_or_default();
            split_members(inner, self.options.keep_comments)
        } else {
            Vec::new()
        };
        let mut decl = self.declaration(
            name,
            DeclarationDetail::Interface {
                generics,
                extends,
                members,
            },
            &mods,
            comments,
        );
        decl.is_type_only = true;
        out.push(decl);
    }

    pub(crate) fn scan_type_alias(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("type".len());
        self.cur.skip_trivia();
        let name = self.cur.read_word();
        let generics = self.read_generics();
        self.cur.skip_trivia();
        if !self.cur.eat(b'=') {
            self.cur.skip_statement(Context::TopLevel);
            return;
        }
        self.cur.skip_trivia();
        let raw = self.cur.scan_type(&[], Context::TopLevel);
        self.cur.eat(b';');
        let definition = if self.options.keep_comments {
            raw.to_string()
        } else {
            strip_comments(raw).trim().to_string()
        };
        let definition = if definition.is_empty() {
            "unknown".to_string()
        } else {
            definition
        };
        let mut decl = self.declaration(
            name,
            DeclarationDetail::Type {
                generics,
                definition,
            },
            &mods,
            comments,
        );
        decl.is_type_only = true;
        out.push(decl);
    }

    /// `enum` or `const enum`; the cursor is on `enum`
    pub(crate) fn scan_enum(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        is_const: bool,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("enum".len());
        self.cur.skip_trivia();
        let name = self.cur.read_word();
        if name.is_empty() {
            self.cur.skip_statement(Context::TopLevel);
            return;
        }
        self.cur.skip_trivia();
        let members = if self.cur.peek() == Some(b'{') {
            let body = self.cur.read_balanced();
            let inner = body.get(1..body.len().saturating_sub(1)).unwrap_or_default();
            let inner = strip_comments(inner);
            split_top_level(&inner, b',')
                .into_iter()
                .map(|member| match member.split_once('=') {
                    Some((name, init)) => EnumMember {
                        name: name.trim().to_string(),
                        initializer: Some(init.trim().to_string()),
                    },
                    None => EnumMember {
                        name: member.to_string(),
                        initializer: None,
                    },
                })
                .collect()
        } else {
            Vec::new()
        };
        out.push(self.declaration(
            name,
            DeclarationDetail::Enum { is_const, members },
            &mods,
            comments,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{scan, ScanOptions};

    fn texts(source: &str) -> Vec<String> {
        scan(source, "t.ts", ScanOptions::default())
            .into_iter()
            .map(|d| d.text)
            .collect()
    }

    #[test]
    fn test_split_members_without_separators() {
        let body = "\n  id: number\n  kind: 'a'\n    | 'b'\n  run(x: string): void;\n  readonly tags?: string[],\n";
        assert_eq!(
            split_members(body, false),
            vec!["id: number", "kind: 'a'\n  | 'b'", "run(x: string): void", "readonly tags?: string[]"]
        );
    }

    #[test]
    fn test_split_members_nested_object_keeps_layout() {
        let body = "\n  a: {\n    b: number\n  }\n  c: string\n";
        assert_eq!(split_members(body, false), vec!["a: {\n  b: number\n}", "c: string"]);
    }

    #[test]
    fn test_split_members_comments() {
        let body = "\n  /** The id. */\n  id: number // trailing\n";
        assert_eq!(split_members(body, false), vec!["id: number"]);
        assert_eq!(
            split_members(body, true),
            vec!["/** The id. */\nid: number // trailing"]
        );
    }

    #[test]
    fn test_interface_with_heritage_and_generics() {
        assert_eq!(
            texts("export interface Box<T = string> extends Base<T>, Other {\n  value: T\n  get(): T\n}"),
            vec!["export declare interface Box<T = string> extends Base<T>, Other {\n  value: T\n  get(): T\n}"]
        );
    }

    #[test]
    fn test_interface_index_and_call_signatures() {
        assert_eq!(
            texts("export interface Dict {\n  [key: string]: number\n  (arg: string): void\n  new (x: number): Dict\n}"),
            vec!["export declare interface Dict {\n  [key: string]: number\n  (arg: string): void\n  new (x: number): Dict\n}"]
        );
    }

    #[test]
    fn test_type_alias_forms() {
        assert_eq!(
            texts("export type Id = string | number;"),
            vec!["export type Id = string | number;"]
        );
        assert_eq!(
            texts("export type Fn<T> = (value: T) => void\nexport type Obj = { a: 1 }\n"),
            vec!["export type Fn<T> = (value: T) => void;", "export type Obj = { a: 1 };"]
        );
        assert_eq!(
            texts("export type Cond<T> = T extends string\n  ? 'str'\n  : never\n"),
            vec!["export type Cond<T> = T extends string\n  ? 'str'\n  : never;"]
        );
    }

    #[test]
    fn test_enums() {
        assert_eq!(
            texts("export enum Dir { Up = 1, Down, /* x */ Left = 'L', }"),
            vec!["export declare enum Dir {\n  Up = 1,\n  Down,\n  Left = 'L'\n}"]
        );
        assert_eq!(
            texts("export const enum Flag { A = 1 << 0, B = 1 << 1 }"),
            vec!["export declare const enum Flag {\n  A = 1 << 0,\n  B = 1 << 1\n}"]
        );
    }
}

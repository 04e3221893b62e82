//! @dose
//! purpose: The class extractor and class body builder. Members are classified by a fixed
//!     grammar (access, static, abstract, readonly, then the member shape) and recorded
//!     without bodies. Private members never reach the output; constructor parameter
//!     properties become standalone property members ahead of the constructor.
//!
//! when-editing:
//!     - !A member that is `private` or has a `#name` is consumed but never recorded, and
//!       neither is a private parameter property (public ones survive a private constructor)
//!     - !`get`/`set` are accessor keywords only when a member name follows them
//!     - Method overloads collapse like top-level functions: bodies drop when a bodyless
//!       sibling with the same name exists
//!
//! invariants:
//!     - The body loop consumes the closing brace and always makes progress
//!
//! gotchas:
//!     - Static blocks `static { ... }` are skipped entirely
//!     - Modifier words can be member names (`static: number`, `async()`); a word is a
//!       modifier only when another member token follows it

use super::chars::{is_digit, is_ident_part, is_ident_start};
use super::lexical::strip_comments;
use super::matcher::{find_top_level, rfind_top_level_word, split_top_level, Context};
use super::{Modifiers, Scanner};
use crate::emit::{dedent_continuation, infer_type, InferMode, DEFAULT_NAME};
use crate::resolve::collapse_overloads;
use crate::types::{Access, ClassMember, Declaration, DeclarationDetail, MemberKind};

const MEMBER_MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "abstract",
    "readonly",
    "override",
    "declare",
    "accessor",
    "async",
];

/// Whether `b` can start a member name
fn starts_member_name(b: u8) -> bool {
    is_ident_start(b) || is_digit(b) || matches!(b, b'[' | b'#' | b'*' | b'\'' | b'"')
}

/// Split class heritage text into its `extends` and `implements` parts
fn split_heritage(heritage: &str) -> (Option<String>, Vec<String>) {
    let heritage = strip_comments(heritage);
    let heritage = heritage.split_whitespace().collect::<Vec<_>>().join(" ");
    let (extends_part, implements_part) = match rfind_top_level_word(&heritage, "implements") {
        Some(pos) => (&heritage[..pos], &heritage[pos + "implements".len()..]),
        None => (heritage.as_str(), ""),
    };
    let extends = extends_part
        .trim()
        .strip_prefix("extends")
        .map(|base| base.trim().to_string())
        .filter(|base| !base.is_empty());
    let implements = split_top_level(implements_part, b',')
        .into_iter()
        .map(str::to_string)
        .collect();
    (extends, implements)
}

impl<'a, 'p> Scanner<'a, 'p> {
    pub(crate) fn scan_class(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("class".len());
        self.cur.skip_trivia();
        let word = self.cur.peek_word();
        let name = if !word.is_empty() && word != "extends" && word != "implements" {
            self.cur.read_word()
        } else if mods.default {
            DEFAULT_NAME
        } else {
            self.cur.skip_statement(Context::TopLevel);
            return;
        };
        let generics = self.read_generics();
        self.cur.skip_trivia();
        let (extends, implements) = split_heritage(self.read_heritage());
        let members = if self.cur.peek() == Some(b'{') {
            self.scan_class_body()
        } else {
            Vec::new()
        };
        out.push(self.declaration(
            name,
            DeclarationDetail::Class {
                generics,
                extends,
                implements,
                is_abstract: mods.is_abstract,
                members,
            },
            &mods,
            comments,
        ));
    }

    /// Scan a class body; the cursor is on the opening brace
    fn scan_class_body(&mut self) -> Vec<ClassMember> {
        self.cur.advance(1);
        let mut members = Vec::new();
        let mut comments = Vec::new();
        loop {
            let sink = if self.options.keep_comments {
                Some(&mut comments)
            } else {
                None
            };
            self.cur.skip_trivia_into(sink);
            match self.cur.peek() {
                None => break,
                Some(b'}') => {
                    self.cur.advance(1);
                    break;
                }
                Some(b';') | Some(b',') => {
                    self.cur.advance(1);
                    comments.clear();
                    continue;
                }
                Some(b'@') => {
                    // Comments above a decorator belong to the decorated member
                    self.cur.skip_decorator();
                    continue;
                }
                _ => {}
            }
            let start = self.cur.pos();
            self.scan_class_member(std::mem::take(&mut comments), &mut members);
            if self.cur.pos() == start {
                self.cur.bump();
            }
        }

        collapse_overloads(
            &mut members,
            |m: &ClassMember| match m.kind {
                MemberKind::Method | MemberKind::Constructor => {
                    Some(format!("{}:{}", m.is_static, m.name))
                }
                _ => None,
            },
            |m: &ClassMember| m.has_body,
        );
        pair_accessors(&mut members);
        members
    }

    fn scan_class_member(&mut self, comments: Vec<String>, members: &mut Vec<ClassMember>) {
        let mut member = ClassMember::new(MemberKind::Property, "");
        member.leading_comments = comments;
        let column = self.cur.column_of(self.cur.pos());

        loop {
            let word = self.cur.peek_word();
            if !MEMBER_MODIFIERS.contains(&word) {
                break;
            }
            let saved = self.cur.pos();
            self.cur.advance(word.len());
            self.cur.skip_trivia();
            match self.cur.peek() {
                Some(b'{') if word == "static" => {
                    self.cur.find_matching();
                    return;
                }
                Some(b) if starts_member_name(b) => match word {
                    "public" | "protected" | "private" => member.access = Access::from_word(word),
                    "static" => member.is_static = true,
                    "abstract" => member.is_abstract = true,
                    "readonly" => member.is_readonly = true,
                    "async" => member.is_async = true,
                    _ => {}
                },
                _ => {
                    self.cur.rewind(saved);
                    break;
                }
            }
        }

        if self.cur.eat(b'*') {
            member.is_generator = true;
            self.cur.skip_trivia();
        }

        let word = self.cur.peek_word();
        if word == "get" || word == "set" {
            let saved = self.cur.pos();
            self.cur.advance(word.len());
            self.cur.skip_trivia();
            if self.cur.peek().is_some_and(starts_member_name) {
                member.kind = if word == "get" {
                    MemberKind::Getter
                } else {
                    MemberKind::Setter
                };
            } else {
                self.cur.rewind(saved);
            }
        }

        let Some(name) = self.read_member_name() else {
            self.cur.scan_expression(&[], Context::Member);
            self.cur.eat(b';');
            return;
        };
        member.name = name;
        self.cur.skip_inline_whitespace();
        if self.cur.eat(b'?') {
            member.is_optional = true;
        }
        self.cur.eat(b'!');
        self.cur.skip_inline_whitespace();

        if matches!(self.cur.peek(), Some(b'(') | Some(b'<')) {
            if member.kind == MemberKind::Property {
                member.kind = if member.name == "constructor" {
                    MemberKind::Constructor
                } else {
                    MemberKind::Method
                };
            }
            let signature = self.read_signature(Context::Member);
            member.generics = signature.generics;
            member.parameters = signature.parameters;
            member.type_annotation = signature
                .return_type
                .map(|ty| dedent_continuation(&ty, column));
            member.has_body = signature.has_body;
        } else {
            if member.name.starts_with('[') && find_top_level(&member.name[1..], b':').is_some() {
                member.kind = MemberKind::Index;
            }
            let annotation = if self.cur.eat(b':') {
                self.cur.skip_trivia();
                let ty = strip_comments(self.cur.scan_type(&[b'='], Context::Member));
                Some(dedent_continuation(ty.trim(), column)).filter(|ty| !ty.is_empty())
            } else {
                None
            };
            self.cur.skip_inline_whitespace();
            let initializer = if self.cur.peek() == Some(b'=') {
                self.cur.advance(1);
                self.cur.skip_trivia();
                Some(self.cur.scan_expression(&[], Context::Member))
            } else {
                None
            };
            self.cur.eat(b';');
            let mode = InferMode {
                narrow: member.is_readonly,
                isolated: self.options.isolated,
            };
            member.type_annotation = Some(match (annotation, initializer) {
                (Some(annotation), _) => annotation,
                (None, Some(init)) => infer_type(init, mode),
                (None, None) => "any".to_string(),
            });
        }

        // Parameter properties stay public even behind a private constructor
        if member.kind == MemberKind::Constructor {
            members.extend(parameter_properties(&member));
        }
        if member.access == Some(Access::Private) || member.name.starts_with('#') {
            return;
        }
        members.push(member);
    }

    /// Read a member name: identifier, `#private`, `[computed]`, string or numeric literal
    fn read_member_name(&mut self) -> Option<String> {
        let start = self.cur.pos();
        match self.cur.peek()? {
            b'#' => {
                self.cur.advance(1);
                self.cur.read_word();
            }
            b'[' => {
                let computed = self.cur.read_balanced();
                return Some(strip_comments(computed).trim().to_string());
            }
            b'\'' | b'"' => self.cur.skip_string(),
            b if is_digit(b) => {
                while self.cur.peek().is_some_and(|b| is_ident_part(b) || b == b'.') {
                    self.cur.advance(1);
                }
            }
            b if is_ident_start(b) => {
                self.cur.read_word();
            }
            _ => return None,
        }
        let name = self.cur.slice(start, self.cur.pos());
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Property members declared by a constructor's parameter properties
fn parameter_properties(constructor: &ClassMember) -> Vec<ClassMember> {
    constructor
        .parameters
        .iter()
        .filter(|param| param.is_property() && !param.is_private())
        .map(|param| {
            let mut property = ClassMember::new(MemberKind::Property, param.name.clone());
            property.access = param
                .modifiers
                .iter()
                .find_map(|m| Access::from_word(m))
                .filter(|access| *access != Access::Public);
            property.is_readonly = param.is_readonly();
            property.is_optional = param.optional;
            property.type_annotation = Some(param.type_annotation.clone());
            property
        })
        .collect()
}

/// Give untyped getters the type of their setter and vice versa
fn pair_accessors(members: &mut [ClassMember]) {
    let setter_types: Vec<(String, String)> = members
        .iter()
        .filter(|m| m.kind == MemberKind::Setter)
        .filter_map(|m| {
            let param = m.parameters.first()?;
            (param.type_annotation != "any")
                .then(|| (m.name.clone(), param.type_annotation.clone()))
        })
        .collect();
    let getter_types: Vec<(String, String)> = members
        .iter()
        .filter(|m| m.kind == MemberKind::Getter)
        .filter_map(|m| Some((m.name.clone(), m.type_annotation.clone()?)))
        .collect();
    for member in members.iter_mut() {
        match member.kind {
            MemberKind::Getter if member.type_annotation.is_none() => {
                member.type_annotation = setter_types
                    .iter()
                    .find(|(name, _)| *name == member.name)
                    .map(|(_, ty)| ty.clone());
            }
            MemberKind::Setter => {
                let Some((_, ty)) = getter_types.iter().find(|(name, _)| *name == member.name)
                else {
                    continue;
                };
                if let Some(param) = member.parameters.first_mut() {
                    if param.type_annotation == "any" && param.default_text.is_none() {
                        param.type_annotation = ty.clone();
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{scan, ScanOptions};

    fn class_text(source: &str) -> String {
        let decls = scan(source, "c.ts", ScanOptions::default());
        assert_eq!(decls.len(), 1, "expected one declaration from {source:?}");
        decls[0].text.clone()
    }

    #[test]
    fn test_class_members_and_modifier_order() {
        let source = "export class Counter extends Base<number> implements A, B {
  static readonly zero = 0
  protected count: number = 0
  public label = 'c'
  readonly tag = 'x'
  increment(by = 1): number { return this.count += by }
  static async create(): Promise<Counter> { return new Counter() }
  abstract_: boolean
}";
        assert_eq!(
            class_text(source),
            "export declare class Counter extends Base<number> implements A, B {
  static readonly zero: 0;
  protected count: number;
  label: string;
  readonly tag: 'x';
  increment(by?: number): number;
  static create(): Promise<Counter>;
  abstract_: boolean;
}"
        );
    }

    #[test]
    fn test_private_members_are_excluded() {
        let source = "export class Vault {
  #secret = 1
  private key: string
  private static cache = new Map()
  #hidden() {}
  private get raw(): string { return '' }
  private constructor(private readonly db: Db, public name: string, protected id?: number) {}
  open(): void {}
}";
        assert_eq!(
            class_text(source),
            "export declare class Vault {
  name: string;
  protected id?: number;
  open(): void;
}"
        );
    }

    #[test]
    fn test_parameter_properties_precede_constructor() {
        let source = "export class User {
  constructor(private db: Db, public readonly name: string, protected id = 0, count: number) {}
}";
        assert_eq!(
            class_text(source),
            "export declare class User {
  readonly name: string;
  protected id?: number;
  constructor(db: Db, name: string, id?: number, count: number);
}"
        );
    }

    #[test]
    fn test_accessors_and_methods_named_get_set() {
        let source = "export class Store {
  get size(): number { return 0 }
  set size(v) {}
  get(key: string): unknown { return null }
  set(key: string, value: unknown): void {}
  static get instance() { return inst }
}";
        assert_eq!(
            class_text(source),
            "export declare class Store {
  get size(): number;
  set size(v: number);
  get(key: string): unknown;
  set(key: string, value: unknown): void;
  static get instance(): unknown;
}"
        );
    }

    #[test]
    fn test_method_overloads_collapse() {
        let source = "export class Parser {
  parse(s: string): Ast
  parse(b: Buffer): Ast
  parse(input: any): Ast { return build(input) }
  static parse(s: string): Ast { return new Parser().parse(s) }
}";
        assert_eq!(
            class_text(source),
            "export declare class Parser {
  parse(s: string): Ast;
  parse(b: Buffer): Ast;
  static parse(s: string): Ast;
}"
        );
    }

    #[test]
    fn test_abstract_class_index_and_static_block() {
        let source = "export abstract class Shape {
  [key: string]: unknown
  static { register(Shape) }
  abstract area(): number
  protected abstract readonly sides: number
  'quoted-name' = true
  42: string
}";
        assert_eq!(
            class_text(source),
            "export declare abstract class Shape {
  [key: string]: unknown;
  abstract area(): number;
  protected abstract readonly sides: number;
  'quoted-name': boolean;
  42: string;
}"
        );
    }

    #[test]
    fn test_modifier_words_as_member_names() {
        let source = "export class Odd {
  static: number
  async(): void {}
  readonly readonly: string
  *items() {}
  async *stream() {}
}";
        assert_eq!(
            class_text(source),
            "export declare class Odd {
  static: number;
  async(): void;
  readonly readonly: string;
  items(): Generator<unknown, void, unknown>;
  stream(): AsyncGenerator<unknown, void, unknown>;
}"
        );
    }

    #[test]
    fn test_arrow_property_and_default_anonymous_class() {
        let source = "export default class extends Base {
  handler = (e: Event): void => { this.fire(e) }
  items = [1, 2]
}";
        assert_eq!(
            class_text(source),
            "export default class extends Base {
  handler: (e: Event) => void;
  items: number[];
}"
        );
    }

    #[test]
    fn test_multiline_member_types_keep_relative_indent() {
        let source = "export class Picker {
  mode: 'first'
    | 'last'
  pick(): Left
    | Right { return pickOne() }
}";
        assert_eq!(
            class_text(source),
            "export declare class Picker {
  mode: 'first'
    | 'last';
  pick(): Left
    | Right;
}"
        );
    }

    #[test]
    fn test_split_heritage() {
        assert_eq!(
            split_heritage(" extends Mixin(A, B) implements I<T>, J "),
            (Some("Mixin(A, B)".to_string()), vec!["I<T>".to_string(), "J".to_string()])
        );
        assert_eq!(split_heritage(""), (None, vec![]));
    }
}

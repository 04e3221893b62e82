//! @dose
//! purpose: Import and export statement extractors. Module-level statements keep their source
//!     form, normalized with comments removed and a trailing `;`.
//!
//! when-editing:
//!     - !Default-exported expressions are typed through inference and rendered as a
//!       `_default` constant; identifiers pass through as `export default x;`
//!     - Source-less export lists record their specifiers so local values can be promoted
//!
//! gotchas:
//!     - `import X = require()` is an import, `export =` and `export as namespace` are exports

use super::chars::{is_entity_name, is_identifier};
use super::lexical::strip_comments;
use super::matcher::{split_top_level, Context};
use super::{Modifiers, Scanner};
use crate::emit::{infer_type, InferMode, DEFAULT_NAME};
use crate::types::{Declaration, DeclarationDetail, ExportSpecifier, VariableKeyword};

/// Normalized statement text: comments removed, trailing `;` added
fn statement_text(raw: &str) -> String {
    let stripped = strip_comments(raw);
    let mut text = stripped.trim().trim_end_matches(';').trim_end().to_string();
    text.push(';');
    text
}

/// The module specifier of an import or export statement, without quotes
fn module_specifier(statement: &str) -> Option<String> {
    let search = match statement.rfind(" from ") {
        Some(pos) => &statement[pos..],
        None => statement,
    };
    let open = search.find(['\'', '"'])?;
    let quote = search.as_bytes()[open];
    let rest = &search[open + 1..];
    let close = rest.find(char::from(quote))?;
    Some(rest[..close].to_string())
}

/// Parse the inside of `{ a, type b, c as d }`
fn parse_specifiers(inner: &str, all_type_only: bool) -> Vec<ExportSpecifier> {
    split_top_level(inner, b',')
        .into_iter()
        .filter_map(|spec| {
            let spec = strip_comments(spec);
            let mut words = spec.split_whitespace().peekable();
            let mut is_type_only = all_type_only;
            if words.peek() == Some(&"type") {
                let mut probe = words.clone();
                probe.next();
                if probe.peek().is_some() && probe.peek() != Some(&"as") {
                    is_type_only = true;
                    words.next();
                }
            }
            let local = words.next()?.to_string();
            let exported = match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => alias.to_string(),
                _ => local.clone(),
            };
            Some(ExportSpecifier {
                local,
                exported,
                is_type_only,
            })
        })
        .collect()
}

impl<'a, 'p> Scanner<'a, 'p> {
    /// `import ...` and `export import X = ...`
    pub(crate) fn scan_import(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        let keyword_start = self.cur.pos();
        self.cur.advance("import".len());
        self.cur.skip_trivia();
        let is_type_only = {
            let (next_byte, next_word) = self.lookahead();
            self.cur.peek_word() == "type"
                && (matches!(next_byte, Some(b'{') | Some(b'*'))
                    || (!next_word.is_empty() && next_word != "from" && next_word != "="))
        };
        let clause_start = self.cur.pos();
        self.cur.scan_expression(&[], Context::TopLevel);
        self.cur.eat(b';');
        let raw = self.cur.slice(keyword_start, self.cur.pos());
        let clause = self.cur.slice(clause_start, self.cur.pos());

        let mut text = statement_text(raw);
        if mods.exported {
            text.insert_str(0, "export ");
        }
        let name = import_binding(clause);
        let source = module_specifier(&text).unwrap_or_else(|| {
            clause
                .split_once('=')
                .map(|(_, target)| target.trim().trim_end_matches(';').trim().to_string())
                .unwrap_or_default()
        });
        let mut decl = self.declaration(name, DeclarationDetail::Import { source }, &mods, comments);
        decl.is_type_only = is_type_only;
        decl.text = with_leading(&decl.leading_comments, text);
        out.push(decl);
    }

    /// `export { ... } [from '...']` and `export * [as ns] from '...'`; the cursor is on
    /// the `{` or `*`
    pub(crate) fn scan_export_clause(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        type_only: bool,
        out: &mut Vec<Declaration>,
    ) {
        let clause_start = self.cur.pos();
        let specifiers = if self.cur.peek() == Some(b'{') {
            let list = self.cur.read_balanced();
            parse_specifiers(list.get(1..list.len().saturating_sub(1)).unwrap_or_default(), type_only)
        } else {
            Vec::new()
        };
        self.cur.scan_expression(&[], Context::TopLevel);
        self.cur.eat(b';');
        let clause = self.cur.slice(clause_start, self.cur.pos());

        let keyword = if type_only { "export type " } else { "export " };
        let text = statement_text(&format!("{keyword}{clause}"));
        let source = module_specifier(&text);
        let name = if specifiers.is_empty() {
            // `export * as ns from '...'` binds one name
            clause
                .split_whitespace()
                .skip_while(|w| *w != "as")
                .nth(1)
                .filter(|w| is_identifier(w))
                .unwrap_or_default()
                .to_string()
        } else {
            String::new()
        };
        let mods = Modifiers {
            exported: true,
            ..mods
        };
        let mut decl = self.declaration(
            name,
            DeclarationDetail::Export { source, specifiers },
            &mods,
            comments,
        );
        decl.is_type_only = type_only;
        decl.text = with_leading(&decl.leading_comments, text);
        out.push(decl);
    }

    /// `export = expr`
    pub(crate) fn scan_export_assignment(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance(1);
        self.cur.skip_trivia();
        let target = self.cur.scan_expression(&[], Context::TopLevel);
        self.cur.eat(b';');
        let target = strip_comments(target).trim().to_string();
        let specifiers = if is_entity_name(&target) {
            vec![ExportSpecifier {
                local: root_name(&target).to_string(),
                exported: target.clone(),
                is_type_only: false,
            }]
        } else {
            Vec::new()
        };
        let text = format!("export = {target};");
        let mut decl = self.declaration(
            target,
            DeclarationDetail::Export {
                source: None,
                specifiers,
            },
            &mods,
            comments,
        );
        decl.text = with_leading(&decl.leading_comments, text);
        out.push(decl);
    }

    /// `export as namespace Name`
    pub(crate) fn scan_export_as_namespace(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("as".len());
        self.cur.skip_trivia();
        self.cur.eat_word("namespace");
        self.cur.skip_trivia();
        let name = self.cur.read_word();
        self.cur.skip_statement(Context::TopLevel);
        let text = format!("export as namespace {name};");
        let mut decl = self.declaration(
            name,
            DeclarationDetail::Export {
                source: None,
                specifiers: Vec::new(),
            },
            &mods,
            comments,
        );
        decl.text = with_leading(&decl.leading_comments, text);
        out.push(decl);
    }

    /// `export default <expression>` where the expression is not a declaration
    pub(crate) fn scan_export_default_expression(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        let expr = self.cur.scan_expression(&[], Context::TopLevel);
        self.cur.eat(b';');
        let expr = strip_comments(expr).trim().to_string();
        if expr.is_empty() {
            return;
        }
        if is_identifier(&expr) {
            let text = format!("export default {expr};");
            let specifiers = vec![ExportSpecifier {
                local: expr.clone(),
                exported: DEFAULT_NAME.to_string(),
                is_type_only: false,
            }];
            let mut decl = self.declaration(
                DEFAULT_NAME,
                DeclarationDetail::Export {
                    source: None,
                    specifiers,
                },
                &mods,
                comments,
            );
            decl.text = with_leading(&decl.leading_comments, text);
            out.push(decl);
            return;
        }
        let type_annotation = infer_type(&expr, InferMode::narrow(self.options.isolated));
        out.push(self.declaration(
            DEFAULT_NAME,
            DeclarationDetail::Variable {
                keyword: VariableKeyword::Const,
                type_annotation,
            },
            &mods,
            comments,
        ));
    }
}

/// The single local name an import binds, or empty for bulk and side-effect imports
fn import_binding(clause: &str) -> String {
    let clause = strip_comments(clause);
    let mut words = clause.split_whitespace();
    let mut first = words.next().unwrap_or_default();
    if first == "type" {
        first = words.next().unwrap_or_default();
    }
    if first == "*" {
        return match (words.next(), words.next()) {
            (Some("as"), Some(alias)) => alias.trim_end_matches(',').to_string(),
            _ => String::new(),
        };
    }
    let first = first.trim_end_matches(',');
    if is_identifier(first) {
        first.to_string()
    } else {
        String::new()
    }
}

fn root_name(entity: &str) -> &str {
    entity.split('.').next().unwrap_or(entity)
}

fn with_leading(comments: &[String], text: String) -> String {
    if comments.is_empty() {
        return text;
    }
    format!("{}\n{text}", comments.join("\n"))
}

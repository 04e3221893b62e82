//! @dose
//! purpose: Namespace, ambient module and `declare global` extractors. Bodies are scanned
//!     with the top-level dispatcher and finalized in their own scope.
//!
//! invariants:
//!     - Ambient bodies keep every member; plain namespaces keep their exports plus the local
//!       types those exports mention
//!     - Nesting is bounded by limits::MAX_MODULE_DEPTH; deeper bodies are skipped whole

use tracing::debug;

use super::matcher::Context;
use super::{Modifiers, Scanner};
use crate::limits::MAX_MODULE_DEPTH;
use crate::resolve::{self, Scope};
use crate::types::{Declaration, DeclarationDetail};

impl<'a, 'p> Scanner<'a, 'p> {
    /// `namespace A.B { }`, `module A { }` or `declare module "x" { }`; the cursor is on the
    /// keyword
    pub(crate) fn scan_module(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.read_word();
        self.cur.skip_trivia();
        let (name, source) = match self.cur.peek() {
            Some(quote @ (b'\'' | b'"')) => {
                let start = self.cur.pos();
                self.cur.skip_string();
                let quoted = self.cur.slice(start, self.cur.pos());
                let specifier = quoted.trim_matches(char::from(quote)).to_string();
                (quoted.to_string(), Some(specifier))
            }
            _ => (self.read_dotted_name(), None),
        };
        if name.is_empty() {
            self.cur.skip_statement(Context::TopLevel);
            return;
        }

        let saved = self.cur.pos();
        self.cur.skip_trivia();
        let is_shorthand = self.cur.peek() != Some(b'{');
        let body = if is_shorthand {
            self.cur.rewind(saved);
            self.cur.skip_inline_whitespace();
            self.cur.eat(b';');
            Vec::new()
        } else {
            let scope = if source.is_some() || mods.declare {
                Scope::Ambient
            } else {
                Scope::Namespace
            };
            self.scan_module_body(scope)
        };
        out.push(self.declaration(
            name,
            DeclarationDetail::Module {
                source,
                is_global: false,
                is_shorthand,
                body,
            },
            &mods,
            comments,
        ));
    }

    /// `declare global { }`; the cursor is on `global`
    pub(crate) fn scan_global(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("global".len());
        self.cur.skip_trivia();
        let body = self.scan_module_body(Scope::Ambient);
        out.push(self.declaration(
            "global",
            DeclarationDetail::Module {
                source: None,
                is_global: true,
                is_shorthand: false,
                body,
            },
            &mods,
            comments,
        ));
    }

    fn read_dotted_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            let part = self.cur.read_word();
            if part.is_empty() {
                break;
            }
            name.push_str(part);
            self.cur.skip_inline_whitespace();
            if !self.cur.eat(b'.') {
                break;
            }
            name.push('.');
            self.cur.skip_inline_whitespace();
        }
        name.trim_end_matches('.').to_string()
    }

    /// Scan and resolve a `{ ... }` body; the cursor is on the opening brace
    fn scan_module_body(&mut self, scope: Scope) -> Vec<Declaration> {
        if self.module_depth >= MAX_MODULE_DEPTH {
            debug!(depth = self.module_depth, "module nesting limit reached, body skipped");
            self.cur.find_matching();
            return Vec::new();
        }
        self.cur.advance(1);
        self.module_depth += 1;
        let items = self.scan_statements(true);
        self.module_depth -= 1;
        self.cur.eat(b'}');
        resolve::finalize(items, self.patterns, scope)
    }
}

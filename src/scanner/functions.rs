//! @dose
//! purpose: Function declarations and the parameter-list reader shared by functions, class
//!     methods, constructors and inferred function-expression types.
//!
//! when-editing:
//!     - !A parameter with a default value is optional and its type is inferred (widened)
//!       from the default when no annotation is present
//!     - !Binding patterns keep their shape but lose nested default values
//!     - has_body is the overload-collapsing marker; set it only when a `{` body was skipped
//!
//! invariants:
//!     - parse_parameters never fails; an unreadable parameter keeps its raw text as name
//!
//! gotchas:
//!     - The return type of an overload signature ends at a boundary line break, not `;`
//!     - `function* gen()` and `async function` are encoded as flags, never as text

use super::chars::is_ident_start;
use super::cursor::Cursor;
use super::lexical::strip_comments;
use super::matcher::{find_top_level, split_top_level, Context};
use super::{Modifiers, Scanner};
use crate::emit::{infer_type, InferMode, DEFAULT_NAME};
use crate::limits::MAX_BINDING_DEPTH;
use crate::types::{Declaration, DeclarationDetail, FunctionSignature, Parameter};

/// Parameter-property modifiers accepted before a constructor parameter name
const PARAMETER_MODIFIERS: &[&str] = &["public", "protected", "private", "readonly", "override"];

/// Parse the text between the parentheses of a parameter list
pub(crate) fn parse_parameters(list: &str, isolated: bool) -> Vec<Parameter> {
    let cleaned = strip_comments(list);
    split_top_level(&cleaned, b',')
        .into_iter()
        .map(|param| parse_parameter(param, isolated))
        .collect()
}

fn parse_parameter(text: &str, isolated: bool) -> Parameter {
    let mut cur = Cursor::new(text);
    let mut param = Parameter::default();
    loop {
        cur.skip_whitespace();
        if cur.peek() == Some(b'@') {
            cur.skip_decorator();
            continue;
        }
        let word = cur.peek_word();
        if !PARAMETER_MODIFIERS.contains(&word) {
            break;
        }
        // A modifier must be followed by the binding name
        let saved = cur.pos();
        cur.advance(word.len());
        cur.skip_whitespace();
        match cur.peek() {
            Some(b) if is_ident_start(b) || b == b'{' || b == b'[' => {
                param.modifiers.push(word.to_string());
            }
            _ => {
                cur.rewind(saved);
                break;
            }
        }
    }
    if cur.starts_with("...") {
        param.rest = true;
        cur.advance(3);
        cur.skip_whitespace();
    }
    param.name = match cur.peek() {
        Some(b'{') | Some(b'[') => clean_binding_pattern(cur.read_balanced()),
        _ => cur.read_word().to_string(),
    };
    if param.name.is_empty() {
        param.name = text.trim().to_string();
        param.type_annotation = "any".to_string();
        return param;
    }

    cur.skip_whitespace();
    if cur.eat(b'?') {
        param.optional = true;
        cur.skip_whitespace();
    }
    let rest = cur.rest();
    let (annotation, default) = if let Some(after_colon) = rest.strip_prefix(':') {
        match find_top_level(after_colon, b'=') {
            Some(eq) => (
                Some(after_colon[..eq].trim()),
                Some(after_colon[eq + 1..].trim()),
            ),
            None => (Some(after_colon.trim()), None),
        }
    } else if let Some(after_eq) = rest.strip_prefix('=') {
        (None, Some(after_eq.trim()))
    } else {
        (None, None)
    };

    if let Some(default) = default.filter(|d| !d.is_empty()) {
        param.optional = true;
        param.default_text = Some(default.to_string());
    }
    param.type_annotation = match (annotation.filter(|a| !a.is_empty()), &param.default_text) {
        (Some(annotation), _) => annotation.to_string(),
        (None, Some(default)) => infer_type(default, InferMode::widen(isolated)),
        (None, None) if param.rest => "any[]".to_string(),
        (None, None) => "any".to_string(),
    };
    param
}

/// Drop default values from a destructuring pattern, recursively
pub(crate) fn clean_binding_pattern(pattern: &str) -> String {
    clean_pattern_nested(pattern, 0)
}

fn clean_pattern_nested(pattern: &str, depth: usize) -> String {
    let pattern = pattern.trim();
    let (open, close) = match pattern.as_bytes().first() {
        Some(b'{') => ('{', '}'),
        Some(b'[') => ('[', ']'),
        _ => return strip_default(pattern).to_string(),
    };
    if depth >= MAX_BINDING_DEPTH {
        return pattern.to_string();
    }
    let inner = pattern[1..].strip_suffix(close).unwrap_or(&pattern[1..]);
    let elements: Vec<String> = split_top_level(inner, b',')
        .into_iter()
        .map(|element| {
            let element = strip_default(element);
            match find_top_level(element, b':') {
                Some(colon) if open == '{' => format!(
                    "{}: {}",
                    element[..colon].trim(),
                    clean_pattern_nested(&element[colon + 1..], depth + 1)
                ),
                _ => clean_pattern_nested(element, depth + 1),
            }
        })
        .collect();
    if elements.is_empty() {
        return format!("{open}{close}");
    }
    if open == '{' {
        format!("{{ {} }}", elements.join(", "))
    } else {
        format!("[{}]", elements.join(", "))
    }
}

fn strip_default(element: &str) -> &str {
    match find_top_level(element, b'=') {
        Some(eq) => element[..eq].trim(),
        None => element.trim(),
    }
}

impl<'a, 'p> Scanner<'a, 'p> {
    /// Read `<generics>(params)[: R]` and skip any body; the cursor is after the name
    pub(crate) fn read_signature(&mut self, ctx: Context) -> FunctionSignature {
        let generics = self.read_generics();
        self.cur.skip_trivia();
        let parameters = if self.cur.peek() == Some(b'(') {
            let list = self.cur.read_balanced();
            parse_parameters(
                list.get(1..list.len().saturating_sub(1)).unwrap_or_default(),
                self.options.isolated,
            )
        } else {
            Vec::new()
        };
        self.cur.skip_inline_whitespace();
        let return_type = if self.cur.eat(b':') {
            self.cur.skip_trivia();
            let ty = strip_comments(self.cur.scan_return_type(ctx));
            Some(ty.trim().to_string()).filter(|ty| !ty.is_empty())
        } else {
            None
        };
        let has_body = self.skip_body();
        FunctionSignature {
            generics,
            parameters,
            return_type,
            has_body,
        }
    }

    /// Skip an implementation body if one follows, else an optional `;`
    pub(crate) fn skip_body(&mut self) -> bool {
        let saved = self.cur.pos();
        self.cur.skip_trivia();
        if self.cur.peek() == Some(b'{') {
            self.cur.find_matching();
            return true;
        }
        if !self.cur.eat(b';') {
            self.cur.rewind(saved);
        }
        false
    }

    pub(crate) fn scan_function(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.cur.advance("function".len());
        self.cur.skip_trivia();
        let is_generator = self.cur.eat(b'*');
        self.cur.skip_trivia();
        let mut name = self.cur.read_word();
        if name.is_empty() {
            if !mods.default {
                // Anonymous function expression statement
                self.cur.skip_statement(Context::TopLevel);
                return;
            }
            name = DEFAULT_NAME;
        }
        let signature = self.read_signature(Context::TopLevel);
        let mut decl =
            self.declaration(name, DeclarationDetail::Function(signature), &mods, comments);
        decl.is_generator = is_generator;
        out.push(decl);
    }
}

//! @dose
//! purpose: Type inference for unannotated bindings. Given an initializer or default-value
//!     expression, produce the type a declaration file should carry: narrow literal types in
//!     const and readonly contexts, widened base types elsewhere, the asserted type for `as`
//!     casts, readonly shapes for `as const`, and structural shapes for object, array and
//!     function initializers. Whatever cannot be read off the text becomes `unknown`.
//!
//! when-editing:
//!     - !Isolated mode stops after assertions and literals; structural inference is off
//!     - !Never guess: an unrecognised expression must yield `unknown`
//!     - Recursion over nested literals is bounded by limits::MAX_INFERENCE_DEPTH
//!
//! invariants:
//!     - The result is always a non-empty type string
//!     - The last top-level `as` wins (`x as unknown as T` infers `T`)
//!
//! gotchas:
//!     - An arrow function body may contain `as`; arrow detection runs before assertions
//!     - `<T>expr` is a cast, but `<T>(x: T) => x` is a generic arrow function

use once_cell::sync::Lazy;
use regex::Regex;

use super::render_parameters;
use crate::limits::MAX_INFERENCE_DEPTH;
use crate::scanner::chars::{is_entity_name, is_ident_part, is_identifier};
use crate::scanner::cursor::Cursor;
use crate::scanner::functions::parse_parameters;
use crate::scanner::lexical::strip_comments;
use crate::scanner::matcher::{find_top_level, find_top_level_arrow, rfind_top_level_word, split_top_level};

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^-?(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+|\d[\d_]*(?:\.[\d_]*)?(?:[eE][+-]?\d+)?|\.\d[\d_]*(?:[eE][+-]?\d+)?)$",
    )
    .expect("valid regex")
});

static BIGINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+|\d[\d_]*)n$")
        .expect("valid regex")
});

const UNKNOWN: &str = "unknown";

/// How an initializer is being typed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferMode {
    /// Keep literal types (const bindings, readonly properties)
    pub narrow: bool,
    /// Restrict inference to assertions and literals
    pub isolated: bool,
}

impl InferMode {
    pub fn narrow(isolated: bool) -> Self {
        Self {
            narrow: true,
            isolated,
        }
    }

    pub fn widen(isolated: bool) -> Self {
        Self {
            narrow: false,
            isolated,
        }
    }

    fn widened(self) -> Self {
        Self {
            narrow: false,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    String,
    Number,
    BigInt,
    Boolean,
}

impl Literal {
    fn base(self) -> &'static str {
        match self {
            Literal::String => "string",
            Literal::Number => "number",
            Literal::BigInt => "bigint",
            Literal::Boolean => "boolean",
        }
    }
}

/// Infer the declared type of an initializer expression
pub fn infer_type(expr: &str, mode: InferMode) -> String {
    let cleaned = strip_comments(expr);
    infer_at(cleaned.trim(), mode, 0)
}

fn infer_at(expr: &str, mode: InferMode, depth: usize) -> String {
    if depth > MAX_INFERENCE_DEPTH || expr.is_empty() {
        return UNKNOWN.to_string();
    }
    let expr = unwrap_parens(expr);

    if is_function_expression(expr) {
        if mode.isolated {
            return UNKNOWN.to_string();
        }
        return infer_function(expr).unwrap_or_else(|| UNKNOWN.to_string());
    }

    if let Some(pos) = rfind_top_level_word(expr, "as") {
        let subject = expr[..pos].trim();
        let target = expr[pos + 2..].trim();
        if target == "const" {
            return infer_const(subject, depth);
        }
        if !target.is_empty() {
            return target.to_string();
        }
    }
    if let Some(pos) = rfind_top_level_word(expr, "satisfies") {
        return infer_at(expr[..pos].trim(), mode, depth + 1);
    }
    if expr.starts_with('<') {
        let mut cur = Cursor::new(expr);
        let cast = cur.read_balanced();
        if cast.len() > 2 && !cur.rest().trim().is_empty() {
            return cast[1..cast.len() - 1].trim().to_string();
        }
    }
    if let Some(inner) = expr.strip_suffix('!') {
        if !inner.ends_with('!') {
            return infer_at(inner.trim(), mode, depth + 1);
        }
    }

    if let Some(kind) = literal_kind(expr) {
        return if mode.narrow {
            expr.to_string()
        } else {
            kind.base().to_string()
        };
    }
    match expr {
        "null" => return "null".to_string(),
        "undefined" | "void 0" => return "undefined".to_string(),
        _ => {}
    }
    if is_regex_literal(expr) {
        return "RegExp".to_string();
    }

    if mode.isolated {
        return UNKNOWN.to_string();
    }
    if expr.starts_with('`') {
        return "string".to_string();
    }
    if let Some(rest) = strip_word(expr, "new") {
        return infer_new(rest).unwrap_or_else(|| UNKNOWN.to_string());
    }
    if let Some(inner) = delimited(expr, b'{') {
        return infer_object(inner, mode.widened(), depth);
    }
    if let Some(inner) = delimited(expr, b'[') {
        return infer_array(inner, mode.widened(), depth);
    }
    UNKNOWN.to_string()
}

/// Literal type of `expr` if the whole expression is one literal token
fn literal_kind(expr: &str) -> Option<Literal> {
    match expr.as_bytes().first()? {
        b'\'' | b'"' => {
            let mut cur = Cursor::new(expr);
            cur.skip_string();
            (cur.at_end() && expr.len() >= 2).then_some(Literal::String)
        }
        b'`' => {
            let mut cur = Cursor::new(expr);
            cur.skip_template();
            (cur.at_end() && expr.len() >= 2 && !expr.contains("${")).then_some(Literal::String)
        }
        _ if expr == "true" || expr == "false" => Some(Literal::Boolean),
        _ if BIGINT.is_match(expr) => Some(Literal::BigInt),
        _ if NUMBER.is_match(expr) => Some(Literal::Number),
        _ => None,
    }
}

fn is_regex_literal(expr: &str) -> bool {
    if !expr.starts_with('/') || expr.starts_with("//") || expr.starts_with("/*") {
        return false;
    }
    let mut cur = Cursor::new(expr);
    cur.skip_regex();
    cur.at_end()
}

/// Strip parentheses that wrap the whole expression, at most MAX_INFERENCE_DEPTH pairs
fn unwrap_parens(mut expr: &str) -> &str {
    for _ in 0..MAX_INFERENCE_DEPTH {
        match delimited(expr, b'(') {
            Some(inner) => expr = inner.trim(),
            None => break,
        }
    }
    expr
}

/// Inner text when `expr` is exactly one balanced span opened by `open`
fn delimited(expr: &str, open: u8) -> Option<&str> {
    if expr.as_bytes().first() != Some(&open) {
        return None;
    }
    let close = match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    };
    let mut cur = Cursor::new(expr);
    cur.find_matching();
    if !cur.at_end() || expr.len() < 2 || expr.as_bytes().last() != Some(&close) {
        return None;
    }
    Some(&expr[1..expr.len() - 1])
}

fn strip_word<'e>(expr: &'e str, word: &str) -> Option<&'e str> {
    let rest = expr.strip_prefix(word)?;
    match rest.bytes().next() {
        Some(b) if is_ident_part(b) => None,
        _ => Some(rest.trim_start()),
    }
}

fn is_function_expression(expr: &str) -> bool {
    let head = strip_word(expr, "async").unwrap_or(expr);
    if strip_word(head, "function").is_some() {
        return true;
    }
    let Some(arrow) = find_top_level_arrow(head) else {
        return false;
    };
    let params = head[..arrow].trim();
    if is_identifier(params) {
        return true;
    }
    // Generic arrow functions start with a type parameter list
    let params = if params.starts_with('<') {
        let mut cur = Cursor::new(params);
        cur.find_matching();
        cur.rest().trim_start()
    } else {
        params
    };
    params.starts_with('(')
}

/// `(params) => R` for an arrow or function expression
fn infer_function(expr: &str) -> Option<String> {
    let mut cur = Cursor::new(expr);
    let is_async = cur.eat_word("async");
    cur.skip_trivia();
    let mut is_generator = false;
    if cur.eat_word("function") {
        cur.skip_trivia();
        is_generator = cur.eat(b'*');
        cur.skip_trivia();
        cur.read_word();
        cur.skip_trivia();
    }
    let generics = if cur.peek() == Some(b'<') {
        cur.read_balanced()
    } else {
        ""
    };
    cur.skip_trivia();
    let params = match cur.peek() {
        Some(b'(') => {
            let list = cur.read_balanced();
            parse_parameters(list.get(1..list.len().saturating_sub(1)).unwrap_or_default(), false)
        }
        Some(b) if is_ident_part(b) => {
            let name = cur.read_word();
            parse_parameters(name, false)
        }
        _ => return None,
    };
    cur.skip_trivia();
    let declared = if cur.eat(b':') {
        let rest = cur.rest();
        let end = find_top_level_arrow(rest)
            .or_else(|| find_top_level(rest, b'{'))
            .unwrap_or(rest.len());
        Some(rest[..end].trim()).filter(|ty| !ty.is_empty())
    } else {
        None
    };
    let ret = match (declared, is_async, is_generator) {
        (Some(ty), _, _) => ty.to_string(),
        (None, false, false) => UNKNOWN.to_string(),
        (None, true, false) => format!("Promise<{UNKNOWN}>"),
        (None, false, true) => "Generator<unknown, void, unknown>".to_string(),
        (None, true, true) => "AsyncGenerator<unknown, void, unknown>".to_string(),
    };
    Some(format!("{generics}({}) => {ret}", render_parameters(&params)))
}

fn infer_new(rest: &str) -> Option<String> {
    let end = rest
        .bytes()
        .position(|b| !(is_ident_part(b) || b == b'.'))
        .unwrap_or(rest.len());
    let name = &rest[..end];
    if !is_entity_name(name) {
        return None;
    }
    let after = &rest[end..];
    if after.starts_with('<') {
        let mut cur = Cursor::new(after);
        let args = cur.read_balanced();
        return Some(format!("{name}{args}"));
    }
    Some(name.to_string())
}

/// Sorted-out parts of one object-literal property
enum Property<'e> {
    Value { key: &'e str, value: &'e str },
    Shorthand(&'e str),
    Method { key: &'e str, text: &'e str },
}

fn parse_property(prop: &str) -> Option<Property<'_>> {
    if prop.starts_with("...") || prop.starts_with('[') {
        return None;
    }
    if let Some(colon) = find_top_level(prop, b':') {
        let key = prop[..colon].trim();
        let paren = find_top_level(prop, b'(');
        if paren.map_or(true, |paren| paren > colon) {
            return Some(Property::Value {
                key,
                value: prop[colon + 1..].trim(),
            });
        }
    }
    if is_identifier(prop) {
        return Some(Property::Shorthand(prop));
    }
    let head = strip_word(prop, "async").unwrap_or(prop);
    let head = head.strip_prefix('*').map(str::trim_start).unwrap_or(head);
    if strip_word(head, "get").is_some() || strip_word(head, "set").is_some() {
        return None;
    }
    let paren = find_top_level(head, b'(')?;
    let key = head[..paren].trim();
    let key = key.split('<').next().unwrap_or(key).trim();
    Some(Property::Method { key, text: prop })
}

/// Method shorthand `name(params): R { ... }` as a function type
fn method_type(text: &str) -> String {
    let (is_async, rest) = match strip_word(text, "async") {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (is_generator, rest) = match rest.strip_prefix('*') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, rest),
    };
    let Some(paren) = find_top_level(rest, b'(') else {
        return UNKNOWN.to_string();
    };
    let mut signature = String::from("function ");
    if is_generator {
        signature.push('*');
    }
    signature.push_str(&rest[paren..]);
    if is_async {
        signature.insert_str(0, "async ");
    }
    infer_function(&signature).unwrap_or_else(|| UNKNOWN.to_string())
}

fn infer_object(inner: &str, mode: InferMode, depth: usize) -> String {
    let fields: Vec<String> = split_top_level(inner, b',')
        .into_iter()
        .filter_map(parse_property)
        .map(|prop| match prop {
            Property::Value { key, value } => {
                format!("{key}: {}", infer_at(value, mode, depth + 1))
            }
            Property::Shorthand(name) => format!("{name}: typeof {name}"),
            Property::Method { key, text } => format!("{key}: {}", method_type(text)),
        })
        .collect();
    if fields.is_empty() {
        return "{}".to_string();
    }
    format!("{{ {} }}", fields.join("; "))
}

fn infer_array(inner: &str, mode: InferMode, depth: usize) -> String {
    let mut members: Vec<String> = Vec::new();
    for element in split_top_level(inner, b',') {
        let ty = if element.starts_with("...") {
            UNKNOWN.to_string()
        } else {
            infer_at(element, mode, depth + 1)
        };
        if !members.contains(&ty) {
            members.push(ty);
        }
    }
    match members.as_slice() {
        [] => format!("{UNKNOWN}[]"),
        [single] if !needs_parens(single) => format!("{single}[]"),
        [single] => format!("({single})[]"),
        many => format!("({})[]", many.join(" | ")),
    }
}

fn needs_parens(ty: &str) -> bool {
    find_top_level_arrow(ty).is_some() || split_top_level(ty, b'|').len() > 1
}

/// Inference under a const assertion
fn infer_const(expr: &str, depth: usize) -> String {
    if depth > MAX_INFERENCE_DEPTH {
        return UNKNOWN.to_string();
    }
    let expr = unwrap_parens(expr);
    if literal_kind(expr).is_some() || expr == "null" || expr == "undefined" {
        return expr.to_string();
    }
    if let Some(inner) = delimited(expr, b'{') {
        let fields: Vec<String> = split_top_level(inner, b',')
            .into_iter()
            .filter_map(parse_property)
            .map(|prop| match prop {
                Property::Value { key, value } => {
                    format!("readonly {key}: {}", infer_const(value, depth + 1))
                }
                Property::Shorthand(name) => format!("readonly {name}: typeof {name}"),
                Property::Method { key, text } => format!("readonly {key}: {}", method_type(text)),
            })
            .collect();
        if fields.is_empty() {
            return "{}".to_string();
        }
        return format!("{{ {} }}", fields.join("; "));
    }
    if let Some(inner) = delimited(expr, b'[') {
        let elements: Vec<String> = split_top_level(inner, b',')
            .into_iter()
            .map(|element| infer_const(element, depth + 1))
            .collect();
        return format!("readonly [{}]", elements.join(", "));
    }
    if is_entity_name(expr) {
        return format!("typeof {expr}");
    }
    UNKNOWN.to_string()
}

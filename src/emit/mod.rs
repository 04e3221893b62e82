//! @dose
//! purpose: The declaration-only text builder. Renders each declaration record as a
//!     self-contained, implementation-free signature: modifiers in canonical order, bodies
//!     elided, missing return types synthesized.
//!
//! when-editing:
//!     - !render is a pure function of the record; calling it twice yields the same text
//!     - !Nested declarations (namespace members) never carry `declare`; the enclosing module
//!       indents their text
//!     - Import and export statements are normalized by their extractor; render returns
//!       their text unchanged
//!
//! invariants:
//!     - Output never contains a statement body
//!     - Class member modifiers are ordered access, static, abstract, readonly
//!
//! gotchas:
//!     - A function or class named "default" is an anonymous default export
//!     - Non-identifier default-export expressions render as a `_default` constant

pub mod infer;

pub use infer::{infer_type, InferMode};

use crate::types::{
    Access, ClassMember, Declaration, DeclarationDetail, EnumMember, FunctionSignature,
    MemberKind, Parameter,
};

const INDENT: &str = "  ";

/// Name given to anonymous default exports
pub const DEFAULT_NAME: &str = "default";

/// Where a declaration is being rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Inside a namespace or module body, where `declare` is implied
    pub nested: bool,
}

impl RenderContext {
    pub fn top_level() -> Self {
        Self { nested: false }
    }

    pub fn nested() -> Self {
        Self { nested: true }
    }
}

/// Render the declaration-only text of `decl`
pub fn render(decl: &Declaration, ctx: RenderContext) -> String {
    let body = match &decl.detail {
        DeclarationDetail::Import { .. } | DeclarationDetail::Export { .. } => {
            return decl.text.clone();
        }
        DeclarationDetail::Function(sig) => render_function(decl, sig, ctx),
        DeclarationDetail::Variable {
            keyword,
            type_annotation,
        } => {
            if decl.is_default {
                format!(
                    "{}const _default: {type_annotation};\nexport default _default;",
                    declare(ctx)
                )
            } else {
                format!(
                    "{} {}: {type_annotation};",
                    prefix(decl, ctx, keyword.as_str()),
                    decl.name
                )
            }
        }
        DeclarationDetail::Interface {
            generics,
            extends,
            members,
        } => {
            let mut header = format!(
                "{} {}{}",
                prefix(decl, ctx, "interface"),
                decl.name,
                generics.as_deref().unwrap_or_default()
            );
            if let Some(extends) = extends {
                header.push_str(" extends ");
                header.push_str(extends);
            }
            block(&header, members.iter().cloned())
        }
        DeclarationDetail::Type {
            generics,
            definition,
        } => {
            let export = if decl.is_exported { "export " } else { "" };
            format!(
                "{export}type {}{} = {definition};",
                decl.name,
                generics.as_deref().unwrap_or_default()
            )
        }
        DeclarationDetail::Class {
            generics,
            extends,
            implements,
            is_abstract,
            members,
        } => {
            let keyword = if *is_abstract { "abstract class" } else { "class" };
            let mut header = prefix(decl, ctx, keyword);
            if decl.name != DEFAULT_NAME {
                header.push(' ');
                header.push_str(&decl.name);
            }
            header.push_str(generics.as_deref().unwrap_or_default());
            if let Some(extends) = extends {
                header.push_str(" extends ");
                header.push_str(extends);
            }
            if !implements.is_empty() {
                header.push_str(" implements ");
                header.push_str(&implements.join(", "));
            }
            block(&header, members.iter().map(render_class_member))
        }
        DeclarationDetail::Enum { is_const, members } => {
            let keyword = if *is_const { "const enum" } else { "enum" };
            let header = format!("{} {}", prefix(decl, ctx, keyword), decl.name);
            block(&header, enum_lines(members))
        }
        DeclarationDetail::Module {
            source,
            is_global,
            is_shorthand,
            body,
        } => {
            let header = if *is_global {
                format!("{}global", declare(ctx))
            } else if source.is_some() {
                format!("{}module {}", declare(ctx), decl.name)
            } else {
                format!("{} {}", prefix(decl, ctx, "namespace"), decl.name)
            };
            if *is_shorthand {
                format!("{header};")
            } else {
                block(&header, body.iter().map(|member| member.text.clone()))
            }
        }
    };
    with_comments(&decl.leading_comments, body)
}

fn declare(ctx: RenderContext) -> &'static str {
    if ctx.nested {
        ""
    } else {
        "declare "
    }
}

fn prefix(decl: &Declaration, ctx: RenderContext, keyword: &str) -> String {
    if decl.is_default {
        return format!("export default {keyword}");
    }
    let export = if decl.is_exported { "export " } else { "" };
    format!("{export}{}{keyword}", declare(ctx))
}

fn render_function(decl: &Declaration, sig: &FunctionSignature, ctx: RenderContext) -> String {
    let mut text = prefix(decl, ctx, "function");
    if decl.name != DEFAULT_NAME {
        text.push(' ');
        text.push_str(&decl.name);
    }
    text.push_str(sig.generics.as_deref().unwrap_or_default());
    text.push('(');
    text.push_str(&render_parameters(&sig.parameters));
    text.push_str("): ");
    text.push_str(&return_type(
        sig.return_type.as_deref(),
        decl.is_async,
        decl.is_generator,
    ));
    text.push(';');
    text
}

/// Declared return type, or the type synthesized from the function's flavor
pub fn return_type(declared: Option<&str>, is_async: bool, is_generator: bool) -> String {
    if let Some(declared) = declared {
        return declared.to_string();
    }
    match (is_async, is_generator) {
        (false, false) => "void".to_string(),
        (true, false) => "Promise<void>".to_string(),
        (false, true) => "Generator<unknown, void, unknown>".to_string(),
        (true, true) => "AsyncGenerator<unknown, void, unknown>".to_string(),
    }
}

pub fn render_parameter(param: &Parameter) -> String {
    let rest = if param.rest { "..." } else { "" };
    let optional = if param.optional && !param.rest { "?" } else { "" };
    format!("{rest}{}{optional}: {}", param.name, param.type_annotation)
}

pub fn render_parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(render_parameter)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render one class member as a single `;`-terminated line (plus any retained comments)
pub fn render_class_member(member: &ClassMember) -> String {
    let mut text = String::new();
    if member.access == Some(Access::Protected) {
        text.push_str("protected ");
    }
    if member.is_static {
        text.push_str("static ");
    }
    if member.is_abstract {
        text.push_str("abstract ");
    }
    let optional = if member.is_optional { "?" } else { "" };
    let annotation = member.type_annotation.as_deref();
    match member.kind {
        MemberKind::Property | MemberKind::Index => {
            if member.is_readonly {
                text.push_str("readonly ");
            }
            let ty = annotation.unwrap_or("any");
            text.push_str(&format!("{}{optional}: {ty};", member.name));
        }
        MemberKind::Method => {
            let ret = return_type(annotation, member.is_async, member.is_generator);
            text.push_str(&format!(
                "{}{optional}{}({}): {ret};",
                member.name,
                member.generics.as_deref().unwrap_or_default(),
                render_parameters(&member.parameters)
            ));
        }
        MemberKind::Getter => {
            let ty = annotation.unwrap_or("unknown");
            text.push_str(&format!("get {}(): {ty};", member.name));
        }
        MemberKind::Setter => {
            text.push_str(&format!(
                "set {}({});",
                member.name,
                render_parameters(&member.parameters)
            ));
        }
        MemberKind::Constructor => {
            text.push_str(&format!(
                "constructor({});",
                render_parameters(&member.parameters)
            ));
        }
    }
    with_comments(&member.leading_comments, text)
}

fn enum_lines(members: &[EnumMember]) -> impl Iterator<Item = String> + '_ {
    let last = members.len().saturating_sub(1);
    members.iter().enumerate().map(move |(i, member)| {
        let mut line = match &member.initializer {
            Some(init) => format!("{} = {init}", member.name),
            None => member.name.clone(),
        };
        if i < last {
            line.push(',');
        }
        line
    })
}

fn with_comments(comments: &[String], text: String) -> String {
    if comments.is_empty() {
        return text;
    }
    let mut out = comments.join("\n");
    out.push('\n');
    out.push_str(&text);
    out
}

/// `header {` followed by one indented line per member, then `}`
fn block(header: &str, lines: impl Iterator<Item = String>) -> String {
    let mut lines = lines.peekable();
    if lines.peek().is_none() {
        return format!("{header} {{}}");
    }
    let mut out = format!("{header} {{\n");
    for line in lines {
        out.push_str(&indent(&line, 1));
        out.push('\n');
    }
    out.push('}');
    out
}

/// Prefix every non-empty line of `text` with `levels` indentation steps
pub fn indent(text: &str, levels: usize) -> String {
    let pad = INDENT.repeat(levels);
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove up to `column` leading whitespace characters from every line after the first,
/// so a member lifted out of its source body keeps its relative layout
pub fn dedent_continuation(text: &str, column: usize) -> String {
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        let strip = line
            .bytes()
            .take(column)
            .take_while(|&b| b == b' ' || b == b'\t')
            .count();
        out.push_str(&line[strip..]);
    }
    out
}

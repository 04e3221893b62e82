//! @dose
//! purpose: Variable statement extractor. Every declarator becomes its own record, and
//!     unannotated bindings are typed from their initializer: narrow for `const`, widened
//!     for `let` and `var`.
//!
//! when-editing:
//!     - !Destructuring declarators yield one `unknown` binding per name
//!     - !Each binding spans from its name to the next binding so spans never overlap
//!     - A declarator without initializer or annotation is typed `any`
//!
//! invariants:
//!     - Pattern recursion is bounded by limits::MAX_BINDING_DEPTH; deeper patterns bind nothing
//!
//! gotchas:
//!     - Binding offsets come from subslice positions, so pattern helpers must return
//!       slices of their input rather than copies

use super::chars::{is_ident_part, is_ident_start};
use super::lexical::strip_comments;
use super::matcher::{find_top_level, split_top_level, Context};
use super::{Modifiers, Scanner};
use crate::emit::{infer_type, InferMode};
use crate::limits::MAX_BINDING_DEPTH;
use crate::types::{Declaration, DeclarationDetail, VariableKeyword};

/// Binding names introduced by a destructuring pattern, in source order, each with its
/// byte offset inside `pattern`
pub(crate) fn pattern_bindings(pattern: &str) -> Vec<(usize, String)> {
    let mut names = Vec::new();
    collect_bindings(pattern, pattern.trim(), 0, &mut names);
    names
}

/// Offset of `part`, a subslice of `base`, from the start of `base`
fn offset_in(base: &str, part: &str) -> usize {
    (part.as_ptr() as usize).saturating_sub(base.as_ptr() as usize)
}

fn collect_bindings(base: &str, pattern: &str, depth: usize, names: &mut Vec<(usize, String)>) {
    let is_object = match pattern.as_bytes().first() {
        Some(b'{') => true,
        Some(b'[') => false,
        _ => {
            let name = pattern.trim_start_matches("...").trim();
            let end = name.bytes().position(|b| !is_ident_part(b)).unwrap_or(name.len());
            if name.as_bytes().first().is_some_and(|&b| is_ident_start(b)) {
                names.push((offset_in(base, name), name[..end].to_string()));
            }
            return;
        }
    };
    if depth >= MAX_BINDING_DEPTH {
        return;
    }
    let inner = pattern
        .get(1..pattern.len().saturating_sub(1))
        .unwrap_or_default();
    for element in split_top_level(inner, b',') {
        let element = match find_top_level(element, b'=') {
            Some(eq) => element[..eq].trim(),
            None => element.trim(),
        };
        match find_top_level(element, b':') {
            Some(colon) if is_object && !element.starts_with("...") => {
                collect_bindings(base, element[colon + 1..].trim(), depth + 1, names)
            }
            _ => collect_bindings(base, element, depth + 1, names),
        }
    }
}

impl<'a, 'p> Scanner<'a, 'p> {
    pub(crate) fn scan_variables(
        &mut self,
        mods: Modifiers,
        comments: Vec<String>,
        out: &mut Vec<Declaration>,
    ) {
        let word = self.cur.read_word();
        let Some(keyword) = VariableKeyword::from_word(word) else {
            return;
        };
        let mode = match keyword {
            VariableKeyword::Const => InferMode::narrow(self.options.isolated),
            _ => InferMode::widen(self.options.isolated),
        };
        let mut first = true;
        let mut comments = Some(comments);
        loop {
            self.cur.skip_trivia();
            let declarator_start = self.cur.pos();
            let pattern = match self.cur.peek() {
                Some(b'{') | Some(b'[') => Some(self.cur.read_balanced()),
                Some(b) if is_ident_start(b) => None,
                _ => {
                    self.cur.skip_statement(Context::TopLevel);
                    return;
                }
            };
            let name = if pattern.is_none() {
                self.cur.read_word()
            } else {
                ""
            };
            self.cur.skip_inline_whitespace();
            self.cur.eat(b'!');
            self.cur.skip_inline_whitespace();
            let annotation = if self.cur.eat(b':') {
                self.cur.skip_trivia();
                Some(strip_comments(self.cur.scan_type(&[b'=', b','], Context::TopLevel)))
            } else {
                None
            };
            self.cur.skip_inline_whitespace();
            let initializer = if self.cur.peek() == Some(b'=') {
                self.cur.advance(1);
                self.cur.skip_trivia();
                Some(self.cur.scan_expression(&[b','], Context::TopLevel))
            } else {
                None
            };

            let decl_mods = Modifiers {
                start: if first { mods.start } else { declarator_start },
                ..mods
            };
            let leading = comments.take().unwrap_or_default();
            match pattern {
                Some(pattern) => {
                    let mut leading = Some(leading);
                    let bindings = pattern_bindings(pattern);
                    // Each binding spans from its name to the next one; the first also
                    // covers the keyword and the last the initializer
                    let starts: Vec<usize> = bindings
                        .iter()
                        .enumerate()
                        .map(|(i, (offset, _))| match i {
                            0 => decl_mods.start,
                            _ => declarator_start + offset,
                        })
                        .collect();
                    for (i, (_, binding)) in bindings.into_iter().enumerate() {
                        let detail = DeclarationDetail::Variable {
                            keyword,
                            type_annotation: "unknown".to_string(),
                        };
                        let mut decl = self.declaration(
                            binding,
                            detail,
                            &decl_mods,
                            leading.take().unwrap_or_default(),
                        );
                        decl.start = starts[i];
                        if let Some(&next) = starts.get(i + 1) {
                            decl.end = next;
                        }
                        out.push(decl);
                    }
                }
                None => {
                    let type_annotation = match (annotation, initializer) {
                        (Some(annotation), _) if !annotation.trim().is_empty() => {
                            annotation.trim().to_string()
                        }
                        (_, Some(init)) => infer_type(init, mode),
                        _ => "any".to_string(),
                    };
                    let detail = DeclarationDetail::Variable {
                        keyword,
                        type_annotation,
                    };
                    out.push(self.declaration(name, detail, &decl_mods, leading));
                }
            }
            first = false;
            if !self.cur.eat(b',') {
                break;
            }
        }
        self.cur.eat(b';');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{scan, ScanOptions};

    fn texts(source: &str) -> Vec<String> {
        scan(source, "v.ts", ScanOptions::default())
            .into_iter()
            .map(|d| d.text)
            .collect()
    }

    #[test]
    fn test_const_narrows_let_widens() {
        assert_eq!(
            texts("export const a = 'x', b = 2\nexport let c = 'y'\nexport var d = true;\n"),
            vec![
                "export declare const a: 'x';",
                "export declare const b: 2;",
                "export declare let c: string;",
                "export declare var d: boolean;",
            ]
        );
    }

    #[test]
    fn test_annotation_wins_over_initializer() {
        assert_eq!(
            texts("export const m: Map<string, number[]> = new Map()"),
            vec!["export declare const m: Map<string, number[]>;"]
        );
    }

    #[test]
    fn test_uninitialized_and_unknown() {
        assert_eq!(
            texts("export let later\nexport const v = compute()\n"),
            vec!["export declare let later: any;", "export declare const v: unknown;"]
        );
    }

    #[test]
    fn test_destructured_exports() {
        assert_eq!(
            texts("export const { a, b: renamed, ...others } = source, [first] = list\n"),
            vec![
                "export declare const a: unknown;",
                "export declare const renamed: unknown;",
                "export declare const others: unknown;",
                "export declare const first: unknown;",
            ]
        );
    }

    #[test]
    fn test_arrow_function_initializer() {
        assert_eq!(
            texts("export const add = (a: number, b: number): number => a + b\n"),
            vec!["export declare const add: (a: number, b: number) => number;"]
        );
    }

    #[test]
    fn test_multiline_initializer_ends_at_next_statement() {
        let source = "export const cfg = {\n  port: 80,\n  host: 'h'\n}\nexport const other = 1\n";
        assert_eq!(
            texts(source),
            vec![
                "export declare const cfg: { port: number; host: string };",
                "export declare const other: 1;",
            ]
        );
    }

    #[test]
    fn test_pattern_bindings() {
        let pattern = "{ a = 1, b: { c }, d: [e, f = 2], ...g }";
        let bindings = pattern_bindings(pattern);
        let names: Vec<&str> = bindings.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "e", "f", "g"]);
        for (offset, name) in &bindings {
            assert_eq!(&pattern[*offset..*offset + name.len()], name);
        }
    }

    #[test]
    fn test_destructured_bindings_get_distinct_spans() {
        let source = "export const { a, b } = obj\nexport const [x, { y }] = pair, z = 1\n";
        let decls = scan(source, "v.ts", ScanOptions::default());
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "x", "y", "z"]);
        assert_eq!((decls[0].start, decls[0].end), (0, 18));
        assert_eq!(&source[decls[1].start..decls[1].end], "b } = obj");
        for pair in decls.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{} overlaps {}", pair[0].name, pair[1].name);
        }
        for decl in &decls {
            assert!(decl.start < decl.end);
        }
    }

    #[test]
    fn test_deep_destructuring_is_bounded() {
        let depth = MAX_BINDING_DEPTH * 300;
        let source = format!(
            "export const {}a{} = y\nexport const after = 1\n",
            "[".repeat(depth),
            "]".repeat(depth)
        );
        assert_eq!(texts(&source), vec!["export declare const after: 1;"]);
    }
}

//! @dose
//! purpose: Turns the raw records of one scope into its public declaration list. Overloads
//!     are collapsed, every record is rendered, and the scope's visibility rule decides
//!     which records survive. Non-exported types survive when the public text mentions
//!     them, directly or through another promoted type, found by iterating to a fixed point.
//!
//! when-editing:
//!     - !Rendering happens before promotion; promotion matches against rendered text
//!     - !Only type-like records and namespaces are promoted by reference. Non-exported
//!       functions and variables are public only through a local export list
//!     - Name patterns are compiled once per name and shared through PatternCache
//!
//! invariants:
//!     - The output is ordered by source offset
//!     - Ambient scopes keep every record
//!
//! gotchas:
//!     - A reference is a whole-word match; `$` and `_` count as word characters
//!     - The pattern lock is held only to fetch a compiled pattern, never while matching
//!
//! flows:
//!     - finalize: collapse_overloads -> render -> partition -> promote_local_exports
//!       -> resolve_referenced_types -> sort

use std::sync::{Mutex, PoisonError};

use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::cache::LruMap;
use crate::emit::{render, RenderContext};
use crate::scanner::lexical::strip_comments;
use crate::types::{Declaration, DeclarationDetail, DeclarationKind};

/// Default number of compiled name patterns kept
pub const DEFAULT_PATTERN_CAPACITY: usize = 1024;

/// The visibility rule applied to a list of records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A source module: exports and what they reference
    TopLevel,
    /// A non-ambient namespace body: same rule as a module, rendered nested
    Namespace,
    /// `declare namespace`, `declare module "x"` and `declare global` bodies: everything
    Ambient,
}

/// Compiled whole-word patterns, keyed by declaration name
#[derive(Debug)]
pub struct PatternCache {
    patterns: LruMap<String, Regex>,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_CAPACITY)
    }
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            patterns: LruMap::new(capacity),
        }
    }

    /// The whole-word pattern for `name`, compiling it on first use
    pub fn pattern(&mut self, name: &str) -> Option<Regex> {
        if let Some(pattern) = self.patterns.get(name) {
            return Some(pattern.clone());
        }
        let pattern = Regex::new(&format!(
            r"(?:^|[^A-Za-z0-9_$]){}(?:$|[^A-Za-z0-9_$])",
            regex::escape(name)
        ))
        .ok()?;
        self.patterns.insert(name.to_string(), pattern.clone());
        Some(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Resolve the records of one scope into its rendered public declarations
pub fn finalize(
    mut items: Vec<Declaration>,
    patterns: &Mutex<PatternCache>,
    scope: Scope,
) -> Vec<Declaration> {
    collapse_overloads(
        &mut items,
        |decl: &Declaration| match decl.detail {
            DeclarationDetail::Function(_) => Some(decl.name.clone()),
            _ => None,
        },
        Declaration::has_body,
    );

    let ctx = match scope {
        Scope::TopLevel => RenderContext::top_level(),
        Scope::Namespace | Scope::Ambient => RenderContext::nested(),
    };
    for decl in &mut items {
        if !matches!(decl.kind(), DeclarationKind::Import | DeclarationKind::Export) {
            decl.text = render(decl, ctx);
        }
    }

    if scope == Scope::Ambient {
        items.sort_by_key(|decl| decl.start);
        return items;
    }

    let (mut kept, candidates): (Vec<_>, Vec<_>) = items.into_iter().partition(is_public);
    let candidates = promote_local_exports(&mut kept, candidates);
    resolve_referenced_types(&mut kept, candidates, patterns);
    kept.sort_by_key(|decl| decl.start);
    kept
}

/// Records that are public on their own
fn is_public(decl: &Declaration) -> bool {
    match &decl.detail {
        DeclarationDetail::Import { .. } | DeclarationDetail::Export { .. } => true,
        DeclarationDetail::Module {
            source, is_global, ..
        } if *is_global || source.is_some() => true,
        _ => decl.is_exported || decl.is_default,
    }
}

/// Drop implementations that have bodyless overload signatures with the same key
pub(crate) fn collapse_overloads<T>(
    items: &mut Vec<T>,
    key: impl Fn(&T) -> Option<String>,
    has_body: impl Fn(&T) -> bool,
) {
    let signatures: FxHashSet<String> = items
        .iter()
        .filter(|item| !has_body(*item))
        .filter_map(&key)
        .collect();
    if signatures.is_empty() {
        return;
    }
    items.retain(|item| !(has_body(item) && key(item).is_some_and(|k| signatures.contains(&k))));
}

/// Move candidates named by a source-less export list (`export { a }`, `export default a`,
/// `export = a`) into `kept`; returns the remaining candidates
fn promote_local_exports(
    kept: &mut Vec<Declaration>,
    candidates: Vec<Declaration>,
) -> Vec<Declaration> {
    let locals: FxHashSet<&str> = kept
        .iter()
        .filter_map(|decl| match &decl.detail {
            DeclarationDetail::Export {
                source: None,
                specifiers,
            } => Some(specifiers),
            _ => None,
        })
        .flatten()
        .map(|spec| spec.local.as_str())
        .collect();
    if locals.is_empty() {
        return candidates;
    }
    let (promoted, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|decl| locals.contains(decl.name.as_str()));
    kept.extend(promoted);
    rest
}

fn is_type_candidate(decl: &Declaration) -> bool {
    decl.is_type_like() || decl.kind() == DeclarationKind::Module
}

/// Promote candidates referenced by the kept text, repeating until nothing new is found
fn resolve_referenced_types(
    kept: &mut Vec<Declaration>,
    candidates: Vec<Declaration>,
    patterns: &Mutex<PatternCache>,
) {
    let mut candidates: Vec<Declaration> = candidates.into_iter().filter(is_type_candidate).collect();
    let mut frontier: Vec<String> = kept
        .iter()
        .filter(|decl| decl.kind() != DeclarationKind::Import)
        .map(|decl| strip_comments(&decl.text))
        .collect();
    let mut rounds = 0usize;
    while !frontier.is_empty() && !candidates.is_empty() {
        rounds += 1;
        let (found, rest): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|candidate| {
            let pattern = patterns
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pattern(&candidate.name);
            pattern.is_some_and(|re| frontier.iter().any(|text| re.is_match(text)))
        });
        candidates = rest;
        frontier = found.iter().map(|decl| strip_comments(&decl.text)).collect();
        kept.extend(found);
    }
    trace!(rounds, unreferenced = candidates.len(), "referenced types resolved");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{scan, ScanOptions};

    fn names(source: &str) -> Vec<String> {
        scan(source, "r.ts", ScanOptions::default())
            .into_iter()
            .map(|d| d.name)
            .collect()
    }

    #[test]
    fn test_pattern_matches_whole_words_only() {
        let mut cache = PatternCache::new(8);
        let re = cache.pattern("Widget").expect("pattern");
        assert!(re.is_match("x: Widget"));
        assert!(re.is_match("Array<Widget>"));
        assert!(re.is_match("Widget"));
        assert!(!re.is_match("x: WidgetProps"));
        assert!(!re.is_match("x: $Widget"));
        assert!(!re.is_match("x: My_Widget"));
        let dollar = cache.pattern("$state").expect("pattern");
        assert!(dollar.is_match("get(): $state;"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_pattern_cache_is_bounded() {
        let mut cache = PatternCache::new(2);
        for name in ["A", "B", "C"] {
            cache.pattern(name);
        }
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_transitive_references_reach_a_fixed_point() {
        let source = "interface C { v: number }
interface B { c: C }
type A = { b: B }
interface Unrelated { z: string }
export function make(): A { return null! }
";
        assert_eq!(names(source), vec!["C", "B", "A", "make"]);
    }

    #[test]
    fn test_local_export_list_promotes_values() {
        let source = "function helper(x: Opts): void {}
const VERSION = '1'
interface Opts { a: 1 }
let unused = 2
export { helper, VERSION as version }
";
        let decls = scan(source, "r.ts", ScanOptions::default());
        let texts: Vec<&str> = decls.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "declare function helper(x: Opts): void;",
                "declare const VERSION: '1';",
                "declare interface Opts {\n  a: 1\n}",
                "export { helper, VERSION as version };",
            ]
        );
    }

    #[test]
    fn test_default_identifier_export_promotes_class() {
        let source = "class Service { run(): void {} }\nexport default Service\n";
        assert_eq!(names(source), vec!["Service", "default"]);
    }

    #[test]
    fn test_values_are_not_promoted_by_reference() {
        let source = "const limit = 3\nexport type T = typeof limit\n";
        assert_eq!(names(source), vec!["T"]);
    }

    #[test]
    fn test_collapse_overloads_is_keyed() {
        let mut items = vec![("f", false), ("f", true), ("g", true), ("h", false)];
        collapse_overloads(&mut items, |i| Some(i.0.to_string()), |i| i.1);
        assert_eq!(items, vec![("f", false), ("g", true), ("h", false)]);
    }

    #[test]
    fn test_poisoned_pattern_lock_is_recovered() {
        let patterns = Mutex::new(PatternCache::default());
        let _ = std::panic::catch_unwind(|| {
            let _guard = patterns.lock().expect("lock");
            panic!("poison");
        });
        assert!(patterns.is_poisoned());
        let decls = crate::scanner::scan_with(
            "interface I {}\nexport const x: I = {}\n",
            "p.ts",
            ScanOptions::default(),
            &patterns,
        );
        assert_eq!(decls.len(), 2);
    }
}

//! @dose
//! purpose: This is the library crate root for dtscan, exposing the public API for use as both
//!     a CLI tool and a library. dtscan turns TypeScript source text into its declaration-only
//!     surface (.d.ts text) with a single forward string scan; no AST is built.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - !Re-exports should include commonly used types and functions
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - The public API surface is stable - all re-exported items are public contract
//!     - scan() and Extractor::extract() never fail; only file and config edges return errors
//!
//! do-not:
//!     - Never expose scanner internals beyond the cursor-level modules already public
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main
//!     - Caches are owned by Extractor values, never process-wide

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod emit;
pub mod error;
pub mod exclusion;
pub mod extract;
pub mod limits;
pub mod logging;
pub mod resolve;
pub mod scanner;
pub mod types;

// Re-export main types for convenience
pub use cache::{fingerprint, CacheStats, DeclarationCache, LruMap};
pub use cli::{Cli, Commands, ScanArgs, WatchArgs};
pub use config::Config;
pub use emit::{infer_type, render, InferMode, RenderContext};
pub use error::DtsError;
pub use extract::{Extractor, SourceFile};
pub use resolve::{PatternCache, Scope};
pub use scanner::{scan, scan_with, ScanOptions};
pub use types::{
    Access, ClassMember, Declaration, DeclarationDetail, DeclarationKind, EnumMember,
    ExportSpecifier, FunctionSignature, MemberKind, Parameter, VariableKeyword,
};

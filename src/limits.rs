//! @dose
//! purpose: Centralized nesting limits. The scan is a forward pass, but template literals,
//!     namespace bodies, destructuring patterns and literal inference recurse.
//!
//! invariants:
//!     - Input past a limit degrades to an opaque span, never to stack exhaustion

/// Maximum nesting of template literals inside interpolations.
///
/// Past this depth an inner backtick is treated as an ordinary character of
/// the enclosing interpolation.
pub const MAX_TEMPLATE_DEPTH: usize = 64;

/// Maximum nesting of namespace/module bodies.
///
/// Deeper bodies are skipped as balanced spans and contribute no members.
pub const MAX_MODULE_DEPTH: usize = 32;

/// Maximum nesting of destructuring patterns in bindings and parameters.
///
/// Deeper patterns introduce no bindings and keep their raw text.
pub const MAX_BINDING_DEPTH: usize = 64;

/// Maximum nesting of object/array literals considered by type inference.
///
/// Deeper values infer as `unknown`.
pub const MAX_INFERENCE_DEPTH: usize = 16;

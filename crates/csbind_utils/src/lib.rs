//! Shared plumbing for the csbind crates: source spans, diagnostics,
//! name suggestions and logging setup.

pub mod errors;
pub mod logger;
pub mod span;
pub mod suggest;

pub use errors::{Diagnostic, emit_diagnostic, emit_diagnostics};
pub use span::Span;
pub use suggest::find_best_match;

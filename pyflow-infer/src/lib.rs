//! pyflow type inference
//!
//! Whole-program, flow-sensitive type inference over pyflow syntax trees.
//! The engine walks every module, builds lexical and attribute scopes, and
//! assigns an approximate [`Type`] to each expression and binding. Types are
//! merged with a join instead of unified, so contradictions degrade to
//! `Unknown` plus a diagnostic rather than failing the run.
//!
//! Function bodies are analyzed lazily, once per distinct tuple of argument
//! types, and cached in per-function memo tables.

pub mod binding;
pub mod builtins;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod function;
pub mod loader;
pub mod printer;
pub mod scope;
pub mod stats;
pub mod store;
pub mod types;
mod visitor;

// Re-export core types
pub use binding::{Binding, BindingId, BindingKind, Origin};
pub use builtins::{BuiltinCatalog, CatalogBuilder, StandardBuiltins};
pub use config::AnalyzerOptions;
pub use diagnostics::{Diagnostic, DiagnosticSink, Problem, Severity};
pub use engine::{AnalysisResults, Engine};
pub use error::{AnalysisError, Result};
pub use function::{Arrows, BuiltinReturn};
pub use loader::{FsLoader, MemoryLoader, ModuleLoader, ModuleSource};
pub use printer::TypePrinter;
pub use stats::Statistics;
pub use types::{ClassId, FunctionId, ModuleId, Type};

//! Semantic diagnostics
//!
//! Problems found during inference never stop the run. Each one is recorded
//! against the file of the offending node and inference continues with
//! `Unknown` in place of the failed result.

use pyflow_ast::{FileId, Span};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Semantic problems found while inferring types
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Problem {
    #[error("unbound variable {name}")]
    UnboundVariable { name: String },

    #[error("attribute not found in type: {ty}.")]
    AttributeNotFound { ty: String },

    #[error("ValueError: need more than {found} values to unpack")]
    NeedMoreValues { found: usize },

    #[error("ValueError: too many values to unpack")]
    TooManyValues,

    #[error("unpacking non-iterable: {ty}")]
    UnpackNonIterable { ty: String },

    #[error("not an iterable type: {ty}")]
    NotIterable { ty: String },

    #[error("Function doesn't always return a value")]
    FunctionMayNotReturn,

    #[error("Call doesn't always return a value")]
    CallMayNotReturn,

    #[error("unable to bind argument: {name}")]
    UnboundArgument { name: String },

    #[error("calling non-function and non-class: {ty}")]
    NotCallable { ty: String },

    #[error("Possible KeyError (wrong type for subscript)")]
    PossibleKeyError,

    #[error("The type can't be sliced: {ty}")]
    NotSliceable { ty: String },

    #[error("invalid location for assignment")]
    InvalidAssignmentTarget,

    #[error("Can't set attribute for UnknownType")]
    SetAttributeOnUnknown,

    #[error("Cannot load module {name}.")]
    CannotLoadModule { name: String },

    #[error("{name} is not a class")]
    NotAClass { name: String },

    #[error("Unused variable: {name}")]
    UnusedVariable { name: String },

    #[error("Failed to parse {path}: {message}")]
    ParseFailure { path: String, message: String },
}

impl Problem {
    pub fn severity(&self) -> Severity {
        match self {
            Problem::NeedMoreValues { .. }
            | Problem::TooManyValues
            | Problem::InvalidAssignmentTarget
            | Problem::ParseFailure { .. } => Severity::Error,
            Problem::UnusedVariable { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// A problem at a location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub problem: Problem,
}

impl Diagnostic {
    pub fn new(span: Span, problem: Problem) -> Self {
        Self {
            severity: problem.severity(),
            span,
            problem,
        }
    }

    pub fn message(&self) -> String {
        self.problem.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}: {}: {}", self.span.start.0, self.span.end.0, self.severity, self.problem)
    }
}

/// Per-file diagnostic collector.
///
/// Identical reports (same span and problem) are kept once, since a body
/// may be walked for several argument shapes.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    by_file: BTreeMap<FileId, Vec<Diagnostic>>,
    seen: HashSet<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem; returns false if it was already reported
    pub fn report(&mut self, span: Span, problem: Problem) -> bool {
        let diagnostic = Diagnostic::new(span, problem);
        if !self.seen.insert(diagnostic.clone()) {
            return false;
        }
        self.by_file.entry(span.file_id).or_default().push(diagnostic);
        true
    }

    pub fn for_file(&self, file: FileId) -> &[Diagnostic] {
        self.by_file.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, &Diagnostic)> {
        self.by_file
            .iter()
            .flat_map(|(file, diags)| diags.iter().map(move |d| (*file, d)))
    }

    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.by_file.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.seen.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.seen.iter().filter(|d| d.severity == severity).count()
    }
}

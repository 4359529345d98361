//! AST Builder API for pyflow
//!
//! This crate provides a compact API for programmatically constructing
//! syntax trees without a parser. Node ids and spans are allocated in
//! construction order, so every node built by one [`AstBuilder`] has a
//! distinct [`NodeId`] within its file.
//!
//! Builders take `&self`, which lets calls nest naturally:
//!
//! ```
//! use pyflow_builder::AstBuilder;
//! use pyflow_ast::FileId;
//!
//! let b = AstBuilder::new(FileId::new(0));
//! let module = b
//!     .module("main")
//!     .stmt(b.assign(b.name("x"), b.int(42)))
//!     .build();
//! assert_eq!(module.body.len(), 1);
//! ```

use pyflow_ast::ast::*;
use pyflow_ast::{ByteOffset, FileId, NodeId, Span};
use std::cell::Cell;

pub mod builder;
pub mod expr_builder;

/// Main AST builder context
pub struct AstBuilder {
    file_id: FileId,
    next_id: Cell<u32>,
    current_offset: Cell<u32>,
}

impl AstBuilder {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            next_id: Cell::new(0),
            current_offset: Cell::new(0),
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Allocate the next node id
    pub fn id(&self) -> NodeId {
        let index = self.next_id.get();
        self.next_id.set(index + 1);
        NodeId::new(self.file_id, index)
    }

    /// Create a span for the current position
    pub fn span(&self) -> Span {
        self.span_with_len(1)
    }

    /// Create a span with specific length
    pub fn span_with_len(&self, len: u32) -> Span {
        let start = self.current_offset.get();
        self.current_offset.set(start + len);
        Span::new(self.file_id, ByteOffset::new(start), ByteOffset::new(start + len))
    }

    /// Create a new module builder
    pub fn module(&self, name: &str) -> ModuleBuilder<'_> {
        ModuleBuilder::new(self, name)
    }
}

/// Module builder
pub struct ModuleBuilder<'a> {
    builder: &'a AstBuilder,
    id: NodeId,
    name: String,
    path: Option<String>,
    body: Vec<Stmt>,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(builder: &'a AstBuilder, name: &str) -> Self {
        Self {
            id: builder.id(),
            builder,
            name: name.to_string(),
            path: None,
            body: Vec::new(),
        }
    }

    /// Record the source path of the module
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Append a statement
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }

    /// Append several statements
    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.body.extend(stmts);
        self
    }

    pub fn build(self) -> Module {
        let span = self.builder.span();
        Module {
            id: self.id,
            name: self.name,
            path: self.path,
            body: self.body,
            span,
        }
    }
}

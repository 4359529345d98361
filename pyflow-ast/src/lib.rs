//! pyflow syntax tree
//!
//! This crate defines the tree the inference engine consumes: statement and
//! expression nodes with stable identities, source spans, interned names, and
//! the JSON codec used to hand trees from an external parser to the engine.

pub mod ast;
pub mod error;
pub mod json;
pub mod span;
pub mod symbol;

// Re-export core types
pub use ast::*;
pub use crate::span::{ByteOffset, FileId, NodeId, Span};
pub use crate::symbol::{names, Symbol};
pub use error::{ParseError, Result};
pub use json::{decode_module, encode_module};

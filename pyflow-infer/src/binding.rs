//! Bindings: typed, referenced associations between a name and a syntax node

use crate::types::Type;
use pyflow_ast::{NodeId, Span, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Binding identifier (index into the binding roster)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    Attribute,
    Class,
    Constructor,
    Function,
    Method,
    Module,
    Parameter,
    Scope,
    Variable,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingKind::Attribute => "ATTRIBUTE",
            BindingKind::Class => "CLASS",
            BindingKind::Constructor => "CONSTRUCTOR",
            BindingKind::Function => "FUNCTION",
            BindingKind::Method => "METHOD",
            BindingKind::Module => "MODULE",
            BindingKind::Parameter => "PARAMETER",
            BindingKind::Scope => "SCOPE",
            BindingKind::Variable => "VARIABLE",
        };
        f.write_str(name)
    }
}

/// Where a binding's node comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// A source file, by path
    File(String),
    /// A synthetic location such as the builtins catalog
    Url(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => f.write_str(path),
            Origin::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: Symbol,
    pub node: NodeId,
    pub span: Span,
    pub kind: BindingKind,
    pub ty: Type,
    pub qname: String,
    pub origin: Origin,
    pub refs: BTreeSet<NodeId>,
    pub synthetic: bool,
    pub builtin: bool,
    pub is_static: bool,
}

impl Binding {
    pub fn new(name: Symbol, node: NodeId, span: Span, ty: Type, kind: BindingKind, origin: Origin) -> Self {
        Self {
            name,
            node,
            span,
            kind,
            ty,
            qname: name.as_str().to_string(),
            builtin: matches!(origin, Origin::Url(_)),
            origin,
            refs: BTreeSet::new(),
            synthetic: false,
            is_static: false,
        }
    }

    /// Join a newly observed type into this binding
    pub fn add_type(&mut self, ty: &Type) {
        self.ty = self.ty.join(ty);
    }

    pub fn add_reference(&mut self, node: NodeId) {
        self.refs.insert(node);
    }

    pub fn is_referenced(&self) -> bool {
        !self.refs.is_empty()
    }
}

// Identity is the defining node plus its origin, so catalog and source
// bindings never compare equal.
impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.origin == other.origin
    }
}

impl Eq for Binding {}

impl Hash for Binding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
        self.origin.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::FileId;

    fn binding(index: u32, origin: Origin) -> Binding {
        Binding::new(
            Symbol::intern("x"),
            NodeId::new(FileId::new(0), index),
            Span::default(),
            Type::Int,
            BindingKind::Variable,
            origin,
        )
    }

    #[test]
    fn test_add_type_joins() {
        let mut b = binding(1, Origin::File("a.json".into()));
        b.add_type(&Type::Str);
        assert!(b.ty.contains(&Type::Int));
        assert!(b.ty.contains(&Type::Str));
    }

    #[test]
    fn test_identity_is_node_and_origin() {
        let a = binding(1, Origin::File("a.json".into()));
        let mut same = binding(1, Origin::File("a.json".into()));
        same.ty = Type::Str;
        let other_file = binding(1, Origin::Url("builtin:".into()));
        let other_node = binding(2, Origin::File("a.json".into()));

        assert_eq!(a, same);
        assert_ne!(a, other_file);
        assert_ne!(a, other_node);
        assert!(other_file.builtin);
    }

    #[test]
    fn test_references() {
        let mut b = binding(1, Origin::File("a.json".into()));
        assert!(!b.is_referenced());
        b.add_reference(NodeId::new(FileId::new(0), 9));
        b.add_reference(NodeId::new(FileId::new(0), 9));
        assert_eq!(b.refs.len(), 1);
        assert_eq!(BindingKind::Parameter.to_string(), "PARAMETER");
    }
}

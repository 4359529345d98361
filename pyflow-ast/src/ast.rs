//! Syntax tree definitions for the analyzed language
//!
//! The tree is produced by an external parser (or decoded from its serialized
//! form, see [`crate::json`]) and is consumed read-only by the analyzer. Every
//! node carries a [`NodeId`] and a [`Span`]; ids are the keys of the export
//! map, so they must be unique within a file.
//!
//! Function, class and lambda nodes are reference-counted: the analyzer keeps
//! their bodies alive and walks them lazily, on first application.

use crate::span::{NodeId, Span};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub id: NodeId,
    /// Dotted module name (e.g. `pkg.util`)
    pub name: String,
    /// Source path the tree was parsed from, if any
    #[serde(default)]
    pub path: Option<String>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

/// A name occurrence that is not an expression (def/class names, parameters, aliases)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default)]
    pub id: NodeId,
    pub name: Symbol,
    #[serde(default)]
    pub span: Span,
}

/// Dotted name in imports: `a.b.c`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DottedName {
    pub parts: Vec<Identifier>,
}

impl DottedName {
    pub fn to_dotted(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn span(&self) -> Span {
        match (self.parts.first(), self.parts.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::default(),
        }
    }
}

/// `name [as asname]` in an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub name: DottedName,
    #[serde(default)]
    pub asname: Option<Identifier>,
}

/// Function definition: `def name(params): body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    #[serde(default)]
    pub id: NodeId,
    pub name: Identifier,
    #[serde(default)]
    pub params: Parameters,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub decorators: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// Anonymous function: `lambda params: body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub params: Parameters,
    pub body: Expr,
    #[serde(default)]
    pub span: Span,
}

/// Class definition: `class Name(bases): body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub id: NodeId,
    pub name: Identifier,
    #[serde(default)]
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub decorators: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// Formal parameter list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub args: Vec<Param>,
    /// `*args`
    #[serde(default)]
    pub vararg: Option<Identifier>,
    /// `**kwargs`
    #[serde(default)]
    pub kwarg: Option<Identifier>,
}

impl Parameters {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Identifier,
    #[serde(default)]
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: Identifier,
    pub value: Expr,
}

/// One `for target in iter if cond` clause of a comprehension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    #[serde(default)]
    pub ifs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    #[serde(default)]
    pub id: NodeId,
    /// Exception class expression, `None` for a bare `except:`
    #[serde(default)]
    pub exception: Option<Expr>,
    #[serde(default)]
    pub name: Option<Expr>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithItem {
    pub context: Expr,
    #[serde(default)]
    pub target: Option<Expr>,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    /// Expression statement
    Expr {
        #[serde(default)]
        id: NodeId,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    /// `a = b = value`
    Assign {
        #[serde(default)]
        id: NodeId,
        targets: Vec<Expr>,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    /// `target op= value`
    AugAssign {
        #[serde(default)]
        id: NodeId,
        target: Expr,
        op: Operator,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    FunctionDef(Rc<FunctionDef>),
    ClassDef(Rc<ClassDef>),
    Return {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    If {
        #[serde(default)]
        id: NodeId,
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    While {
        #[serde(default)]
        id: NodeId,
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    For {
        #[serde(default)]
        id: NodeId,
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    Try {
        #[serde(default)]
        id: NodeId,
        body: Vec<Stmt>,
        #[serde(default)]
        handlers: Vec<ExceptHandler>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        finalbody: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    With {
        #[serde(default)]
        id: NodeId,
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    Raise {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        exc: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    Break {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    Continue {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    Pass {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    Global {
        #[serde(default)]
        id: NodeId,
        names: Vec<Identifier>,
        #[serde(default)]
        span: Span,
    },
    Nonlocal {
        #[serde(default)]
        id: NodeId,
        names: Vec<Identifier>,
        #[serde(default)]
        span: Span,
    },
    Delete {
        #[serde(default)]
        id: NodeId,
        targets: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// `import a.b as c, d`
    Import {
        #[serde(default)]
        id: NodeId,
        names: Vec<Alias>,
        #[serde(default)]
        span: Span,
    },
    /// `from module import names` or `from module import *` (empty `names`)
    ImportFrom {
        #[serde(default)]
        id: NodeId,
        module: DottedName,
        #[serde(default)]
        names: Vec<Alias>,
        #[serde(default)]
        wildcard: bool,
        #[serde(default)]
        span: Span,
    },
    Assert {
        #[serde(default)]
        id: NodeId,
        test: Expr,
        #[serde(default)]
        msg: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::FunctionDef(def) => def.id,
            Stmt::ClassDef(def) => def.id,
            Stmt::Expr { id, .. }
            | Stmt::Assign { id, .. }
            | Stmt::AugAssign { id, .. }
            | Stmt::Return { id, .. }
            | Stmt::If { id, .. }
            | Stmt::While { id, .. }
            | Stmt::For { id, .. }
            | Stmt::Try { id, .. }
            | Stmt::With { id, .. }
            | Stmt::Raise { id, .. }
            | Stmt::Break { id, .. }
            | Stmt::Continue { id, .. }
            | Stmt::Pass { id, .. }
            | Stmt::Global { id, .. }
            | Stmt::Nonlocal { id, .. }
            | Stmt::Delete { id, .. }
            | Stmt::Import { id, .. }
            | Stmt::ImportFrom { id, .. }
            | Stmt::Assert { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Stmt::FunctionDef(def) => def.span,
            Stmt::ClassDef(def) => def.span,
            Stmt::Expr { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::AugAssign { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::With { span, .. }
            | Stmt::Raise { span, .. }
            | Stmt::Break { span, .. }
            | Stmt::Continue { span, .. }
            | Stmt::Pass { span, .. }
            | Stmt::Global { span, .. }
            | Stmt::Nonlocal { span, .. }
            | Stmt::Delete { span, .. }
            | Stmt::Import { span, .. }
            | Stmt::ImportFrom { span, .. }
            | Stmt::Assert { span, .. } => *span,
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    /// Variable reference: `x`
    Name {
        #[serde(default)]
        id: NodeId,
        name: Symbol,
        #[serde(default)]
        span: Span,
    },
    /// Literal value: `42`, `"hello"`, `None`
    Literal {
        #[serde(default)]
        id: NodeId,
        value: Literal,
        #[serde(default)]
        span: Span,
    },
    List {
        #[serde(default)]
        id: NodeId,
        elts: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    Tuple {
        #[serde(default)]
        id: NodeId,
        elts: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    Set {
        #[serde(default)]
        id: NodeId,
        elts: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    Dict {
        #[serde(default)]
        id: NodeId,
        keys: Vec<Expr>,
        values: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// Binary operation, including comparisons and `and`/`or`
    BinOp {
        #[serde(default)]
        id: NodeId,
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    UnaryOp {
        #[serde(default)]
        id: NodeId,
        op: UnaryOperator,
        operand: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// Call: `f(a, b, k=v, *rest, **kw)`
    Call {
        #[serde(default)]
        id: NodeId,
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        keywords: Vec<Keyword>,
        #[serde(default)]
        starargs: Option<Box<Expr>>,
        #[serde(default)]
        kwargs: Option<Box<Expr>>,
        #[serde(default)]
        span: Span,
    },
    /// Attribute access: `value.attr`
    Attribute {
        #[serde(default)]
        id: NodeId,
        value: Box<Expr>,
        attr: Identifier,
        #[serde(default)]
        span: Span,
    },
    /// Subscript: `value[slice]`
    Subscript {
        #[serde(default)]
        id: NodeId,
        value: Box<Expr>,
        slice: Box<Slice>,
        #[serde(default)]
        span: Span,
    },
    Lambda(Rc<Lambda>),
    /// Conditional expression: `body if test else orelse`
    IfExp {
        #[serde(default)]
        id: NodeId,
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    ListComp {
        #[serde(default)]
        id: NodeId,
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
        #[serde(default)]
        span: Span,
    },
    SetComp {
        #[serde(default)]
        id: NodeId,
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
        #[serde(default)]
        span: Span,
    },
    DictComp {
        #[serde(default)]
        id: NodeId,
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
        #[serde(default)]
        span: Span,
    },
    GeneratorExp {
        #[serde(default)]
        id: NodeId,
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
        #[serde(default)]
        span: Span,
    },
    Yield {
        #[serde(default)]
        id: NodeId,
        #[serde(default)]
        value: Option<Box<Expr>>,
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Lambda(lambda) => lambda.id,
            Expr::Name { id, .. }
            | Expr::Literal { id, .. }
            | Expr::List { id, .. }
            | Expr::Tuple { id, .. }
            | Expr::Set { id, .. }
            | Expr::Dict { id, .. }
            | Expr::BinOp { id, .. }
            | Expr::UnaryOp { id, .. }
            | Expr::Call { id, .. }
            | Expr::Attribute { id, .. }
            | Expr::Subscript { id, .. }
            | Expr::IfExp { id, .. }
            | Expr::ListComp { id, .. }
            | Expr::SetComp { id, .. }
            | Expr::DictComp { id, .. }
            | Expr::GeneratorExp { id, .. }
            | Expr::Yield { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Lambda(lambda) => lambda.span,
            Expr::Name { span, .. }
            | Expr::Literal { span, .. }
            | Expr::List { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Set { span, .. }
            | Expr::Dict { span, .. }
            | Expr::BinOp { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::Call { span, .. }
            | Expr::Attribute { span, .. }
            | Expr::Subscript { span, .. }
            | Expr::IfExp { span, .. }
            | Expr::ListComp { span, .. }
            | Expr::SetComp { span, .. }
            | Expr::DictComp { span, .. }
            | Expr::GeneratorExp { span, .. }
            | Expr::Yield { span, .. } => *span,
        }
    }

    /// The name if this is a plain variable reference
    pub fn as_name(&self) -> Option<Symbol> {
        match self {
            Expr::Name { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// The string contents if this is a string literal
    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal {
                value: Literal::Str(s),
                ..
            } => Some(s),
            _ => None,
        }
    }
}

/// Subscript forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Slice {
    /// `x[i]`
    Index { value: Expr },
    /// `x[lower:upper:step]`
    Range {
        #[serde(default)]
        lower: Option<Expr>,
        #[serde(default)]
        upper: Option<Expr>,
        #[serde(default)]
        step: Option<Expr>,
    },
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Imaginary part of a complex literal: `2j`
    Complex(f64),
    Str(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl Operator {
    /// Comparison and boolean operators always produce a truth value
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            Operator::And
                | Operator::Or
                | Operator::Eq
                | Operator::NotEq
                | Operator::Lt
                | Operator::LtE
                | Operator::Gt
                | Operator::GtE
                | Operator::Is
                | Operator::IsNot
                | Operator::In
                | Operator::NotIn
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::FloorDiv => "//",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtE => "<=",
            Operator::Gt => ">",
            Operator::GtE => ">=",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Neg,
    Pos,
    Invert,
}

//! Function values and their memo tables

use crate::scope::ScopeId;
use crate::types::{ClassId, FunctionId, Type};
use pyflow_ast::{FunctionDef, Lambda, NodeId, Parameters, Span, Symbol};
use std::rc::Rc;

/// What running a function means
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// `def` statement; the body is walked on application
    Def(Rc<FunctionDef>),
    /// `lambda` expression
    Lambda(Rc<Lambda>),
    /// Catalog function with a declared result and no body
    Builtin(BuiltinReturn),
}

/// Declared result of a builtin function, possibly depending on the receiver or arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinReturn {
    Fixed(Type),
    /// The bound receiver itself (`list.copy`)
    Receiver,
    /// Element type of the receiver (`list.pop`), or the key type of a dict
    Element,
    /// `[T]` of the receiver's elements (`dict.keys`)
    ListOfElement,
    /// Value type of a dict receiver (`dict.get`)
    Value,
    /// `[V]` of a dict receiver (`dict.values`)
    ListOfValue,
    /// `[(K, V)]` of a dict receiver (`dict.items`)
    Items,
    /// Type of the first argument (`sorted` returns a list of the same shape)
    FirstArg,
    /// Element type of the first argument (`next`, `min`, `max`)
    ElementOfFirstArg,
}

impl BuiltinReturn {
    /// Resolve the declared result against an actual receiver and arguments
    pub fn resolve(&self, receiver: Option<&Type>, args: &[Type]) -> Type {
        let receiver = receiver.cloned().unwrap_or(Type::Unknown);
        match self {
            BuiltinReturn::Fixed(t) => t.clone(),
            BuiltinReturn::Receiver => receiver,
            BuiltinReturn::Element => receiver.element_type().unwrap_or(Type::Unknown),
            BuiltinReturn::ListOfElement => Type::list(receiver.element_type().unwrap_or(Type::Unknown)),
            BuiltinReturn::Value => dict_value(&receiver),
            BuiltinReturn::ListOfValue => Type::list(dict_value(&receiver)),
            BuiltinReturn::Items => match &receiver {
                Type::Dict(key, value) => Type::list(Type::tuple(vec![(**key).clone(), (**value).clone()])),
                _ => Type::list(Type::Unknown),
            },
            BuiltinReturn::FirstArg => args.first().cloned().unwrap_or(Type::Unknown),
            BuiltinReturn::ElementOfFirstArg => args
                .first()
                .and_then(|t| t.element_type())
                .unwrap_or(Type::Unknown),
        }
    }
}

fn dict_value(t: &Type) -> Type {
    match t {
        Type::Dict(_, value) => (**value).clone(),
        _ => Type::Unknown,
    }
}

/// A function value
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: Symbol,
    /// Defining node (the `def`/`lambda`, or a synthetic builtin node)
    pub node: NodeId,
    pub span: Span,
    pub qname: String,
    pub body: FunctionBody,
    /// Scope active at the definition; applications are parented here
    pub def_scope: ScopeId,
    /// Holds synthetic attributes such as `__self__` on bound methods
    pub attr_scope: ScopeId,
    /// Default value types, aligned with the formal parameters
    pub defaults: Vec<Option<Type>>,
    pub arrows: Arrows,
    /// Receiver of a bound method
    pub bound_self: Option<Type>,
    /// Class whose body defined this function
    pub owner: Option<ClassId>,
    /// Unbound function a bound copy was made from
    pub origin: Option<FunctionId>,
    pub is_static: bool,
    pub is_classmethod: bool,
}

impl FunctionData {
    pub fn params(&self) -> Option<&Parameters> {
        match &self.body {
            FunctionBody::Def(def) => Some(&def.params),
            FunctionBody::Lambda(lambda) => Some(&lambda.params),
            FunctionBody::Builtin(_) => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.body, FunctionBody::Builtin(_))
    }
}

/// Memo table from parameter tuples to inferred results ("arrows")
#[derive(Debug, Clone, Default)]
pub struct Arrows {
    entries: Vec<(Type, Type)>,
}

impl Arrows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup
    pub fn get(&self, from: &Type) -> Option<&Type> {
        self.entries.iter().find(|(k, _)| k == from).map(|(_, v)| v)
    }

    /// Record `from -> to`, joining into an existing arrow for the same tuple.
    ///
    /// Returns false when the table is full even after compression and the
    /// arrow was not cached.
    pub fn insert(&mut self, from: Type, to: Type, limit: usize) -> bool {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == from) {
            *existing = existing.join(&to);
            return true;
        }
        if self.entries.len() >= limit {
            self.compress();
        }
        if self.entries.len() >= limit {
            return false;
        }
        self.entries.push((from, to));
        true
    }

    /// Fold arrows whose parameter tuple is subsumed by another arrow's
    pub fn compress(&mut self) {
        let mut i = 0;
        while i < self.entries.len() {
            let subsumer = (0..self.entries.len())
                .find(|&j| j != i && subsumes(&self.entries[j].0, &self.entries[i].0));
            match subsumer {
                Some(j) => {
                    let (_, to) = self.entries.remove(i);
                    let j = if j > i { j - 1 } else { j };
                    let joined = self.entries[j].1.join(&to);
                    self.entries[j].1 = joined;
                }
                None => i += 1,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Type, Type)> {
        self.entries.iter()
    }

    /// Join of every recorded result
    pub fn return_type(&self) -> Type {
        Type::union_of(self.entries.iter().map(|(_, to)| to.clone()))
    }
}

/// `general` subsumes `specific` when every position is equal or unconstrained
fn subsumes(general: &Type, specific: &Type) -> bool {
    match (general, specific) {
        (Type::Tuple { elems: g, .. }, Type::Tuple { elems: s, .. }) => {
            g.len() == s.len()
                && g.iter()
                    .zip(s)
                    .all(|(a, b)| a == b || a.is_unknown() || a.is_none())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(types: &[Type]) -> Type {
        Type::tuple(types.to_vec())
    }

    #[test]
    fn test_exact_lookup_and_join() {
        let mut arrows = Arrows::new();
        assert!(arrows.insert(args(&[Type::Int]), Type::Int, 5));
        assert!(arrows.insert(args(&[Type::Str]), Type::Str, 5));
        assert_eq!(arrows.len(), 2);
        assert_eq!(arrows.get(&args(&[Type::Int])), Some(&Type::Int));

        arrows.insert(args(&[Type::Int]), Type::None, 5);
        assert_eq!(arrows.len(), 2);
        assert_eq!(arrows.get(&args(&[Type::Int])), Some(&Type::Int.join(&Type::None)));
    }

    #[test]
    fn test_limit_compresses_subsumed_arrows() {
        let mut arrows = Arrows::new();
        arrows.insert(args(&[Type::Unknown, Type::Int]), Type::Int, 2);
        arrows.insert(args(&[Type::Str, Type::Int]), Type::Str, 2);
        assert_eq!(arrows.len(), 2);

        // the (str, int) arrow folds into (?, int), leaving room
        assert!(arrows.insert(args(&[Type::Bool, Type::Bool]), Type::Bool, 2));
        assert_eq!(arrows.len(), 2);
        assert_eq!(
            arrows.get(&args(&[Type::Unknown, Type::Int])),
            Some(&Type::Int.join(&Type::Str))
        );
    }

    #[test]
    fn test_full_table_rejects_new_arrow() {
        let mut arrows = Arrows::new();
        arrows.insert(args(&[Type::Int]), Type::Int, 1);
        assert!(!arrows.insert(args(&[Type::Str]), Type::Str, 1));
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows.get(&args(&[Type::Str])), None);
    }

    #[test]
    fn test_builtin_return_resolution() {
        let list = Type::list(Type::Int);
        let dict = Type::dict(Type::Str, Type::Float);
        assert_eq!(BuiltinReturn::Element.resolve(Some(&list), &[]), Type::Int);
        assert_eq!(BuiltinReturn::Receiver.resolve(Some(&list), &[]), list);
        assert_eq!(BuiltinReturn::Value.resolve(Some(&dict), &[]), Type::Float);
        assert_eq!(
            BuiltinReturn::Items.resolve(Some(&dict), &[]),
            Type::list(Type::tuple(vec![Type::Str, Type::Float]))
        );
        assert_eq!(
            BuiltinReturn::ElementOfFirstArg.resolve(None, &[list.clone()]),
            Type::Int
        );
        assert_eq!(BuiltinReturn::Fixed(Type::Str).resolve(None, &[]), Type::Str);
    }
}

//! Type lattice for the inference engine
//!
//! This is not a sound type system. Types are abstract values that are merged
//! with [`Type::join`] wherever control flow meets:
//! - `Unknown` is the bottom element and is absorbed by every join
//! - `Union` values are flat, deduplicated ordered sets
//! - Function, class, instance and module values are identities into the
//!   engine's arenas, so types stay plain values that can key hash maps
//! - `Fallthrough` marks "control reaches the end of this statement normally"

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Function value identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

/// Class value identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Module value identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// Inferred types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// Nothing is known; bottom of the lattice
    Unknown,
    /// The `None` value
    None,
    /// Control reaches here without returning, raising or breaking
    Fallthrough,
    Bool,
    Int,
    Float,
    Complex,
    Str,
    /// Homogeneous list (also the approximation of generators)
    List(Box<Type>),
    Dict(Box<Type>, Box<Type>),
    Set(Box<Type>),
    /// Fixed-arity tuple, or `(T, ...)` when `variadic`
    Tuple { elems: Vec<Type>, variadic: bool },
    Function(FunctionId),
    Class(ClassId),
    Instance(ClassId),
    Module(ModuleId),
    /// Flattened union of at least two members
    Union(BTreeSet<Type>),
}

impl Type {
    pub fn list(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn set(elem: Type) -> Type {
        Type::Set(Box::new(elem))
    }

    pub fn dict(key: Type, value: Type) -> Type {
        Type::Dict(Box::new(key), Box::new(value))
    }

    pub fn tuple(elems: Vec<Type>) -> Type {
        Type::Tuple {
            elems,
            variadic: false,
        }
    }

    /// `(elem, ...)`
    pub fn variadic_tuple(elem: Type) -> Type {
        Type::Tuple {
            elems: vec![elem],
            variadic: true,
        }
    }

    /// Join two types into their least common approximation
    pub fn join(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Type::Unknown, t) | (t, Type::Unknown) => t.clone(),
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
            _ => {
                let mut members = BTreeSet::new();
                for member in self.members().chain(other.members()) {
                    insert_member(&mut members, member.clone());
                }
                Type::from_members(members)
            }
        }
    }

    /// Join every type of an iterator, starting from `Unknown`
    pub fn union_of<I>(types: I) -> Type
    where
        I: IntoIterator<Item = Type>,
    {
        types
            .into_iter()
            .fold(Type::Unknown, |acc, t| acc.join(&t))
    }

    fn from_members(mut members: BTreeSet<Type>) -> Type {
        match members.len() {
            0 => Type::Unknown,
            1 => members.pop_first().unwrap_or(Type::Unknown),
            _ => Type::Union(members),
        }
    }

    /// Union members, or the type itself when it is not a union
    pub fn members(&self) -> Box<dyn Iterator<Item = &Type> + '_> {
        match self {
            Type::Union(members) => Box::new(members.iter()),
            Type::Unknown => Box::new(std::iter::empty()),
            other => Box::new(std::iter::once(other)),
        }
    }

    /// Whether `member` is this type or one of its union members
    pub fn contains(&self, member: &Type) -> bool {
        match self {
            Type::Union(members) => members.contains(member),
            other => other == member,
        }
    }

    /// Subtract one member, e.g. the fallthrough marker once a block is known to return
    pub fn remove(&self, member: &Type) -> Type {
        match self {
            Type::Union(members) => {
                let rest: BTreeSet<Type> = members.iter().filter(|t| *t != member).cloned().collect();
                Type::from_members(rest)
            }
            other if other == member => Type::Unknown,
            other => other.clone(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Type::None)
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float | Type::Complex)
    }

    /// Approximate a sequence as an `n`-tuple for unpacking.
    ///
    /// Lists repeat their element type, dicts unpack their keys.
    pub fn to_tuple(&self, n: usize) -> Option<Type> {
        match self {
            Type::Tuple { variadic: false, .. } => Some(self.clone()),
            Type::Tuple { elems, variadic: true } => Some(Type::tuple(vec![Type::union_of(elems.iter().cloned()); n])),
            Type::List(elem) | Type::Set(elem) => Some(Type::tuple(vec![(**elem).clone(); n])),
            Type::Dict(key, _) => Some(Type::tuple(vec![(**key).clone(); n])),
            _ => None,
        }
    }

    /// Element type when the value is iterated directly
    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::List(elem) | Type::Set(elem) => Some((**elem).clone()),
            Type::Tuple { elems, .. } => Some(Type::union_of(elems.iter().cloned())),
            Type::Dict(key, _) => Some((**key).clone()),
            Type::Str => Some(Type::Str),
            _ => None,
        }
    }

    /// Rebuild a container with a widened element type
    pub fn widen_element(&self, elem: &Type) -> Type {
        match self {
            Type::List(old) => Type::list(old.join(elem)),
            Type::Set(old) => Type::set(old.join(elem)),
            Type::Dict(key, value) => Type::dict((**key).clone(), value.join(elem)),
            Type::Union(members) => Type::union_of(members.iter().map(|m| m.widen_element(elem))),
            other => other.clone(),
        }
    }
}

fn insert_member(members: &mut BTreeSet<Type>, member: Type) {
    match member {
        Type::Unknown => {}
        Type::Int if members.contains(&Type::Float) => {}
        Type::Float => {
            members.remove(&Type::Int);
            members.insert(Type::Float);
        }
        other => {
            members.insert(other);
        }
    }
}

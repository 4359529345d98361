//! Scopes: hierarchical name tables
//!
//! A scope maps names to *sets* of bindings, since conditional definitions can
//! leave more than one binding visible for a name. Besides the lexical parent
//! every scope keeps a separate forwarding link (the nearest enclosing
//! non-class scope, used for closures) and an ordered superclass list used
//! only for attribute resolution.
//!
//! Tables are persistent maps, so cloning a scope for branch analysis is cheap.

use crate::binding::BindingId;
use crate::store::Store;
use crate::types::Type;
use im::{OrdMap, OrdSet};
use pyflow_ast::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

/// Scope identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Class,
    Instance,
    Function,
    Module,
    Global,
    Scope,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Class => "CLASS",
            ScopeKind::Instance => "INSTANCE",
            ScopeKind::Function => "FUNCTION",
            ScopeKind::Module => "MODULE",
            ScopeKind::Global => "GLOBAL",
            ScopeKind::Scope => "SCOPE",
        };
        f.write_str(name)
    }
}

pub type BindingSet = OrdSet<BindingId>;

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub table: OrdMap<Symbol, BindingSet>,
    pub parent: Option<ScopeId>,
    /// Nearest enclosing non-class scope
    pub forwarding: Option<ScopeId>,
    pub supers: Vec<ScopeId>,
    /// Names declared `global`/`nonlocal` at this level
    pub globals: OrdSet<Symbol>,
    /// The value this scope models (a class scope's own class, a module...)
    pub ty: Option<Type>,
    /// Dotted qualified path
    pub path: String,
    /// Scope this one was cloned from during branch analysis
    pub clone_of: Option<ScopeId>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            table: OrdMap::new(),
            parent,
            forwarding: None,
            supers: Vec::new(),
            globals: OrdSet::new(),
            ty: None,
            path: String::new(),
            clone_of: None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &Symbol> {
        self.table.keys()
    }
}

impl Store {
    /// Create a scope; class scopes forward to their parent's forwarding link,
    /// every other scope forwards to itself.
    pub fn new_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let forwarding = match (kind, parent) {
            (ScopeKind::Class, Some(p)) => self.scope(p).forwarding,
            _ => None,
        };
        let id = self.alloc_scope(Scope::new(kind, parent));
        self.scope_mut(id).forwarding = if kind == ScopeKind::Class { forwarding } else { Some(id) };
        id
    }

    /// Lookup at this level only
    pub fn lookup_local(&self, scope: ScopeId, name: Symbol) -> Option<BindingSet> {
        self.scope(scope).table.get(&name).cloned()
    }

    /// Whether `name` is declared global/nonlocal from `scope` up to the module scope
    pub fn is_global_name(&self, scope: ScopeId, name: Symbol) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if s.globals.contains(&name) {
                return true;
            }
            if matches!(s.kind, ScopeKind::Module | ScopeKind::Global) {
                return false;
            }
            current = s.parent;
        }
        false
    }

    pub fn closest_of_kind(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scope(id).kind == kind {
                return Some(id);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// The module scope enclosing `scope`
    pub fn module_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.closest_of_kind(scope, ScopeKind::Module)
    }

    fn module_bindings_if_global(&self, scope: ScopeId, name: Symbol) -> Option<BindingSet> {
        if !self.is_global_name(scope, name) {
            return None;
        }
        match self.module_scope(scope) {
            Some(module) if module != scope => self.lookup_local(module, name),
            _ => None,
        }
    }

    /// Lookup through the parent chain, redirecting declared globals to the module scope
    pub fn lookup_bindings(&self, scope: ScopeId, name: Symbol) -> Option<BindingSet> {
        if let Some(bs) = self.module_bindings_if_global(scope, name) {
            return Some(bs);
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(bs) = self.lookup_local(id, name) {
                return Some(bs);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Attribute lookup: the local table, then superclass scopes depth-first,
    /// left to right. The parent link is never followed.
    pub fn lookup_attribute(&self, scope: ScopeId, name: Symbol) -> Option<BindingSet> {
        let mut visited = HashSet::new();
        self.lookup_attribute_in(scope, name, &mut visited)
    }

    fn lookup_attribute_in(&self, scope: ScopeId, name: Symbol, visited: &mut HashSet<ScopeId>) -> Option<BindingSet> {
        if !visited.insert(scope) {
            return None;
        }
        if let Some(bs) = self.lookup_local(scope, name) {
            return Some(bs);
        }
        let supers = self.scope(scope).supers.clone();
        let found = supers
            .into_iter()
            .find_map(|sup| self.lookup_attribute_in(sup, name, visited));
        // Only the current path counts as visited, so diamonds are searched again.
        visited.remove(&scope);
        found
    }

    pub fn lookup_type(&self, scope: ScopeId, name: Symbol) -> Option<Type> {
        self.lookup_bindings(scope, name)
            .map(|bs| self.union_of_bindings(bs.iter()))
    }

    pub fn lookup_attribute_type(&self, scope: ScopeId, name: Symbol) -> Option<Type> {
        self.lookup_attribute(scope, name)
            .map(|bs| self.union_of_bindings(bs.iter()))
    }

    /// Replace the bindings of `name` with a single binding
    pub fn set_binding(&mut self, scope: ScopeId, name: Symbol, binding: BindingId) {
        self.scope_mut(scope).table.insert(name, OrdSet::unit(binding));
    }

    pub fn set_bindings(&mut self, scope: ScopeId, name: Symbol, bindings: BindingSet) {
        self.scope_mut(scope).table.insert(name, bindings);
    }

    pub fn remove_name(&mut self, scope: ScopeId, name: Symbol) {
        self.scope_mut(scope).table.remove(&name);
    }

    pub fn add_super(&mut self, scope: ScopeId, sup: ScopeId) {
        self.scope_mut(scope).supers.push(sup);
    }

    pub fn add_global(&mut self, scope: ScopeId, name: Symbol) {
        self.scope_mut(scope).globals.insert(name);
    }

    /// Independent copy of a scope for speculative branch analysis
    pub fn clone_scope(&mut self, scope: ScopeId) -> ScopeId {
        let origin = self.canonical_scope(scope);
        let mut copy = self.scope(scope).clone();
        copy.clone_of = Some(origin);
        self.alloc_scope(copy)
    }

    /// The scope a branch clone stands for; scopes that are not clones stand for themselves
    pub fn canonical_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while let Some(origin) = self.scope(current).clone_of {
            current = origin;
        }
        current
    }

    /// Union the bindings of `other` into `into`, name by name
    pub fn merge(&mut self, into: ScopeId, other: ScopeId) {
        if into == other {
            return;
        }
        let other_table = self.scope(other).table.clone();
        let other_globals = self.scope(other).globals.clone();
        let target = self.scope_mut(into);
        for (name, bindings) in other_table {
            let merged = match target.table.get(&name) {
                Some(existing) => existing.clone().union(bindings),
                None => bindings,
            };
            target.table.insert(name, merged);
        }
        target.globals = target.globals.clone().union(other_globals);
        trace!(into = into.0, from = other.0, "merged scopes");
    }

    /// Erase `target` and replace its contents with those of `source`
    pub fn overwrite(&mut self, target: ScopeId, source: ScopeId) {
        if target == source {
            return;
        }
        let source = self.scope(source).clone();
        let slot = self.scope_mut(target);
        let clone_of = slot.clone_of;
        *slot = source;
        slot.clone_of = clone_of;
    }

    /// Extend the scope's path with `name`
    pub fn extend_path(&self, scope: ScopeId, name: &str) -> String {
        let path = &self.scope(scope).path;
        if path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", path, name)
        }
    }
}

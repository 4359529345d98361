//! Flow visitor
//!
//! Every visit takes the active scope and returns a type. For expressions
//! that is the value's type. For statements it describes how control leaves:
//! the types of values returned, joined with [`Type::Fallthrough`] when
//! control can also reach the next statement.
//!
//! The visitor is split by concern; every part is an `impl` block on
//! [`AnalysisContext`].

mod bind;
mod call;
mod expr;
mod import;
mod stmt;

pub(crate) use import::LoadOutcome;

use crate::context::AnalysisContext;
use crate::scope::ScopeId;
use crate::types::Type;
use pyflow_ast::Stmt;

impl AnalysisContext {
    /// Visit a statement list.
    ///
    /// Statements after the first one that cannot fall through are still
    /// visited, but no longer contribute to the block's type.
    pub(crate) fn visit_block(&mut self, body: &[Stmt], scope: ScopeId) -> Type {
        if body.is_empty() {
            return Type::Fallthrough;
        }
        self.declare_globals(body, scope);

        let mut result = Type::Unknown;
        let mut terminated = false;
        for stmt in body {
            let ty = self.visit_stmt(stmt, scope);
            if terminated {
                continue;
            }
            result = result.join(&ty);
            if !ty.contains(&Type::Fallthrough) {
                result = result.remove(&Type::Fallthrough);
                terminated = true;
            }
        }
        result
    }

    /// Visit a block on a branch clone, keeping the clone visible to
    /// closures applied before the branch merges
    pub(crate) fn visit_branch(&mut self, body: &[Stmt], clone: ScopeId) -> Type {
        self.branch_scopes.push(clone);
        let ty = self.visit_block(body, clone);
        self.branch_scopes.pop();
        ty
    }

    /// Innermost branch clone of `scope` still being visited, or `scope` itself
    pub(crate) fn live_scope(&self, scope: ScopeId) -> ScopeId {
        self.branch_scopes
            .iter()
            .rev()
            .copied()
            .find(|&clone| self.store.canonical_scope(clone) == scope)
            .unwrap_or(scope)
    }

    /// Register the names declared `global`/`nonlocal` by direct children of a block
    fn declare_globals(&mut self, body: &[Stmt], scope: ScopeId) {
        for stmt in body {
            let names = match stmt {
                Stmt::Global { names, .. } | Stmt::Nonlocal { names, .. } => names,
                _ => continue,
            };
            let module = self.store.module_scope(scope);
            for ident in names {
                self.store.add_global(scope, ident.name);
                let Some(module) = module else { continue };
                if let Some(bindings) = self.store.lookup_local(module, ident.name) {
                    for id in bindings.iter() {
                        self.store.binding_mut(*id).add_reference(ident.id);
                    }
                    self.resolved.insert(ident.id);
                }
            }
        }
    }
}

//! Statements, definitions and branch merging

use crate::binding::BindingKind;
use crate::context::AnalysisContext;
use crate::diagnostics::Problem;
use crate::function::{Arrows, FunctionBody, FunctionData};
use crate::scope::{ScopeId, ScopeKind};
use crate::store::ClassData;
use crate::types::Type;
use pyflow_ast::{names, ClassDef, ExceptHandler, Expr, FunctionDef, Lambda, Parameters, Span, Stmt, Symbol, WithItem};
use std::rc::Rc;
use tracing::trace;

impl AnalysisContext {
    pub(crate) fn visit_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> Type {
        match stmt {
            Stmt::Expr { value, .. } => {
                self.visit_expr(value, scope);
                Type::Fallthrough
            }
            Stmt::Assign { targets, value, .. } => {
                let ty = self.visit_expr(value, scope);
                for target in targets {
                    self.bind_target(scope, target, &ty, None);
                }
                self.record_declarations(scope, targets, value);
                Type::Fallthrough
            }
            Stmt::AugAssign { target, op, value, .. } => {
                let current = self.visit_expr(target, scope);
                let operand = self.visit_expr(value, scope);
                let ty = Self::binary_result(&current, *op, &operand);
                self.bind_target(scope, target, &ty, None);
                Type::Fallthrough
            }
            Stmt::FunctionDef(def) => {
                self.visit_function_def(def, scope);
                Type::Fallthrough
            }
            Stmt::ClassDef(def) => {
                self.visit_class_def(def, scope);
                Type::Fallthrough
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => self.visit_expr(value, scope),
                None => Type::None,
            },
            Stmt::If { test, body, orelse, .. } => {
                self.visit_expr(test, scope);
                self.visit_if(body, orelse, scope)
            }
            Stmt::While { test, body, orelse, .. } => {
                self.visit_expr(test, scope);
                let inner = self.store.clone_scope(scope);
                let ty = self.visit_branch(body, inner);
                self.store.merge(scope, inner);
                self.visit_loop_else(ty, orelse, scope)
            }
            Stmt::For { target, iter, body, orelse, .. } => {
                let iterable = self.visit_expr(iter, scope);
                let inner = self.store.clone_scope(scope);
                self.branch_scopes.push(inner);
                self.bind_iterator(inner, target, &iterable, None);
                let ty = self.visit_block(body, inner);
                self.branch_scopes.pop();
                self.store.merge(scope, inner);
                self.visit_loop_else(ty, orelse, scope)
            }
            Stmt::Try { body, handlers, orelse, finalbody, .. } => {
                self.visit_try(body, handlers, orelse, finalbody, scope)
            }
            Stmt::With { items, body, .. } => {
                self.visit_with_items(items, scope);
                self.visit_block(body, scope)
            }
            Stmt::Raise { exc, .. } => {
                if let Some(exc) = exc {
                    self.visit_expr(exc, scope);
                }
                Type::Unknown
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => Type::Unknown,
            // Declarations were registered before the block was visited.
            Stmt::Pass { .. } | Stmt::Global { .. } | Stmt::Nonlocal { .. } => Type::Fallthrough,
            Stmt::Delete { targets, .. } => {
                for target in targets {
                    match target {
                        Expr::Name { name, .. } => {
                            self.visit_expr(target, scope);
                            self.store.remove_name(scope, *name);
                        }
                        other => {
                            self.visit_expr(other, scope);
                        }
                    }
                }
                Type::Fallthrough
            }
            Stmt::Import { names, span, .. } => {
                self.visit_import(names, *span, scope);
                Type::Fallthrough
            }
            Stmt::ImportFrom { module, names, wildcard, .. } => {
                self.visit_import_from(module, names, *wildcard, scope);
                Type::Fallthrough
            }
            Stmt::Assert { test, msg, .. } => {
                self.visit_expr(test, scope);
                if let Some(msg) = msg {
                    self.visit_expr(msg, scope);
                }
                Type::Fallthrough
            }
        }
    }

    /// Both branches run on clones; the continuation keeps whichever can fall through
    fn visit_if(&mut self, body: &[Stmt], orelse: &[Stmt], scope: ScopeId) -> Type {
        let then_scope = self.store.clone_scope(scope);
        let then_ty = self.visit_branch(body, then_scope);
        let else_scope = self.store.clone_scope(scope);
        let else_ty = self.visit_branch(orelse, else_scope);

        let then_continues = then_ty.contains(&Type::Fallthrough);
        let else_continues = else_ty.contains(&Type::Fallthrough);
        match (then_continues, else_continues) {
            (true, true) => {
                self.store.merge(then_scope, else_scope);
                self.store.overwrite(scope, then_scope);
            }
            (false, true) => self.store.overwrite(scope, else_scope),
            // Only the then branch continues, or neither does.
            _ => self.store.overwrite(scope, then_scope),
        }
        then_ty.join(&else_ty)
    }

    /// A loop may run zero times, so it always falls through
    fn visit_loop_else(&mut self, body_ty: Type, orelse: &[Stmt], scope: ScopeId) -> Type {
        let mut ty = body_ty.join(&Type::Fallthrough);
        if !orelse.is_empty() {
            ty = ty.join(&self.visit_block(orelse, scope));
        }
        ty
    }

    fn visit_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
        scope: ScopeId,
    ) -> Type {
        let body_scope = self.store.clone_scope(scope);
        let mut body_ty = self.visit_branch(body, body_scope);
        if !orelse.is_empty() && body_ty.contains(&Type::Fallthrough) {
            let else_ty = self.visit_branch(orelse, body_scope);
            body_ty = body_ty.remove(&Type::Fallthrough).join(&else_ty);
        }

        let mut branches = vec![(body_scope, body_ty)];
        for handler in handlers {
            let handler_scope = self.store.clone_scope(scope);
            let caught = match &handler.exception {
                Some(exception) => {
                    let ty = self.visit_expr(exception, scope);
                    self.exception_instance(&ty)
                }
                None => Type::Unknown,
            };
            self.branch_scopes.push(handler_scope);
            if let Some(name) = &handler.name {
                self.bind_target(handler_scope, name, &caught, Some(BindingKind::Variable));
            }
            let ty = self.visit_block(&handler.body, handler_scope);
            self.branch_scopes.pop();
            branches.push((handler_scope, ty));
        }

        let mut result = Type::union_of(branches.iter().map(|(_, ty)| ty.clone()));
        let mut continuing = branches
            .iter()
            .filter(|(_, ty)| ty.contains(&Type::Fallthrough))
            .map(|(s, _)| *s);
        let continuation = continuing.next().unwrap_or(body_scope);
        for other in continuing {
            self.store.merge(continuation, other);
        }
        self.store.overwrite(scope, continuation);

        if !finalbody.is_empty() {
            let final_ty = self.visit_block(finalbody, scope);
            if !final_ty.contains(&Type::Fallthrough) {
                result = result.remove(&Type::Fallthrough).join(&final_ty);
            }
        }
        result
    }

    /// What an `except E as e` clause binds `e` to
    fn exception_instance(&self, ty: &Type) -> Type {
        Type::union_of(ty.members().map(|member| match member {
            Type::Class(id) => self
                .store
                .class(*id)
                .builtin_instance
                .clone()
                .unwrap_or(Type::Instance(*id)),
            Type::Tuple { elems, .. } => self.exception_instance(&Type::union_of(elems.iter().cloned())),
            _ => Type::Unknown,
        }))
    }

    fn visit_with_items(&mut self, items: &[WithItem], scope: ScopeId) {
        for item in items {
            let context = self.visit_expr(&item.context, scope);
            if let Some(target) = &item.target {
                let entered = self.enter_context(&context, item.context.id(), item.context.span());
                self.bind_target(scope, target, &entered, None);
            }
        }
    }

    /// Result of `__enter__` on the context value, or the value itself
    fn enter_context(&mut self, context: &Type, node: pyflow_ast::NodeId, span: Span) -> Type {
        let Some(scope) = self.attribute_scope(context) else {
            return context.clone();
        };
        let Some(enter) = self.store.lookup_attribute_type(scope, names::ENTER()) else {
            return context.clone();
        };
        let mut result = Type::Unknown;
        let mut applied = false;
        for member in enter.members() {
            if let Type::Function(id) = member {
                let bound = self.bind_receiver(*id, context);
                result = result.join(&self.apply(bound, &[], &[], None, node, span));
                applied = true;
            }
        }
        if applied {
            result
        } else {
            context.clone()
        }
    }

    /// Scope a function defined in `scope` closes over: the nearest non-class scope
    fn closure_scope(&self, scope: ScopeId) -> ScopeId {
        let canonical = self.store.canonical_scope(scope);
        self.store.scope(canonical).forwarding.unwrap_or(canonical)
    }

    fn evaluate_defaults(&mut self, params: &Parameters, scope: ScopeId) -> Vec<Option<Type>> {
        params
            .args
            .iter()
            .map(|param| param.default.as_ref().map(|d| self.visit_expr(d, scope)))
            .collect()
    }

    fn visit_function_def(&mut self, def: &Rc<FunctionDef>, scope: ScopeId) {
        let mut is_static = false;
        let mut is_classmethod = false;
        for decorator in &def.decorators {
            self.visit_expr(decorator, scope);
            match decorator.as_name().map(Symbol::as_str) {
                Some("staticmethod") => is_static = true,
                Some("classmethod") => is_classmethod = true,
                _ => {}
            }
        }

        let defaults = self.evaluate_defaults(&def.params, scope);
        let owner = self.class_of_scope(scope);
        let name = def.name.name;
        let qname = self.store.extend_path(scope, name.as_str());
        let attr_scope = self.store.new_scope(ScopeKind::Scope, None);
        self.store.scope_mut(attr_scope).path = qname.clone();
        let def_scope = self.closure_scope(scope);

        let id = self.store.alloc_function(FunctionData {
            name,
            node: def.id,
            span: def.span,
            qname,
            body: FunctionBody::Def(Rc::clone(def)),
            def_scope,
            attr_scope,
            defaults,
            arrows: Arrows::new(),
            bound_self: None,
            owner,
            origin: None,
            is_static,
            is_classmethod,
        });
        self.uncalled.insert(id);

        let kind = match owner {
            Some(_) if name == names::INIT() => BindingKind::Constructor,
            Some(_) => BindingKind::Method,
            None => BindingKind::Function,
        };
        let ty = Type::Function(id);
        let binding = self.bind_name(scope, name, def.name.id, def.name.span, ty.clone(), kind);
        self.store.binding_mut(binding).is_static = is_static;
        self.put_export(def.name.id, &ty);
        self.put_export(def.id, &ty);
        trace!(function = %self.store.function(id).qname, "defined function");
    }

    pub(crate) fn visit_lambda(&mut self, lambda: &Rc<Lambda>, scope: ScopeId) -> Type {
        let defaults = self.evaluate_defaults(&lambda.params, scope);
        let qname = self.store.extend_path(scope, "lambda");
        let attr_scope = self.store.new_scope(ScopeKind::Scope, None);
        let def_scope = self.closure_scope(scope);
        let id = self.store.alloc_function(FunctionData {
            name: Symbol::intern("lambda"),
            node: lambda.id,
            span: lambda.span,
            qname,
            body: FunctionBody::Lambda(Rc::clone(lambda)),
            def_scope,
            attr_scope,
            defaults,
            arrows: Arrows::new(),
            bound_self: None,
            owner: None,
            origin: None,
            is_static: false,
            is_classmethod: false,
        });
        self.uncalled.insert(id);
        Type::Function(id)
    }

    fn visit_class_def(&mut self, def: &Rc<ClassDef>, scope: ScopeId) {
        for decorator in &def.decorators {
            self.visit_expr(decorator, scope);
        }
        let bases: Vec<Type> = def.bases.iter().map(|b| self.visit_expr(b, scope)).collect();

        let parent = self.store.canonical_scope(scope);
        let name = def.name.name;
        let path = self.store.extend_path(scope, name.as_str());
        let class_scope = self.store.new_scope(ScopeKind::Class, Some(parent));
        let instance_scope = self.store.new_scope(ScopeKind::Instance, Some(parent));
        self.store.scope_mut(class_scope).path = path.clone();
        self.store.scope_mut(instance_scope).path = path.clone();
        self.store.add_super(instance_scope, class_scope);

        for (expr, base) in def.bases.iter().zip(&bases) {
            for member in base.members() {
                match member {
                    Type::Class(id) => {
                        let base_scope = self.store.class(*id).scope;
                        self.store.add_super(class_scope, base_scope);
                    }
                    _ => {
                        let name = self.print(member);
                        self.report(expr.span(), Problem::NotAClass { name });
                    }
                }
            }
        }

        let id = self.store.alloc_class(ClassData {
            name,
            node: def.id,
            qname: path,
            scope: class_scope,
            instance_scope,
            bases: bases.clone(),
            builtin_instance: None,
        });
        let ty = Type::Class(id);
        self.store.scope_mut(class_scope).ty = Some(ty.clone());
        self.store.scope_mut(instance_scope).ty = Some(Type::Instance(id));

        self.bind_name(scope, name, def.name.id, def.name.span, ty.clone(), BindingKind::Class);
        self.put_export(def.name.id, &ty);
        self.put_export(def.id, &ty);

        let specials = [
            (names::BASES(), Type::tuple(bases)),
            (names::NAME(), Type::Str),
            (names::MODULE(), Type::Str),
            (names::DOC(), Type::Str),
            (names::DICT(), Type::dict(Type::Str, Type::Unknown)),
        ];
        for (special, special_ty) in specials {
            self.bind_synthetic(class_scope, special, def.id, special_ty, BindingKind::Attribute);
        }

        self.visit_block(&def.body, class_scope);
    }

    /// `__all__` at module level and `__slots__` in a class body
    fn record_declarations(&mut self, scope: ScopeId, targets: &[Expr], value: &Expr) {
        let declared: Vec<(Symbol, &Expr)> = match value {
            Expr::List { elts, .. } | Expr::Tuple { elts, .. } => elts
                .iter()
                .filter_map(|e| e.as_str_literal().map(|s| (Symbol::intern(s), e)))
                .collect(),
            _ => return,
        };
        for target in targets {
            let Some(name) = target.as_name() else { continue };
            if name == names::ALL() {
                if let Some(module) = self.module_of_scope(scope) {
                    let exports = declared.iter().map(|(s, _)| *s).collect();
                    self.store.module_mut(module).exports = Some(exports);
                }
            } else if name == names::SLOTS() {
                if let Some(class) = self.class_of_scope(scope) {
                    let instance_scope = self.store.class(class).instance_scope;
                    for (slot, expr) in &declared {
                        if self.store.lookup_local(instance_scope, *slot).is_none() {
                            self.bind_name(instance_scope, *slot, expr.id(), expr.span(), Type::Unknown, BindingKind::Attribute);
                        }
                    }
                }
            }
        }
    }
}

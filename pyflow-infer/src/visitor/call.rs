//! Calls and function application
//!
//! Applying a function walks its body against a fresh scope parented at the
//! definition scope. Results are cached per function by the tuple of actual
//! parameter types, so a body is walked once per argument shape; a call site
//! already on the call stack yields `Unknown` instead of recursing.

use crate::binding::BindingKind;
use crate::context::AnalysisContext;
use crate::diagnostics::Problem;
use crate::function::{Arrows, FunctionBody};
use crate::scope::{ScopeId, ScopeKind};
use crate::stats::Statistics;
use crate::types::{ClassId, FunctionId, Type};
use pyflow_ast::{names, Expr, Identifier, Keyword, NodeId, Span, Symbol};
use std::collections::BTreeSet;
use tracing::{debug, trace};

impl AnalysisContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn visit_call(
        &mut self,
        node: NodeId,
        span: Span,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
        starargs: Option<&Expr>,
        kwargs: Option<&Expr>,
        scope: ScopeId,
    ) -> Type {
        let callee = self.visit_expr(func, scope);
        let positional: Vec<Type> = args.iter().map(|a| self.visit_expr(a, scope)).collect();
        let keyword_types: Vec<(Symbol, Type)> = keywords
            .iter()
            .map(|k| (k.name.name, self.visit_expr(&k.value, scope)))
            .collect();
        let star = starargs.map(|e| self.visit_expr(e, scope));
        if let Some(kwargs) = kwargs {
            self.visit_expr(kwargs, scope);
        }
        self.widen_mutated_container(func, &positional, scope);

        let members: Vec<Type> = callee.members().cloned().collect();
        let mut result = Type::Unknown;
        for member in &members {
            let ty = self.call_value(member, &positional, &keyword_types, star.as_ref(), node, span);
            result = result.join(&ty);
        }
        result
    }

    fn call_value(
        &mut self,
        callee: &Type,
        positional: &[Type],
        keywords: &[(Symbol, Type)],
        star: Option<&Type>,
        node: NodeId,
        span: Span,
    ) -> Type {
        match callee {
            Type::Function(id) => self.apply(*id, positional, keywords, star, node, span),
            Type::Class(id) => self.instantiate(*id, positional, keywords, star, node, span),
            Type::Instance(_) => {
                let scope = self.attribute_scope(callee);
                let call = scope.and_then(|s| self.store.lookup_attribute_type(s, names::CALL()));
                match call {
                    Some(call) => {
                        let bound = self.bind_members(&call, callee);
                        let members: Vec<Type> = bound.members().cloned().collect();
                        Type::union_of(members.into_iter().map(|m| match m {
                            Type::Function(id) => self.apply(id, positional, keywords, star, node, span),
                            _ => Type::Unknown,
                        }))
                    }
                    None => self.not_callable(callee, span),
                }
            }
            Type::Unknown => Type::Unknown,
            other => self.not_callable(other, span),
        }
    }

    fn not_callable(&mut self, ty: &Type, span: Span) -> Type {
        let ty = self.print(ty);
        self.report(span, Problem::NotCallable { ty });
        Type::Unknown
    }

    /// Calling a class: catalog classes produce their primitive, other classes
    /// an instance initialized by a bound `__init__`.
    fn instantiate(
        &mut self,
        class: ClassId,
        positional: &[Type],
        keywords: &[(Symbol, Type)],
        star: Option<&Type>,
        node: NodeId,
        span: Span,
    ) -> Type {
        if let Some(primitive) = self.store.class(class).builtin_instance.clone() {
            let elem = positional
                .first()
                .and_then(Type::element_type)
                .unwrap_or(Type::Unknown);
            return match primitive {
                Type::List(_) => Type::list(elem),
                Type::Set(_) => Type::set(elem),
                Type::Tuple { .. } => Type::variadic_tuple(elem),
                Type::Dict(..) => match positional.first() {
                    Some(arg @ Type::Dict(..)) => arg.clone(),
                    _ => Type::dict(Type::Unknown, Type::Unknown),
                },
                other => other,
            };
        }

        let instance = Type::Instance(class);
        let scope = self.store.class(class).scope;
        if let Some(init) = self.store.lookup_attribute_type(scope, names::INIT()) {
            let members: Vec<Type> = init.members().cloned().collect();
            for member in members {
                if let Type::Function(id) = member {
                    let bound = self.bind_receiver(id, &instance);
                    self.apply(bound, positional, keywords, star, node, span);
                }
            }
        }
        instance
    }

    /// Look up a special method on `receiver` and apply it bound
    pub(crate) fn call_special(
        &mut self,
        receiver: &Type,
        name: Symbol,
        args: &[Type],
        node: NodeId,
        span: Span,
    ) -> Type {
        let Some(scope) = self.attribute_scope(receiver) else {
            return Type::Unknown;
        };
        let Some(method) = self.store.lookup_attribute_type(scope, name) else {
            return Type::Unknown;
        };
        let bound = self.bind_members(&method, receiver);
        let members: Vec<Type> = bound.members().cloned().collect();
        Type::union_of(members.into_iter().map(|m| match m {
            Type::Function(id) => self.apply(id, args, &[], None, node, span),
            _ => Type::Unknown,
        }))
    }

    /// The function to call when `function` is reached through `receiver`
    pub(crate) fn bind_receiver(&mut self, function: FunctionId, receiver: &Type) -> FunctionId {
        let data = self.store.function(function);
        if data.bound_self.is_some() || data.is_static {
            return function;
        }
        let Some(owner) = data.owner else {
            return function;
        };
        match receiver {
            Type::Class(_) if data.is_classmethod => self.bound_method(function, receiver),
            Type::Class(_) | Type::Module(_) | Type::Function(_) | Type::Unknown => function,
            _ if data.is_classmethod => self.bound_method(function, &Type::Class(owner)),
            _ => self.bound_method(function, receiver),
        }
    }

    /// Bound copy of a method, one per receiver type
    pub(crate) fn bound_method(&mut self, function: FunctionId, receiver: &Type) -> FunctionId {
        let key = (function, receiver.clone());
        if let Some(id) = self.bound_methods.get(&key) {
            return *id;
        }
        let mut data = self.store.function(function).clone();
        let attr_scope = self.store.new_scope(ScopeKind::Scope, None);
        self.store.scope_mut(attr_scope).path = data.qname.clone();
        data.bound_self = Some(receiver.clone());
        data.origin = Some(function);
        data.arrows = Arrows::new();
        data.attr_scope = attr_scope;
        let node = data.node;
        let owner = data.owner;
        let id = self.store.alloc_function(data);

        for name in [names::SELF_ATTR(), names::IM_SELF()] {
            self.bind_synthetic(attr_scope, name, node, receiver.clone(), BindingKind::Attribute);
        }
        if let Some(owner) = owner {
            for name in [names::CLASS_ATTR(), names::IM_CLASS()] {
                self.bind_synthetic(attr_scope, name, node, Type::Class(owner), BindingKind::Attribute);
            }
        }
        self.bound_methods.insert(key, id);
        id
    }

    /// `xs.append(v)`, `xs.insert(i, v)` and `s.add(v)` widen the element type of `xs`
    fn widen_mutated_container(&mut self, func: &Expr, args: &[Type], scope: ScopeId) {
        let Expr::Attribute { value, attr, .. } = func else { return };
        let Some(name) = value.as_name() else { return };
        let added = match (attr.name.as_str(), args) {
            ("append" | "add", [v, ..]) => v,
            ("insert", [_, v, ..]) => v,
            _ => return,
        };
        let Some(bindings) = self.store.lookup_bindings(scope, name) else {
            return;
        };
        for id in bindings.iter() {
            let binding = self.store.binding_mut(*id);
            if matches!(binding.ty, Type::List(_) | Type::Set(_)) {
                binding.ty = binding.ty.widen_element(added);
            }
        }
    }

    /// Apply a function to actual argument types
    pub(crate) fn apply(
        &mut self,
        function: FunctionId,
        positional: &[Type],
        keywords: &[(Symbol, Type)],
        star: Option<&Type>,
        call: NodeId,
        span: Span,
    ) -> Type {
        self.stats.inc(Statistics::CALLS);
        let origin = self.store.function(function).origin;
        let first_call = self.uncalled.remove(&function);
        let first_origin_call = origin.is_some_and(|o| self.uncalled.remove(&o));
        if first_call || first_origin_call {
            self.stats.inc(Statistics::CALLED_FUNCTIONS);
        }

        let data = self.store.function(function);
        if let FunctionBody::Builtin(ret) = &data.body {
            return ret.resolve(data.bound_self.as_ref(), positional);
        }
        if self.call_stack.contains(&call) {
            trace!(function = %data.qname, "recursive call site, cutting off");
            return Type::Unknown;
        }

        let body = data.body.clone();
        let def_scope = data.def_scope;
        let def_span = data.span;
        let qname = data.qname.clone();
        let params = self.bind_arguments(function, positional, keywords, star, span);
        let key = Type::tuple(params.iter().map(|(_, ty)| ty.clone()).collect());

        if let Some(cached) = self.store.function(function).arrows.get(&key) {
            trace!(function = %qname, "memo hit");
            self.stats.inc(Statistics::MEMO_HITS);
            return cached.clone();
        }

        debug!(function = %qname, "applying function");
        let parent = self.live_scope(def_scope);
        let scope = self.store.new_scope(ScopeKind::Function, Some(parent));
        self.store.scope_mut(scope).path = qname;
        for (ident, ty) in &params {
            self.bind_name(scope, ident.name, ident.id, ident.span, ty.clone(), BindingKind::Parameter);
            self.put_export(ident.id, ty);
        }

        self.call_stack.push(call);
        self.yield_stack.push(None);
        self.stats.inc(Statistics::BODY_WALKS);
        let body_ty = match &body {
            FunctionBody::Def(def) => self.visit_block(&def.body, scope),
            FunctionBody::Lambda(lambda) => self.visit_expr(&lambda.body, scope),
            FunctionBody::Builtin(_) => Type::Unknown,
        };
        let yielded = self.yield_stack.pop().flatten();
        self.call_stack.pop();

        let mut result = body_ty;
        if result.contains(&Type::Fallthrough) {
            result = result.remove(&Type::Fallthrough);
            if result.members().any(|t| !t.is_none()) {
                self.report(def_span, Problem::FunctionMayNotReturn);
                self.report(span, Problem::CallMayNotReturn);
            }
            result = result.join(&Type::None);
        }
        if let Some(yielded) = yielded {
            result = Type::list(yielded);
        }

        let limit = self.options.max_arrows;
        if !self.store.function_mut(function).arrows.insert(key, result.clone(), limit) {
            trace!("memo table full");
        }
        result
    }

    /// Match actual arguments to formal parameters.
    ///
    /// Each formal takes, in order: the bound receiver (first formal of a
    /// method), a positional argument, its default, a keyword argument of
    /// the same name, the next element of `*args`. Formals left over are
    /// `Unknown` and reported.
    fn bind_arguments(
        &mut self,
        function: FunctionId,
        positional: &[Type],
        keywords: &[(Symbol, Type)],
        star: Option<&Type>,
        span: Span,
    ) -> Vec<(Identifier, Type)> {
        let data = self.store.function(function);
        let Some(params) = data.params().cloned() else {
            return Vec::new();
        };
        let defaults = data.defaults.clone();
        let mut receiver = data.bound_self.clone();

        let star_elems: Vec<Type> = match star {
            Some(Type::Tuple { elems, variadic: false }) => elems.clone(),
            _ => Vec::new(),
        };
        let star_repeat = match star {
            Some(t @ (Type::List(_) | Type::Set(_) | Type::Tuple { variadic: true, .. })) => t.element_type(),
            _ => None,
        };
        let mut star_iter = star_elems.into_iter();
        let mut positional_iter = positional.iter();
        let mut used_keywords = BTreeSet::new();
        let mut bound = Vec::with_capacity(params.args.len() + 2);

        for (i, param) in params.args.iter().enumerate() {
            let name = param.name.name;
            let ty = if let Some(recv) = receiver.take() {
                Some(recv)
            } else if let Some(ty) = positional_iter.next() {
                Some(ty.clone())
            } else if let Some(Some(default)) = defaults.get(i) {
                Some(default.clone())
            } else if let Some((_, ty)) = keywords.iter().find(|(k, _)| *k == name) {
                used_keywords.insert(name);
                Some(ty.clone())
            } else {
                star_iter.next().or_else(|| star_repeat.clone())
            };
            let ty = ty.unwrap_or_else(|| {
                self.report(span, Problem::UnboundArgument { name: name.to_string() });
                Type::Unknown
            });
            bound.push((param.name.clone(), ty));
        }

        if let Some(vararg) = &params.vararg {
            let rest: Vec<Type> = positional_iter.cloned().chain(star_iter).collect();
            let elem = Type::union_of(rest.into_iter().chain(star_repeat));
            bound.push((vararg.clone(), Type::variadic_tuple(elem)));
        }
        if let Some(kwarg) = &params.kwarg {
            let value = Type::union_of(
                keywords
                    .iter()
                    .filter(|(k, _)| !used_keywords.contains(k))
                    .map(|(_, ty)| ty.clone()),
            );
            bound.push((kwarg.clone(), Type::dict(Type::Str, value)));
        }
        bound
    }

    /// Apply a never-called function once with all-unknown arguments.
    /// Methods receive an instance of their class.
    pub(crate) fn apply_uncalled(&mut self, function: FunctionId) {
        let data = self.store.function(function);
        if data.is_builtin() {
            return;
        }
        let receiver = match data.owner {
            Some(owner) if !data.is_static => Some(if data.is_classmethod {
                Type::Class(owner)
            } else {
                Type::Instance(owner)
            }),
            _ => None,
        };
        let formals = data.params().map_or(0, |p| p.args.len());
        let node = data.node;
        let span = data.span;
        let target = match &receiver {
            Some(receiver) => self.bound_method(function, receiver),
            None => function,
        };
        let count = formals.saturating_sub(usize::from(receiver.is_some()));
        let args = vec![Type::Unknown; count];
        self.apply(target, &args, &[], None, node, span);
    }
}

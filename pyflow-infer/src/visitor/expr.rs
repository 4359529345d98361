//! Expressions

use crate::context::AnalysisContext;
use crate::diagnostics::Problem;
use crate::scope::ScopeId;
use crate::types::Type;
use pyflow_ast::{names, Comprehension, Expr, Identifier, Literal, NodeId, Operator, Slice, Span, Symbol, UnaryOperator};

impl AnalysisContext {
    /// Evaluate an expression and join its type into the export map
    pub(crate) fn visit_expr(&mut self, expr: &Expr, scope: ScopeId) -> Type {
        let ty = self.eval_expr(expr, scope);
        self.put_export(expr.id(), &ty);
        ty
    }

    fn eval_expr(&mut self, expr: &Expr, scope: ScopeId) -> Type {
        match expr {
            Expr::Name { id, name, span } => self.lookup_name(scope, *name, *id, *span),
            Expr::Literal { value, .. } => match value {
                Literal::None => Type::None,
                Literal::Bool(_) => Type::Bool,
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Complex(_) => Type::Complex,
                Literal::Str(_) => Type::Str,
            },
            Expr::List { elts, .. } => Type::list(self.join_all(elts, scope)),
            Expr::Set { elts, .. } => Type::set(self.join_all(elts, scope)),
            Expr::Tuple { elts, .. } => {
                Type::tuple(elts.iter().map(|e| self.visit_expr(e, scope)).collect())
            }
            Expr::Dict { keys, values, .. } => {
                let key = self.join_all(keys, scope);
                let value = self.join_all(values, scope);
                Type::dict(key, value)
            }
            Expr::BinOp { left, op, right, .. } => {
                let left = self.visit_expr(left, scope);
                let right = self.visit_expr(right, scope);
                Self::binary_result(&left, *op, &right)
            }
            Expr::UnaryOp { op, operand, .. } => {
                let operand = self.visit_expr(operand, scope);
                match op {
                    UnaryOperator::Not => Type::Bool,
                    _ => operand,
                }
            }
            Expr::Call {
                id,
                func,
                args,
                keywords,
                starargs,
                kwargs,
                span,
            } => self.visit_call(*id, *span, func, args, keywords, starargs.as_deref(), kwargs.as_deref(), scope),
            Expr::Attribute { value, attr, span, .. } => {
                let owner = self.visit_expr(value, scope);
                self.get_attribute(&owner, attr, *span)
            }
            Expr::Subscript { id, value, slice, span } => {
                let container = self.visit_expr(value, scope);
                match slice.as_ref() {
                    Slice::Index { value: index } => {
                        let index_ty = self.visit_expr(index, scope);
                        self.subscript(&container, &index_ty, index, *id, *span)
                    }
                    Slice::Range { lower, upper, step } => {
                        for bound in [lower, upper, step].into_iter().flatten() {
                            self.visit_expr(bound, scope);
                        }
                        self.slice(&container, *id, *span)
                    }
                }
            }
            Expr::Lambda(lambda) => self.visit_lambda(lambda, scope),
            Expr::IfExp { test, body, orelse, .. } => {
                self.visit_expr(test, scope);
                let then_ty = self.visit_expr(body, scope);
                let else_ty = self.visit_expr(orelse, scope);
                then_ty.join(&else_ty)
            }
            Expr::ListComp { elt, generators, .. } | Expr::GeneratorExp { elt, generators, .. } => {
                self.visit_generators(generators, scope);
                Type::list(self.visit_expr(elt, scope))
            }
            Expr::SetComp { elt, generators, .. } => {
                self.visit_generators(generators, scope);
                Type::set(self.visit_expr(elt, scope))
            }
            Expr::DictComp { key, value, generators, .. } => {
                self.visit_generators(generators, scope);
                let key = self.visit_expr(key, scope);
                let value = self.visit_expr(value, scope);
                Type::dict(key, value)
            }
            Expr::Yield { value, .. } => {
                let yielded = match value {
                    Some(value) => self.visit_expr(value, scope),
                    None => Type::None,
                };
                if let Some(top) = self.yield_stack.last_mut() {
                    *top = Some(match top.take() {
                        Some(previous) => previous.join(&yielded),
                        None => yielded,
                    });
                }
                Type::Unknown
            }
        }
    }

    fn join_all(&mut self, exprs: &[Expr], scope: ScopeId) -> Type {
        let types: Vec<Type> = exprs.iter().map(|e| self.visit_expr(e, scope)).collect();
        Type::union_of(types)
    }

    pub(crate) fn binary_result(left: &Type, op: Operator, right: &Type) -> Type {
        if op.is_boolean() {
            return Type::Bool;
        }
        match (op, left, right) {
            (Operator::Mod, Type::Str, _) => Type::Str,
            // True division of numbers is never integral.
            (Operator::Div, l, r) if l.is_numeric() && r.is_numeric() => {
                if matches!(l, Type::Complex) || matches!(r, Type::Complex) {
                    Type::Complex
                } else {
                    Type::Float
                }
            }
            (Operator::Mul, seq, Type::Int) | (Operator::Mul, Type::Int, seq)
                if matches!(seq, Type::Str | Type::List(_)) =>
            {
                seq.clone()
            }
            _ => left.join(right),
        }
    }

    /// Resolve a name, recording the use on every visible binding
    fn lookup_name(&mut self, scope: ScopeId, name: Symbol, node: NodeId, span: Span) -> Type {
        match self.store.lookup_bindings(scope, name) {
            Some(bindings) => {
                for id in bindings.iter() {
                    self.store.binding_mut(*id).add_reference(node);
                }
                self.resolved.insert(node);
                self.store.union_of_bindings(bindings.iter())
            }
            None => {
                self.report(span, Problem::UnboundVariable { name: name.to_string() });
                self.unresolved.insert(node);
                Type::Unknown
            }
        }
    }

    /// Comprehension variables are bound in the enclosing scope and stay visible afterwards
    fn visit_generators(&mut self, generators: &[Comprehension], scope: ScopeId) {
        for generator in generators {
            let iterable = self.visit_expr(&generator.iter, scope);
            self.bind_iterator(scope, &generator.target, &iterable, None);
            for condition in &generator.ifs {
                self.visit_expr(condition, scope);
            }
        }
    }

    /// Attribute access, per member of the owner's type.
    ///
    /// A miss is reported only when no member has the attribute.
    pub(crate) fn get_attribute(&mut self, owner: &Type, attr: &Identifier, span: Span) -> Type {
        if owner.is_unknown() {
            return Type::Unknown;
        }
        let members: Vec<Type> = owner.members().cloned().collect();
        let mut result = Type::Unknown;
        let mut found = false;
        for member in &members {
            if let Some(ty) = self.member_attribute(member, attr) {
                result = result.join(&ty);
                found = true;
            }
        }
        if found {
            self.resolved.insert(attr.id);
        } else {
            let ty = self.print(owner);
            self.report(span, Problem::AttributeNotFound { ty });
            self.unresolved.insert(attr.id);
        }
        self.put_export(attr.id, &result);
        result
    }

    fn member_attribute(&mut self, member: &Type, attr: &Identifier) -> Option<Type> {
        let scope = self.attribute_scope(member)?;
        let bindings = self.store.lookup_attribute(scope, attr.name)?;
        for id in bindings.iter() {
            self.store.binding_mut(*id).add_reference(attr.id);
        }
        let ty = self.store.union_of_bindings(bindings.iter());
        Some(self.bind_members(&ty, member))
    }

    /// Turn the methods among `ty`'s members into methods bound to `receiver`
    pub(crate) fn bind_members(&mut self, ty: &Type, receiver: &Type) -> Type {
        if !ty.members().any(|m| matches!(m, Type::Function(_))) {
            return ty.clone();
        }
        let members: Vec<Type> = ty.members().cloned().collect();
        Type::union_of(members.into_iter().map(|member| match member {
            Type::Function(id) => Type::Function(self.bind_receiver(id, receiver)),
            other => other,
        }))
    }

    fn subscript(&mut self, container: &Type, index: &Type, index_expr: &Expr, node: NodeId, span: Span) -> Type {
        let members: Vec<Type> = container.members().cloned().collect();
        let mut result = Type::Unknown;
        for member in &members {
            let ty = match member {
                Type::List(elem) => (**elem).clone(),
                Type::Tuple { elems, variadic } => match index_expr {
                    Expr::Literal { value: Literal::Int(i), .. } if !*variadic => {
                        let len = elems.len() as i64;
                        let position = if *i < 0 { len + *i } else { *i };
                        if (0..len).contains(&position) {
                            elems[position as usize].clone()
                        } else {
                            Type::union_of(elems.iter().cloned())
                        }
                    }
                    _ => Type::union_of(elems.iter().cloned()),
                },
                Type::Dict(key, value) => {
                    let mismatch = !key.is_unknown()
                        && !index.is_unknown()
                        && !index.members().any(|i| key.contains(i));
                    if mismatch {
                        self.report(span, Problem::PossibleKeyError);
                    }
                    (**value).clone()
                }
                Type::Instance(_) => self.call_special(member, names::GETITEM(), &[index.clone()], node, span),
                _ => Type::Unknown,
            };
            result = result.join(&ty);
        }
        result
    }

    fn slice(&mut self, container: &Type, node: NodeId, span: Span) -> Type {
        let members: Vec<Type> = container.members().cloned().collect();
        let mut result = Type::Unknown;
        for member in &members {
            let ty = match member {
                Type::List(_) => {
                    let sliced = self.call_special(member, names::GETSLICE(), &[], node, span);
                    if sliced.is_unknown() {
                        member.clone()
                    } else {
                        sliced
                    }
                }
                Type::Tuple { elems, .. } => Type::variadic_tuple(Type::union_of(elems.iter().cloned())),
                Type::Str => Type::Str,
                Type::Dict(..) => {
                    let ty = self.print(member);
                    self.report(span, Problem::NotSliceable { ty });
                    Type::Unknown
                }
                Type::Instance(_) => self.call_special(member, names::GETSLICE(), &[], node, span),
                _ => Type::Unknown,
            };
            result = result.join(&ty);
        }
        result
    }
}

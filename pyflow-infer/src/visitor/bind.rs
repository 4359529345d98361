//! Assignment targets and iteration

use crate::binding::BindingKind;
use crate::context::AnalysisContext;
use crate::diagnostics::Problem;
use crate::function::FunctionBody;
use crate::scope::ScopeId;
use crate::types::Type;
use pyflow_ast::{names, Expr, Identifier, NodeId, Slice, Span, Symbol};

impl AnalysisContext {
    /// Bind an assignment target to a value type
    pub(crate) fn bind_target(&mut self, scope: ScopeId, target: &Expr, ty: &Type, kind: Option<BindingKind>) {
        match target {
            Expr::Name { id, name, span } => self.bind_identifier(scope, *name, *id, *span, ty, kind),
            Expr::Tuple { elts, span, .. } | Expr::List { elts, span, .. } => {
                self.bind_unpack(scope, elts, ty, kind, *span);
                self.put_export(target.id(), ty);
            }
            Expr::Attribute { value, attr, .. } => {
                let owner = self.visit_expr(value, scope);
                self.bind_attribute(&owner, attr, ty);
            }
            Expr::Subscript { value, slice, .. } => {
                let index = match slice.as_ref() {
                    Slice::Index { value } => self.visit_expr(value, scope),
                    Slice::Range { lower, upper, step } => {
                        for bound in [lower, upper, step].into_iter().flatten() {
                            self.visit_expr(bound, scope);
                        }
                        Type::Unknown
                    }
                };
                if let Some(name) = value.as_name() {
                    self.widen_subscripted(scope, name, &index, ty);
                }
                self.visit_expr(value, scope);
            }
            other => self.report(other.span(), Problem::InvalidAssignmentTarget),
        }
    }

    fn bind_identifier(
        &mut self,
        scope: ScopeId,
        name: Symbol,
        node: NodeId,
        span: Span,
        ty: &Type,
        kind: Option<BindingKind>,
    ) {
        let module = self.store.module_scope(scope);
        let declared_global = self.store.is_global_name(scope, name);
        match module {
            Some(module) if declared_global && module != scope => {
                match self.store.lookup_local(module, name) {
                    Some(bindings) => {
                        for id in bindings.iter() {
                            let binding = self.store.binding_mut(*id);
                            binding.add_type(ty);
                            binding.add_reference(node);
                        }
                    }
                    None => {
                        let kind = self.kind_for_scope(module);
                        self.bind_name(module, name, node, span, ty.clone(), kind);
                    }
                }
            }
            _ => {
                let kind = kind.unwrap_or_else(|| self.kind_for_scope(scope));
                self.bind_name(scope, name, node, span, ty.clone(), kind);
            }
        }
        self.put_export(node, ty);
    }

    /// Positional unpacking into a tuple or list of targets
    fn bind_unpack(&mut self, scope: ScopeId, targets: &[Expr], ty: &Type, kind: Option<BindingKind>, span: Span) {
        let values = match ty {
            Type::Tuple { elems, variadic: false } => {
                if elems.len() == targets.len() {
                    Some(elems.clone())
                } else {
                    let problem = if targets.len() > elems.len() {
                        Problem::NeedMoreValues { found: elems.len() }
                    } else {
                        Problem::TooManyValues
                    };
                    self.report(span, problem);
                    None
                }
            }
            Type::Unknown => None,
            other => match other.to_tuple(targets.len()) {
                Some(Type::Tuple { elems, .. }) => Some(elems),
                _ => {
                    let ty = self.print(other);
                    self.report(span, Problem::UnpackNonIterable { ty });
                    None
                }
            },
        };
        let values = values.unwrap_or_else(|| vec![Type::Unknown; targets.len()]);
        for (target, value) in targets.iter().zip(values) {
            self.bind_target(scope, target, &value, kind);
        }
    }

    /// Set an attribute on every member of the owner's type
    fn bind_attribute(&mut self, owner: &Type, attr: &Identifier, ty: &Type) {
        if owner.is_unknown() {
            self.report(attr.span, Problem::SetAttributeOnUnknown);
            return;
        }
        let members: Vec<Type> = owner.members().cloned().collect();
        for member in &members {
            let scope = match member {
                Type::Instance(_) | Type::Class(_) | Type::Module(_) | Type::Function(_) => {
                    self.attribute_scope(member)
                }
                _ => None,
            };
            let Some(scope) = scope else { continue };
            match self.store.lookup_local(scope, attr.name) {
                Some(bindings) => {
                    for id in bindings.iter() {
                        self.store.binding_mut(*id).add_type(ty);
                    }
                }
                None => {
                    self.bind_name(scope, attr.name, attr.id, attr.span, ty.clone(), BindingKind::Attribute);
                }
            }
        }
        self.put_export(attr.id, ty);
    }

    /// `xs[i] = v` widens a named list's elements, `d[k] = v` a named dict's keys and values
    fn widen_subscripted(&mut self, scope: ScopeId, name: Symbol, index: &Type, value: &Type) {
        let Some(bindings) = self.store.lookup_bindings(scope, name) else {
            return;
        };
        for id in bindings.iter() {
            let binding = self.store.binding_mut(*id);
            binding.ty = match &binding.ty {
                Type::List(elem) => Type::list(elem.join(value)),
                Type::Dict(key, old) => Type::dict(key.join(index), old.join(value)),
                other => other.clone(),
            };
        }
    }

    /// Bind a loop or comprehension target to the element type of an iterable
    pub(crate) fn bind_iterator(&mut self, scope: ScopeId, target: &Expr, iterable: &Type, kind: Option<BindingKind>) {
        let members: Vec<Type> = iterable.members().cloned().collect();
        let mut elem = Type::Unknown;
        for member in &members {
            let ty = match member {
                Type::List(e) | Type::Set(e) => (**e).clone(),
                Type::Tuple { elems, .. } => Type::union_of(elems.iter().cloned()),
                other => self.iterate_with_dunder(other, target.id(), target.span()),
            };
            elem = elem.join(&ty);
        }
        self.bind_target(scope, target, &elem, kind);
    }

    /// Element type through a declared `__iter__`
    fn iterate_with_dunder(&mut self, ty: &Type, node: NodeId, span: Span) -> Type {
        let iter = self
            .attribute_scope(ty)
            .and_then(|scope| self.store.lookup_attribute_type(scope, names::ITER()));
        let functions: Vec<_> = iter
            .iter()
            .flat_map(|t| t.members())
            .filter_map(|m| match m {
                Type::Function(id) => Some(*id),
                _ => None,
            })
            .collect();
        if functions.is_empty() {
            let printed = self.print(ty);
            self.report(span, Problem::NotIterable { ty: printed });
            return Type::Unknown;
        }
        let mut elem = Type::Unknown;
        for function in functions {
            let builtin = matches!(self.store.function(function).body, FunctionBody::Builtin(_));
            let bound = self.bind_receiver(function, ty);
            let result = self.apply(bound, &[], &[], None, node, span);
            // Catalog entries declare the element; source methods return an iterable.
            let ty = if builtin {
                result
            } else {
                result.element_type().unwrap_or(Type::Unknown)
            };
            elem = elem.join(&ty);
        }
        elem
    }
}

//! Human-readable rendering of types and bindings

use crate::binding::Binding;
use crate::store::Store;
use crate::types::{FunctionId, Type};
use std::fmt::Write;

/// Renders types against the arenas that give ids their names.
///
/// Function types print their memo table, which may mention the function
/// itself; functions already being printed render as `#n`, their depth on the
/// visiting stack.
pub struct TypePrinter<'a> {
    store: &'a Store,
    visiting: Vec<FunctionId>,
}

impl<'a> TypePrinter<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            visiting: Vec::new(),
        }
    }

    pub fn print(&mut self, ty: &Type) -> String {
        let mut out = String::new();
        self.write(&mut out, ty);
        out
    }

    fn write(&mut self, out: &mut String, ty: &Type) {
        match ty {
            Type::Unknown => out.push('?'),
            Type::None => out.push_str("None"),
            Type::Fallthrough => out.push_str("<fallthrough>"),
            Type::Bool => out.push_str("bool"),
            Type::Int => out.push_str("int"),
            Type::Float => out.push_str("float"),
            Type::Complex => out.push_str("complex"),
            Type::Str => out.push_str("str"),
            Type::List(elem) => {
                out.push('[');
                self.write(out, elem);
                out.push(']');
            }
            Type::Set(elem) => {
                out.push('{');
                self.write(out, elem);
                out.push('}');
            }
            Type::Dict(key, value) => {
                out.push('{');
                self.write(out, key);
                out.push(':');
                self.write(out, value);
                out.push('}');
            }
            Type::Tuple { elems, variadic } => {
                out.push('(');
                self.write_joined(out, elems, ", ");
                if *variadic {
                    out.push_str(", ...");
                }
                out.push(')');
            }
            Type::Union(members) => {
                out.push('{');
                let members: Vec<Type> = members.iter().cloned().collect();
                self.write_joined(out, &members, " | ");
                out.push('}');
            }
            Type::Class(id) => {
                let _ = write!(out, "<{}>", self.store.class(*id).name);
            }
            Type::Instance(id) => out.push_str(self.store.class(*id).name.as_str()),
            Type::Module(id) => out.push_str(&self.store.module(*id).name),
            Type::Function(id) => self.write_function(out, *id),
        }
    }

    fn write_function(&mut self, out: &mut String, id: FunctionId) {
        if let Some(depth) = self.visiting.iter().position(|f| *f == id) {
            let _ = write!(out, "#{}", depth);
            return;
        }
        let arrows: Vec<(Type, Type)> = self.store.function(id).arrows.iter().cloned().collect();
        if arrows.is_empty() {
            out.push_str("? -> ?");
            return;
        }
        self.visiting.push(id);
        for (i, (from, to)) in arrows.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            self.write(out, from);
            out.push_str(" -> ");
            self.write(out, to);
        }
        self.visiting.pop();
    }

    fn write_joined(&mut self, out: &mut String, types: &[Type], sep: &str) {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write(out, ty);
        }
    }

    /// `(binding:kind=KIND:node=NODE:type=TYPE:qname=QNAME:refs=[...])`
    pub fn print_binding(&mut self, binding: &Binding) -> String {
        let refs: Vec<String> = binding.refs.iter().map(|r| r.to_string()).collect();
        format!(
            "(binding:kind={}:node={}:type={}:qname={}:refs=[{}])",
            binding.kind,
            binding.node,
            self.print(&binding.ty),
            binding.qname,
            refs.join(", ")
        )
    }
}

//! Builtins catalog
//!
//! The catalog is a declarative table installed into the global scope before
//! any module is analyzed. The engine consults it only through name lookup in
//! that scope: `int`, `list.append`, `len`...
//!
//! Catalog classes standing for primitive types (`int`, `str`, `list`...)
//! carry the primitive as their instance type, which is also how attribute
//! access on primitive values is resolved.

use crate::binding::BindingKind;
use crate::context::AnalysisContext;
use crate::function::{Arrows, BuiltinReturn, FunctionBody, FunctionData};
use crate::scope::ScopeKind;
use crate::store::ClassData;
use crate::types::{ClassId, FunctionId, Type};
use pyflow_ast::{NodeId, Span, Symbol};

/// Source of builtin names
pub trait BuiltinCatalog {
    /// Install the catalog's entries
    fn populate(&self, catalog: &mut CatalogBuilder<'_>);
}

/// Installs catalog entries into the global scope of a context
pub struct CatalogBuilder<'a> {
    ctx: &'a mut AnalysisContext,
}

impl<'a> CatalogBuilder<'a> {
    pub(crate) fn new(ctx: &'a mut AnalysisContext) -> Self {
        Self { ctx }
    }

    /// Declare a class. `instance` is the primitive type its instances stand for.
    pub fn class(&mut self, name: &str, bases: &[ClassId], instance: Option<Type>) -> ClassId {
        let sym = Symbol::intern(name);
        let node = self.ctx.synthetic_node();
        let global = self.ctx.global_scope;
        let store = &mut self.ctx.store;

        let scope = store.new_scope(ScopeKind::Class, Some(global));
        let instance_scope = store.new_scope(ScopeKind::Instance, Some(global));
        store.add_super(instance_scope, scope);
        for base in bases {
            let base_scope = store.class(*base).scope;
            store.add_super(scope, base_scope);
        }
        store.scope_mut(scope).path = name.to_string();
        store.scope_mut(instance_scope).path = name.to_string();

        let id = store.alloc_class(ClassData {
            name: sym,
            node,
            qname: name.to_string(),
            scope,
            instance_scope,
            bases: bases.iter().map(|b| Type::Class(*b)).collect(),
            builtin_instance: instance,
        });
        store.scope_mut(scope).ty = Some(Type::Class(id));
        store.scope_mut(instance_scope).ty = Some(Type::Instance(id));

        self.ctx
            .bind_name(global, sym, node, Span::default(), Type::Class(id), BindingKind::Class);
        id
    }

    /// Declare a method on a catalog class
    pub fn method(&mut self, class: ClassId, name: &str, returns: BuiltinReturn) -> FunctionId {
        let scope = self.ctx.store.class(class).scope;
        let id = self.builtin_function(name, returns, Some(class));
        let node = self.ctx.store.function(id).node;
        self.ctx
            .bind_name(scope, Symbol::intern(name), node, Span::default(), Type::Function(id), BindingKind::Method);
        id
    }

    /// Declare a free function
    pub fn function(&mut self, name: &str, returns: BuiltinReturn) -> FunctionId {
        let global = self.ctx.global_scope;
        let id = self.builtin_function(name, returns, None);
        let node = self.ctx.store.function(id).node;
        self.ctx
            .bind_name(global, Symbol::intern(name), node, Span::default(), Type::Function(id), BindingKind::Function);
        id
    }

    /// Declare a plain value
    pub fn value(&mut self, name: &str, ty: Type) {
        let global = self.ctx.global_scope;
        let node = self.ctx.synthetic_node();
        self.ctx
            .bind_name(global, Symbol::intern(name), node, Span::default(), ty, BindingKind::Variable);
    }

    /// Declare an attribute on a catalog class
    pub fn attribute(&mut self, class: ClassId, name: &str, ty: Type) {
        let scope = self.ctx.store.class(class).instance_scope;
        let node = self.ctx.synthetic_node();
        self.ctx
            .bind_name(scope, Symbol::intern(name), node, Span::default(), ty, BindingKind::Attribute);
    }

    fn builtin_function(&mut self, name: &str, returns: BuiltinReturn, owner: Option<ClassId>) -> FunctionId {
        let node: NodeId = self.ctx.synthetic_node();
        let global = self.ctx.global_scope;
        let attr_scope = self.ctx.store.new_scope(ScopeKind::Scope, None);
        let qname = match owner {
            Some(class) => format!("{}.{}", self.ctx.store.class(class).qname, name),
            None => name.to_string(),
        };
        self.ctx.store.alloc_function(FunctionData {
            name: Symbol::intern(name),
            node,
            span: Span::default(),
            qname,
            body: FunctionBody::Builtin(returns),
            def_scope: global,
            attr_scope,
            defaults: Vec::new(),
            arrows: Arrows::new(),
            bound_self: None,
            owner,
            origin: None,
            is_static: false,
            is_classmethod: false,
        })
    }
}

/// The default catalog: core types, containers, exceptions and common functions
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardBuiltins;

impl BuiltinCatalog for StandardBuiltins {
    fn populate(&self, c: &mut CatalogBuilder<'_>) {
        use BuiltinReturn::*;

        let object = c.class("object", &[], None);
        c.class("NoneType", &[object], Some(Type::None));
        c.value("None", Type::None);
        c.value("True", Type::Bool);
        c.value("False", Type::Bool);

        let int = c.class("int", &[object], Some(Type::Int));
        c.method(int, "bit_length", Fixed(Type::Int));
        c.method(int, "conjugate", Receiver);
        c.class("bool", &[int], Some(Type::Bool));
        let float = c.class("float", &[object], Some(Type::Float));
        c.method(float, "is_integer", Fixed(Type::Bool));
        c.method(float, "conjugate", Receiver);
        let complex = c.class("complex", &[object], Some(Type::Complex));
        c.method(complex, "conjugate", Receiver);
        c.attribute(complex, "real", Type::Float);
        c.attribute(complex, "imag", Type::Float);

        let str_ = c.class("str", &[object], Some(Type::Str));
        for name in [
            "upper", "lower", "strip", "lstrip", "rstrip", "replace", "format", "join",
            "capitalize", "title", "center", "ljust", "rjust", "zfill", "encode", "decode",
        ] {
            c.method(str_, name, Fixed(Type::Str));
        }
        for name in ["split", "rsplit", "splitlines"] {
            c.method(str_, name, Fixed(Type::list(Type::Str)));
        }
        for name in ["startswith", "endswith", "isdigit", "isalpha", "isalnum", "isspace", "isupper", "islower"] {
            c.method(str_, name, Fixed(Type::Bool));
        }
        for name in ["find", "rfind", "index", "rindex", "count"] {
            c.method(str_, name, Fixed(Type::Int));
        }
        c.method(str_, "partition", Fixed(Type::tuple(vec![Type::Str, Type::Str, Type::Str])));
        c.method(str_, "__iter__", Fixed(Type::Str));
        c.method(str_, "__getslice__", Receiver);

        let list = c.class("list", &[object], Some(Type::list(Type::Unknown)));
        for name in ["append", "insert", "extend", "remove", "sort", "reverse", "clear"] {
            c.method(list, name, Fixed(Type::None));
        }
        c.method(list, "pop", Element);
        c.method(list, "index", Fixed(Type::Int));
        c.method(list, "count", Fixed(Type::Int));
        c.method(list, "copy", Receiver);
        c.method(list, "__iter__", Element);
        c.method(list, "__getslice__", Receiver);

        let dict = c.class("dict", &[object], Some(Type::dict(Type::Unknown, Type::Unknown)));
        c.method(dict, "keys", ListOfElement);
        c.method(dict, "values", ListOfValue);
        c.method(dict, "items", Items);
        c.method(dict, "get", Value);
        c.method(dict, "pop", Value);
        c.method(dict, "setdefault", Value);
        c.method(dict, "update", Fixed(Type::None));
        c.method(dict, "clear", Fixed(Type::None));
        c.method(dict, "copy", Receiver);
        c.method(dict, "has_key", Fixed(Type::Bool));
        c.method(dict, "__iter__", Element);

        let set = c.class("set", &[object], Some(Type::set(Type::Unknown)));
        for name in ["add", "remove", "discard", "update", "clear"] {
            c.method(set, name, Fixed(Type::None));
        }
        c.method(set, "pop", Element);
        for name in ["union", "intersection", "difference", "symmetric_difference", "copy"] {
            c.method(set, name, Receiver);
        }
        for name in ["issubset", "issuperset", "isdisjoint"] {
            c.method(set, name, Fixed(Type::Bool));
        }
        c.method(set, "__iter__", Element);

        let tuple = c.class("tuple", &[object], Some(Type::variadic_tuple(Type::Unknown)));
        c.method(tuple, "index", Fixed(Type::Int));
        c.method(tuple, "count", Fixed(Type::Int));
        c.method(tuple, "__iter__", Element);

        let file = c.class("file", &[object], None);
        let file_instance = Type::Instance(file);
        c.method(file, "read", Fixed(Type::Str));
        c.method(file, "readline", Fixed(Type::Str));
        c.method(file, "readlines", Fixed(Type::list(Type::Str)));
        c.method(file, "write", Fixed(Type::None));
        c.method(file, "close", Fixed(Type::None));
        c.method(file, "__enter__", Receiver);
        c.method(file, "__exit__", Fixed(Type::None));
        c.method(file, "__iter__", Fixed(Type::Str));

        let base_exception = c.class("BaseException", &[object], None);
        c.attribute(base_exception, "args", Type::variadic_tuple(Type::Unknown));
        c.attribute(base_exception, "message", Type::Str);
        let exception = c.class("Exception", &[base_exception], None);
        for name in [
            "ValueError", "TypeError", "KeyError", "IndexError", "AttributeError", "RuntimeError",
            "StopIteration", "NotImplementedError", "OSError", "IOError", "ZeroDivisionError",
            "AssertionError", "ImportError", "NameError",
        ] {
            c.class(name, &[exception], None);
        }

        c.function("len", Fixed(Type::Int));
        c.function("range", Fixed(Type::list(Type::Int)));
        c.function("print", Fixed(Type::None));
        c.function("abs", FirstArg);
        c.function("isinstance", Fixed(Type::Bool));
        c.function("issubclass", Fixed(Type::Bool));
        c.function("hasattr", Fixed(Type::Bool));
        c.function("callable", Fixed(Type::Bool));
        c.function("getattr", Fixed(Type::Unknown));
        c.function("setattr", Fixed(Type::None));
        c.function("open", Fixed(file_instance));
        c.function("sorted", FirstArg);
        c.function("reversed", FirstArg);
        c.function("iter", FirstArg);
        c.function("filter", FirstArg);
        c.function("next", ElementOfFirstArg);
        c.function("min", ElementOfFirstArg);
        c.function("max", ElementOfFirstArg);
        c.function("sum", ElementOfFirstArg);
        c.function("repr", Fixed(Type::Str));
        c.function("input", Fixed(Type::Str));
        c.function("chr", Fixed(Type::Str));
        c.function("ord", Fixed(Type::Int));
        c.function("hash", Fixed(Type::Int));
        c.function("id", Fixed(Type::Int));
        c.function("round", Fixed(Type::Int));
        c.function("divmod", Fixed(Type::tuple(vec![Type::Int, Type::Int])));
        c.function("enumerate", Fixed(Type::list(Type::tuple(vec![Type::Int, Type::Unknown]))));
        c.function("zip", Fixed(Type::list(Type::Unknown)));
        c.function("map", Fixed(Type::list(Type::Unknown)));
        c.function("vars", Fixed(Type::dict(Type::Str, Type::Unknown)));
        c.function("globals", Fixed(Type::dict(Type::Str, Type::Unknown)));
        c.function("locals", Fixed(Type::dict(Type::Str, Type::Unknown)));
        c.function("super", Fixed(Type::Unknown));
    }
}

//! Arenas for the values shared by reference during a run
//!
//! Scopes, bindings, functions, classes and modules are created once and
//! referred to by id everywhere else. Nothing is freed until the run ends.

use crate::binding::{Binding, BindingId};
use crate::function::FunctionData;
use crate::scope::{Scope, ScopeId};
use crate::types::{ClassId, FunctionId, ModuleId, Type};
use pyflow_ast::{FileId, NodeId, Symbol};

/// A class value
#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: Symbol,
    pub node: NodeId,
    pub qname: String,
    /// Class body scope
    pub scope: ScopeId,
    /// Attributes assigned through instances; its superclass is `scope`
    pub instance_scope: ScopeId,
    pub bases: Vec<Type>,
    /// For catalog classes standing for a primitive (`int` -> `Int`)
    pub builtin_instance: Option<Type>,
}

/// A module value
#[derive(Debug, Clone)]
pub struct ModuleData {
    /// Dotted name
    pub name: String,
    pub path: String,
    pub file: FileId,
    pub scope: ScopeId,
    /// Names listed in `__all__`, when the module declares one
    pub exports: Option<Vec<Symbol>>,
}

#[derive(Debug, Default)]
pub struct Store {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    functions: Vec<FunctionData>,
    classes: Vec<ClassData>,
    modules: Vec<ModuleData>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn alloc_binding(&mut self, binding: Binding) -> BindingId {
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(binding);
        id
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0 as usize]
    }

    pub fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.0 as usize]
    }

    /// Every binding created during the run, in creation order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn alloc_function(&mut self, function: FunctionData) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn function(&self, id: FunctionId) -> &FunctionData {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
        &mut self.functions[id.0 as usize]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &FunctionData)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i as u32), f))
    }

    pub fn alloc_class(&mut self, class: ClassData) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.0 as usize]
    }

    pub fn alloc_module(&mut self, module: ModuleData) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    pub fn module(&self, id: ModuleId) -> &ModuleData {
        &self.modules[id.0 as usize]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut ModuleData {
        &mut self.modules[id.0 as usize]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &ModuleData)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    /// Join of the types of a set of bindings
    pub fn union_of_bindings<'a, I>(&self, ids: I) -> Type
    where
        I: IntoIterator<Item = &'a BindingId>,
    {
        Type::union_of(ids.into_iter().map(|id| self.binding(*id).ty.clone()))
    }
}

//! Analyzer state threaded through the visitor
//!
//! One [`AnalysisContext`] holds everything a run mutates: the arenas, the
//! global scope, the export map, the call stack and the worklists. Independent
//! engines never share state.

use crate::binding::{Binding, BindingId, BindingKind, Origin};
use crate::config::AnalyzerOptions;
use crate::diagnostics::{DiagnosticSink, Problem};
use crate::error::AnalysisError;
use crate::loader::ModuleLoader;
use crate::printer::TypePrinter;
use crate::scope::{ScopeId, ScopeKind};
use crate::stats::Statistics;
use crate::store::Store;
use crate::types::{ClassId, FunctionId, ModuleId, Type};
use pyflow_ast::{FileId, NodeId, Span, Symbol};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::trace;

pub struct AnalysisContext {
    pub(crate) store: Store,
    pub(crate) options: AnalyzerOptions,
    pub(crate) loader: Box<dyn ModuleLoader>,
    pub(crate) global_scope: ScopeId,
    /// Inferred type of every visited node
    pub(crate) exports: HashMap<NodeId, Type>,
    pub(crate) resolved: BTreeSet<NodeId>,
    pub(crate) unresolved: BTreeSet<NodeId>,
    pub(crate) diagnostics: DiagnosticSink,
    /// Source path of each analyzed file
    pub(crate) files: BTreeMap<FileId, String>,
    /// Call sites of the applications in progress
    pub(crate) call_stack: Vec<NodeId>,
    /// Functions defined but never applied
    pub(crate) uncalled: BTreeSet<FunctionId>,
    /// Paths of the modules being loaded
    pub(crate) load_stack: Vec<String>,
    /// Finished loads by canonical path; `None` for sources that failed to parse
    pub(crate) loaded: HashMap<String, Option<ModuleId>>,
    pub(crate) bound_methods: HashMap<(FunctionId, Type), FunctionId>,
    /// Branch clones being visited, innermost last
    pub(crate) branch_scopes: Vec<ScopeId>,
    /// Values yielded by the applications in progress
    pub(crate) yield_stack: Vec<Option<Type>>,
    pub(crate) stats: Statistics,
    /// First host error; surfaced by the engine after the current call
    pub(crate) fatal: Option<AnalysisError>,
    next_file: u32,
    next_synthetic: u32,
}

impl AnalysisContext {
    pub fn new(options: AnalyzerOptions, loader: Box<dyn ModuleLoader>) -> Self {
        let mut store = Store::new();
        let global_scope = store.new_scope(ScopeKind::Global, None);
        Self {
            store,
            options,
            loader,
            global_scope,
            exports: HashMap::new(),
            resolved: BTreeSet::new(),
            unresolved: BTreeSet::new(),
            diagnostics: DiagnosticSink::new(),
            files: BTreeMap::new(),
            call_stack: Vec::new(),
            uncalled: BTreeSet::new(),
            load_stack: Vec::new(),
            loaded: HashMap::new(),
            bound_methods: HashMap::new(),
            branch_scopes: Vec::new(),
            yield_stack: Vec::new(),
            stats: Statistics::new(),
            fatal: None,
            next_file: 0,
            next_synthetic: 0,
        }
    }

    /// Fresh node id for catalog entries and other values with no syntax
    pub(crate) fn synthetic_node(&mut self) -> NodeId {
        let node = NodeId::builtin(self.next_synthetic);
        self.next_synthetic += 1;
        node
    }

    /// File id for a source that is about to be decoded
    pub(crate) fn allocate_file_id(&mut self) -> FileId {
        let file = FileId::new(self.next_file);
        self.next_file += 1;
        file
    }

    /// Record a file whose ids were assigned elsewhere, keeping allocation above it
    pub(crate) fn register_file(&mut self, file: FileId, path: &str) {
        if !file.is_builtin() && file != FileId::INVALID {
            self.next_file = self.next_file.max(file.as_u32() + 1);
        }
        self.files.insert(file, path.to_string());
    }

    fn origin_of(&self, node: NodeId, qname: &str) -> Origin {
        if node.file.is_builtin() {
            return Origin::Url(format!("builtin:{}", qname));
        }
        match self.files.get(&node.file) {
            Some(path) => Origin::File(path.clone()),
            None => Origin::File(node.file.to_string()),
        }
    }

    /// The one place bindings are created, so the roster sees all of them
    pub(crate) fn create_binding(
        &mut self,
        name: Symbol,
        node: NodeId,
        span: Span,
        ty: Type,
        kind: BindingKind,
        qname: String,
    ) -> BindingId {
        let origin = self.origin_of(node, &qname);
        let mut binding = Binding::new(name, node, span, ty, kind, origin);
        binding.qname = qname;
        self.store.alloc_binding(binding)
    }

    /// Create a binding and make it the only binding of `name` in `scope`
    pub(crate) fn bind_name(
        &mut self,
        scope: ScopeId,
        name: Symbol,
        node: NodeId,
        span: Span,
        ty: Type,
        kind: BindingKind,
    ) -> BindingId {
        let qname = self.store.extend_path(scope, name.as_str());
        let id = self.create_binding(name, node, span, ty, kind, qname);
        self.store.set_binding(scope, name, id);
        id
    }

    /// A binding no source assignment produced (`__name__`, `__self__`...)
    pub(crate) fn bind_synthetic(&mut self, scope: ScopeId, name: Symbol, node: NodeId, ty: Type, kind: BindingKind) {
        let id = self.bind_name(scope, name, node, Span::default(), ty, kind);
        self.store.binding_mut(id).synthetic = true;
    }

    pub(crate) fn report(&mut self, span: Span, problem: Problem) {
        trace!(%problem, "problem");
        if self.diagnostics.report(span, problem) {
            self.stats.inc(Statistics::PROBLEMS);
        }
    }

    /// Join `ty` into the exported type of `node`
    pub(crate) fn put_export(&mut self, node: NodeId, ty: &Type) {
        self.exports
            .entry(node)
            .and_modify(|existing| *existing = existing.join(ty))
            .or_insert_with(|| ty.clone());
    }

    pub(crate) fn print(&self, ty: &Type) -> String {
        TypePrinter::new(&self.store).print(ty)
    }

    /// Look a name up in the builtins catalog
    pub fn lookup_builtin(&self, name: &str) -> Option<Type> {
        self.store.lookup_type(self.global_scope, Symbol::intern(name))
    }

    /// Catalog class standing for a primitive or container type
    pub(crate) fn catalog_class(&self, ty: &Type) -> Option<ClassId> {
        let name = match ty {
            Type::None => "NoneType",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Float => "float",
            Type::Complex => "complex",
            Type::Str => "str",
            Type::List(_) => "list",
            Type::Dict(..) => "dict",
            Type::Set(_) => "set",
            Type::Tuple { .. } => "tuple",
            _ => return None,
        };
        match self.lookup_builtin(name)? {
            Type::Class(id) => Some(id),
            _ => None,
        }
    }

    /// Scope holding the attributes of a value of type `ty`
    pub(crate) fn attribute_scope(&self, ty: &Type) -> Option<ScopeId> {
        match ty {
            Type::Instance(id) => Some(self.store.class(*id).instance_scope),
            Type::Class(id) => Some(self.store.class(*id).scope),
            Type::Module(id) => Some(self.store.module(*id).scope),
            Type::Function(id) => Some(self.store.function(*id).attr_scope),
            other => self
                .catalog_class(other)
                .map(|id| self.store.class(id).instance_scope),
        }
    }

    /// Default binding kind for names bound directly in `scope`
    pub(crate) fn kind_for_scope(&self, scope: ScopeId) -> BindingKind {
        match self.store.scope(scope).kind {
            ScopeKind::Function => BindingKind::Variable,
            ScopeKind::Class | ScopeKind::Instance => BindingKind::Attribute,
            _ => BindingKind::Scope,
        }
    }

    /// Class whose body `scope` is, looking through branch clones
    pub(crate) fn class_of_scope(&self, scope: ScopeId) -> Option<ClassId> {
        let scope = self.store.scope(scope);
        match (scope.kind, &scope.ty) {
            (ScopeKind::Class, Some(Type::Class(id))) => Some(*id),
            _ => None,
        }
    }

    /// Module whose top level `scope` is, looking through branch clones
    pub(crate) fn module_of_scope(&self, scope: ScopeId) -> Option<ModuleId> {
        let scope = self.store.scope(scope);
        match (scope.kind, &scope.ty) {
            (ScopeKind::Module, Some(Type::Module(id))) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn take_fatal(&mut self) -> Option<AnalysisError> {
        self.fatal.take()
    }

    pub(crate) fn set_fatal(&mut self, error: AnalysisError) {
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
    }
}

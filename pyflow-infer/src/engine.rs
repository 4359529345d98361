//! Engine driver
//!
//! ```text
//! Engine::new -> analyze_* (initial pass, one call per entry module)
//!             -> finish   (uncalled-function convergence, unused names)
//!             -> AnalysisResults
//! ```
//!
//! Results are only meaningful after `finish`: until every defined function
//! has been applied, exported types may still widen.

use crate::binding::{Binding, BindingKind};
use crate::builtins::{BuiltinCatalog, CatalogBuilder, StandardBuiltins};
use crate::config::AnalyzerOptions;
use crate::context::AnalysisContext;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Problem};
use crate::error::{AnalysisError, Result};
use crate::function::Arrows;
use crate::loader::{module_name_for, FsLoader, ModuleLoader, ModuleSource, MODULE_EXTENSION};
use crate::printer::TypePrinter;
use crate::stats::Statistics;
use crate::store::Store;
use crate::types::{FunctionId, ModuleId, Type};
use pyflow_ast::{FileId, Module, NodeId, Symbol};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct Engine {
    ctx: AnalysisContext,
}

impl Engine {
    pub fn new(options: AnalyzerOptions, loader: Box<dyn ModuleLoader>, catalog: &dyn BuiltinCatalog) -> Self {
        let mut ctx = AnalysisContext::new(options, loader);
        catalog.populate(&mut CatalogBuilder::new(&mut ctx));
        Self { ctx }
    }

    /// Engine with the standard builtins
    pub fn with_loader(options: AnalyzerOptions, loader: Box<dyn ModuleLoader>) -> Self {
        Self::new(options, loader, &StandardBuiltins)
    }

    /// Engine reading serialized trees from disk
    pub fn from_fs(options: AnalyzerOptions) -> Self {
        Self::with_loader(options, Box::new(FsLoader::new()))
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.ctx.options
    }

    pub fn lookup_builtin(&self, name: &str) -> Option<Type> {
        self.ctx.lookup_builtin(name)
    }

    /// Analyze a tree whose node ids are already assigned
    pub fn analyze_module(&mut self, module: Module) -> Result<ModuleId> {
        let path = AnalysisContext::default_path(&module);
        let name = module.name.clone();
        let id = self
            .ctx
            .load_source(&name, ModuleSource::Tree { path, module })
            .ok_or_else(|| AnalysisError::loader(&name, "module could not be analyzed"))?;
        self.check_fatal()?;
        Ok(id)
    }

    /// Decode and analyze a serialized tree. `Ok(None)` when it fails to parse;
    /// the failure is recorded as a diagnostic.
    pub fn analyze_source(&mut self, path: &str, text: &str) -> Result<Option<ModuleId>> {
        let name = module_name_for(Path::new(path));
        self.analyze_named_source(&name, path, text)
    }

    fn analyze_named_source(&mut self, name: &str, path: &str, text: &str) -> Result<Option<ModuleId>> {
        if let Some(loaded) = self.ctx.loaded.get(path) {
            return Ok(*loaded);
        }
        let source = ModuleSource::Text {
            path: path.to_string(),
            text: text.to_string(),
        };
        let id = self.ctx.load_source(name, source);
        self.check_fatal()?;
        Ok(id)
    }

    /// Load a module by dotted name through the loader, as an import would
    pub fn load_module(&mut self, dotted: &str) -> Result<Option<ModuleId>> {
        let outcome = self.ctx.try_load_module(dotted);
        self.check_fatal()?;
        Ok(match outcome {
            crate::visitor::LoadOutcome::Loaded(id) => Some(id),
            _ => None,
        })
    }

    /// Read and analyze one serialized tree from disk
    pub fn analyze_file(&mut self, path: &Path) -> Result<Option<ModuleId>> {
        let text = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let name = match path.parent() {
            Some(parent) => {
                let relative = self
                    .ctx
                    .options
                    .search_path
                    .iter()
                    .find_map(|root| path.strip_prefix(root).ok())
                    .unwrap_or_else(|| path.strip_prefix(parent).unwrap_or(path));
                module_name_for(relative)
            }
            None => module_name_for(path),
        };
        self.analyze_named_source(&name, &path.to_string_lossy(), &text)
    }

    /// Analyze every serialized tree below `root`, which also becomes a search root
    pub fn analyze_dir(&mut self, root: &Path) -> Result<Vec<ModuleId>> {
        let root_buf = root.to_path_buf();
        if !self.ctx.options.search_path.contains(&root_buf) {
            self.ctx.options.search_path.push(root_buf);
        }
        let mut files = Vec::new();
        collect_module_files(root, &mut files)?;
        files.sort();
        debug!(root = %root.display(), count = files.len(), "analyzing directory");

        let mut modules = Vec::new();
        for file in files {
            if let Some(id) = self.analyze_file(&file)? {
                modules.push(id);
            }
        }
        Ok(modules)
    }

    fn check_fatal(&mut self) -> Result<()> {
        match self.ctx.take_fatal() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Apply every function that was never called, then report unused names
    pub fn finish(mut self) -> Result<AnalysisResults> {
        if self.ctx.options.force_uncalled {
            let mut forced = 0usize;
            while let Some(function) = self.ctx.uncalled.pop_first() {
                self.ctx.apply_uncalled(function);
                forced += 1;
            }
            debug!(forced, "applied uncalled functions");
        }
        self.check_fatal()?;

        if self.ctx.options.report_unused {
            self.report_unused();
        }

        let ctx = self.ctx;
        if !ctx.options.quiet {
            info!(
                modules = ctx.stats.get(Statistics::MODULES_LOADED),
                problems = ctx.diagnostics.len(),
                "analysis finished"
            );
        }
        Ok(AnalysisResults {
            store: ctx.store,
            exports: ctx.exports,
            diagnostics: ctx.diagnostics,
            files: ctx.files,
            resolved: ctx.resolved,
            unresolved: ctx.unresolved,
            stats: ctx.stats,
        })
    }

    fn report_unused(&mut self) {
        let mut seen = HashSet::new();
        let mut unused = Vec::new();
        for binding in self.ctx.store.bindings() {
            let candidate = matches!(binding.kind, BindingKind::Variable | BindingKind::Parameter)
                && !binding.builtin
                && !binding.synthetic
                && !binding.is_referenced()
                && !binding.name.is_private()
                && binding.name != pyflow_ast::names::SELF();
            if candidate && seen.insert(binding.clone()) {
                unused.push((binding.span, binding.name.to_string()));
            }
        }
        for (span, name) in unused {
            self.ctx.report(span, Problem::UnusedVariable { name });
        }
    }
}

fn collect_module_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| AnalysisError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| AnalysisError::io(dir, e))?.path();
        if path.is_dir() {
            collect_module_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

/// Everything a finished run produced
pub struct AnalysisResults {
    store: Store,
    exports: HashMap<NodeId, Type>,
    diagnostics: DiagnosticSink,
    files: BTreeMap<FileId, String>,
    resolved: BTreeSet<NodeId>,
    unresolved: BTreeSet<NodeId>,
    stats: Statistics,
}

impl AnalysisResults {
    /// Inferred type of a node
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.exports.get(&node)
    }

    pub fn exports(&self) -> &HashMap<NodeId, Type> {
        &self.exports
    }

    pub fn display_type(&self, ty: &Type) -> String {
        TypePrinter::new(&self.store).print(ty)
    }

    pub fn display_binding(&self, binding: &Binding) -> String {
        TypePrinter::new(&self.store).print_binding(binding)
    }

    /// The binding roster
    pub fn bindings(&self) -> &[Binding] {
        self.store.bindings()
    }

    pub fn bindings_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Binding> + 'a {
        let name = Symbol::intern(name);
        self.store.bindings().iter().filter(move |b| b.name == name)
    }

    pub fn diagnostics(&self, file: FileId) -> &[Diagnostic] {
        self.diagnostics.for_file(file)
    }

    pub fn all_diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn file_path(&self, file: FileId) -> Option<&str> {
        self.files.get(&file).map(String::as_str)
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &str)> {
        self.files.iter().map(|(id, path)| (*id, path.as_str()))
    }

    pub fn module_named(&self, name: &str) -> Option<ModuleId> {
        self.store
            .modules()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Type of a top-level name of a module
    pub fn module_type(&self, module: ModuleId, name: &str) -> Option<Type> {
        let scope = self.store.module(module).scope;
        self.store
            .lookup_local(scope, Symbol::intern(name))
            .map(|bindings| self.store.union_of_bindings(bindings.iter()))
    }

    /// Unbound source function with this qualified name
    pub fn function_named(&self, qname: &str) -> Option<FunctionId> {
        self.store
            .functions()
            .find(|(_, f)| f.qname == qname && f.origin.is_none() && !f.is_builtin())
            .map(|(id, _)| id)
    }

    pub fn function_arrows(&self, function: FunctionId) -> &Arrows {
        &self.store.function(function).arrows
    }

    pub fn resolved(&self) -> &BTreeSet<NodeId> {
        &self.resolved
    }

    pub fn unresolved(&self) -> &BTreeSet<NodeId> {
        &self.unresolved
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

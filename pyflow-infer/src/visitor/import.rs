//! Imports and module loading

use crate::binding::BindingKind;
use crate::context::AnalysisContext;
use crate::diagnostics::Problem;
use crate::loader::{candidate_paths, ModuleSource};
use crate::scope::{ScopeId, ScopeKind};
use crate::stats::Statistics;
use crate::store::ModuleData;
use crate::types::{ModuleId, Type};
use pyflow_ast::{decode_module, names, Alias, ByteOffset, DottedName, FileId, Module, Span, Symbol};
use tracing::{debug, trace, warn};

/// Result of asking for a module by name
pub(crate) enum LoadOutcome {
    Loaded(ModuleId),
    /// Still being loaded further up the stack, or failed to parse
    Unavailable,
    Missing,
}

impl AnalysisContext {
    pub(crate) fn visit_import(&mut self, aliases: &[Alias], span: Span, scope: ScopeId) {
        for alias in aliases {
            let dotted = alias.name.to_dotted();
            if let Some(asname) = &alias.asname {
                let ty = self.load_module(&dotted, span).map_or(Type::Unknown, Type::Module);
                self.bind_name(scope, asname.name, asname.id, asname.span, ty.clone(), BindingKind::Module);
                self.put_export(asname.id, &ty);
                continue;
            }

            // `import a.b.c` binds `a`; each module's scope then holds the next one.
            let mut target = scope;
            let mut prefix = String::new();
            for part in &alias.name.parts {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(part.name.as_str());
                let module = self.load_module(&prefix, span);
                let ty = module.map_or(Type::Unknown, Type::Module);
                self.bind_name(target, part.name, part.id, part.span, ty.clone(), BindingKind::Module);
                self.put_export(part.id, &ty);
                match module {
                    Some(id) => target = self.store.module(id).scope,
                    None => break,
                }
            }
        }
    }

    pub(crate) fn visit_import_from(&mut self, module: &DottedName, aliases: &[Alias], wildcard: bool, scope: ScopeId) {
        let dotted = module.to_dotted();
        let Some(id) = self.load_module(&dotted, module.span()) else {
            for alias in aliases {
                let local = alias.asname.as_ref().or_else(|| alias.name.parts.last());
                if let Some(local) = local {
                    self.bind_name(scope, local.name, local.id, local.span, Type::Unknown, BindingKind::Variable);
                }
            }
            return;
        };
        let module_scope = self.store.module(id).scope;

        if wildcard {
            let exported: Vec<Symbol> = match &self.store.module(id).exports {
                Some(exports) => exports.clone(),
                None => self
                    .store
                    .scope(module_scope)
                    .names()
                    .filter(|n| !n.is_private())
                    .copied()
                    .collect(),
            };
            for name in exported {
                if let Some(bindings) = self.store.lookup_local(module_scope, name) {
                    self.store.set_bindings(scope, name, bindings);
                }
            }
            return;
        }

        for alias in aliases {
            let Some(imported) = alias.name.parts.last() else { continue };
            let local = alias.asname.as_ref().unwrap_or(imported);
            match self.store.lookup_local(module_scope, imported.name) {
                Some(bindings) => {
                    for binding in bindings.iter() {
                        self.store.binding_mut(*binding).add_reference(imported.id);
                    }
                    let ty = self.store.union_of_bindings(bindings.iter());
                    self.put_export(imported.id, &ty);
                    self.put_export(local.id, &ty);
                    self.store.set_bindings(scope, local.name, bindings);
                }
                None => {
                    // `from pkg import mod` may name a submodule.
                    let submodule = format!("{}.{}", dotted, imported.name);
                    let ty = match self.try_load_module(&submodule) {
                        LoadOutcome::Loaded(sub) => Type::Module(sub),
                        LoadOutcome::Unavailable => Type::Unknown,
                        LoadOutcome::Missing => {
                            let ty = self.store.module(id).name.clone();
                            self.report(imported.span, Problem::AttributeNotFound { ty });
                            Type::Unknown
                        }
                    };
                    if let Type::Module(_) = ty {
                        self.bind_name(module_scope, imported.name, imported.id, imported.span, ty.clone(), BindingKind::Module);
                    }
                    self.bind_name(scope, local.name, local.id, local.span, ty.clone(), BindingKind::Module);
                    self.put_export(local.id, &ty);
                }
            }
        }
    }

    /// Load a module by dotted name, reporting it when it does not exist
    pub(crate) fn load_module(&mut self, dotted: &str, span: Span) -> Option<ModuleId> {
        match self.try_load_module(dotted) {
            LoadOutcome::Loaded(id) => Some(id),
            LoadOutcome::Unavailable => None,
            LoadOutcome::Missing => {
                self.report(span, Problem::CannotLoadModule { name: dotted.to_string() });
                None
            }
        }
    }

    pub(crate) fn try_load_module(&mut self, dotted: &str) -> LoadOutcome {
        let source = match self.loader.resolve(dotted, &self.options.search_path) {
            Ok(Some(source)) => source,
            Ok(None) => return LoadOutcome::Missing,
            Err(error) => {
                warn!(module = dotted, %error, "module loader failed");
                self.set_fatal(error);
                return LoadOutcome::Unavailable;
            }
        };
        let path = source.path().to_string();
        if let Some(loaded) = self.loaded.get(&path) {
            return loaded.map_or(LoadOutcome::Unavailable, LoadOutcome::Loaded);
        }
        if self.load_stack.contains(&path) {
            trace!(module = dotted, "import cycle");
            return LoadOutcome::Unavailable;
        }
        match self.load_source(dotted, source) {
            Some(id) => LoadOutcome::Loaded(id),
            None => LoadOutcome::Unavailable,
        }
    }

    /// Decode a source if needed and analyze it as module `name`
    pub(crate) fn load_source(&mut self, name: &str, source: ModuleSource) -> Option<ModuleId> {
        match source {
            ModuleSource::Tree { path, mut module } => {
                if module.id.file == FileId::INVALID {
                    let file = self.allocate_file_id();
                    pyflow_ast::json::assign_ids(&mut module, file);
                }
                Some(self.analyze_module_tree(name, &path, &module))
            }
            ModuleSource::Text { path, text } => {
                let file = self.allocate_file_id();
                match decode_module(&text, file) {
                    Ok(module) => Some(self.analyze_module_tree(name, &path, &module)),
                    Err(error) => {
                        warn!(path = %path, %error, "skipping module that failed to parse");
                        self.files.insert(file, path.clone());
                        self.stats.inc(Statistics::PARSE_FAILURES);
                        let span = Span::new(file, ByteOffset(0), ByteOffset(0));
                        self.report(
                            span,
                            Problem::ParseFailure {
                                path: path.clone(),
                                message: error.to_string(),
                            },
                        );
                        self.loaded.insert(path, None);
                        None
                    }
                }
            }
        }
    }

    /// Visit a module body in a fresh module scope under the global scope
    pub(crate) fn analyze_module_tree(&mut self, name: &str, path: &str, module: &Module) -> ModuleId {
        if let Some(Some(id)) = self.loaded.get(path) {
            return *id;
        }
        let file = module.id.file;
        self.register_file(file, path);

        let scope = self.store.new_scope(ScopeKind::Module, Some(self.global_scope));
        self.store.scope_mut(scope).path = name.to_string();
        let id = self.store.alloc_module(ModuleData {
            name: name.to_string(),
            path: path.to_string(),
            file,
            scope,
            exports: None,
        });
        self.store.scope_mut(scope).ty = Some(Type::Module(id));
        self.put_export(module.id, &Type::Module(id));
        for special in [names::NAME(), names::FILE()] {
            self.bind_synthetic(scope, special, module.id, Type::Str, BindingKind::Scope);
        }

        debug!(module = name, path, "analyzing module");
        self.stats.inc(Statistics::MODULES_LOADED);
        self.load_stack.push(path.to_string());
        self.visit_block(&module.body, scope);
        self.load_stack.pop();
        self.loaded.insert(path.to_string(), Some(id));
        id
    }

    /// Canonical path for a tree handed over without one
    pub(crate) fn default_path(module: &Module) -> String {
        let [path, _] = candidate_paths(&module.name);
        module.path.clone().unwrap_or(path)
    }
}

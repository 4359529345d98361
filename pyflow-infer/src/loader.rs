//! Module loading
//!
//! The engine asks a [`ModuleLoader`] to turn a dotted module name into a
//! source. Sources are serialized trees (`a/b.json` or `a/b/__init__.json`
//! below a search root); in-memory loaders may also hand over trees that
//! are already built.

use crate::error::{AnalysisError, Result};
use pyflow_ast::Module;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Extension of serialized module trees
pub const MODULE_EXTENSION: &str = "json";

/// A resolved module
#[derive(Debug, Clone)]
pub enum ModuleSource {
    /// Serialized tree; node ids are assigned when it is decoded
    Text { path: String, text: String },
    /// Tree built in memory, node ids already assigned
    Tree { path: String, module: Module },
}

impl ModuleSource {
    /// Canonical path, used to memoize loads
    pub fn path(&self) -> &str {
        match self {
            ModuleSource::Text { path, .. } | ModuleSource::Tree { path, .. } => path,
        }
    }
}

pub trait ModuleLoader {
    /// Resolve `dotted` against the search roots; `Ok(None)` when no such module exists
    fn resolve(&self, dotted: &str, search_path: &[PathBuf]) -> Result<Option<ModuleSource>>;
}

/// Relative file names a dotted module name may live at
pub fn candidate_paths(dotted: &str) -> [String; 2] {
    let base = dotted.replace('.', "/");
    [
        format!("{}.{}", base, MODULE_EXTENSION),
        format!("{}/__init__.{}", base, MODULE_EXTENSION),
    ]
}

/// Dotted module name for a path relative to a search root
pub fn module_name_for(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.last().map(String::as_str) == Some("__init__") {
        parts.pop();
    }
    parts.join(".")
}

fn join_root(root: &Path, relative: &str) -> String {
    let root = root.to_string_lossy();
    let root = root.trim_end_matches('/');
    if root.is_empty() || root == "." {
        relative.to_string()
    } else {
        format!("{}/{}", root, relative)
    }
}

/// In-memory file system
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<String, MemoryFile>,
}

#[derive(Debug, Clone)]
enum MemoryFile {
    Text(String),
    Tree(Module),
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add serialized tree text at `path`
    pub fn add_source(&mut self, path: &str, text: &str) -> &mut Self {
        self.files.insert(path.to_string(), MemoryFile::Text(text.to_string()));
        self
    }

    /// Add a built tree at `path`
    pub fn add_tree(&mut self, path: &str, module: Module) -> &mut Self {
        self.files.insert(path.to_string(), MemoryFile::Tree(module));
        self
    }

    /// Add a built tree under its dotted module name
    pub fn add_module(&mut self, module: Module) -> &mut Self {
        let [path, _] = candidate_paths(&module.name);
        self.add_tree(&path, module)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

impl ModuleLoader for MemoryLoader {
    fn resolve(&self, dotted: &str, search_path: &[PathBuf]) -> Result<Option<ModuleSource>> {
        let default_root = [PathBuf::new()];
        let roots = if search_path.is_empty() { &default_root[..] } else { search_path };
        for root in roots {
            for candidate in candidate_paths(dotted) {
                let path = join_root(root, &candidate);
                if let Some(file) = self.files.get(&path) {
                    trace!(module = dotted, path = %path, "resolved in memory");
                    let source = match file {
                        MemoryFile::Text(text) => ModuleSource::Text {
                            path,
                            text: text.clone(),
                        },
                        MemoryFile::Tree(module) => ModuleSource::Tree {
                            path,
                            module: module.clone(),
                        },
                    };
                    return Ok(Some(source));
                }
            }
        }
        Ok(None)
    }
}

/// Loader reading serialized trees from disk
#[derive(Debug, Default, Clone)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        FsLoader
    }
}

impl ModuleLoader for FsLoader {
    fn resolve(&self, dotted: &str, search_path: &[PathBuf]) -> Result<Option<ModuleSource>> {
        let default_root = [PathBuf::from(".")];
        let roots = if search_path.is_empty() { &default_root[..] } else { search_path };
        for root in roots {
            for candidate in candidate_paths(dotted) {
                let path = root.join(&candidate);
                if !path.is_file() {
                    continue;
                }
                let text = fs::read_to_string(&path).map_err(|e| AnalysisError::io(&path, e))?;
                trace!(module = dotted, path = %path.display(), "resolved on disk");
                return Ok(Some(ModuleSource::Text {
                    path: path.to_string_lossy().into_owned(),
                    text,
                }));
            }
        }
        Ok(None)
    }
}

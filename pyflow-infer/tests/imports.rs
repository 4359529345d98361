//! Module loading and import binding tests

use pyflow_ast::{encode_module, FileId, Module};
use pyflow_builder::AstBuilder;
use pyflow_infer::{AnalysisResults, AnalyzerOptions, Engine, MemoryLoader, Statistics, Type};
use std::fs;
use tempfile::TempDir;

fn run(loader: MemoryLoader, main: Module) -> AnalysisResults {
    let mut engine = Engine::with_loader(AnalyzerOptions::default(), Box::new(loader));
    engine.analyze_module(main).expect("main should be analyzed");
    engine.finish().expect("analysis should finish")
}

fn name_type(results: &AnalysisResults, module: &str, name: &str) -> Type {
    let module = results.module_named(module).expect("module loaded");
    results.module_type(module, name).unwrap_or(Type::Unknown)
}

fn messages(results: &AnalysisResults) -> Vec<String> {
    results
        .all_diagnostics()
        .iter()
        .map(|(_, d)| d.message())
        .collect()
}

fn library(file: u32) -> Module {
    let b = AstBuilder::new(FileId::new(file));
    b.module("lib")
        .stmt(b.assign(b.name("__all__"), b.list(vec![b.str("answer"), b.str("twice")])))
        .stmt(b.assign(b.name("answer"), b.int(42)))
        .stmt(b.assign(b.name("hidden"), b.str("h")))
        .stmt(b.def("twice", &["x"], vec![b.ret(b.binop(b.name("x"), pyflow_ast::Operator::Add, b.name("x")))]))
        .build()
}

#[test]
fn test_import_binds_module() {
    let mut loader = MemoryLoader::new();
    loader.add_module(library(1));

    let b = AstBuilder::new(FileId::new(0));
    let main = b
        .module("main")
        .stmt(b.import("lib", None))
        .stmt(b.assign(b.name("a"), b.attr(b.name("lib"), "answer")))
        .stmt(b.assign(b.name("t"), b.method_call(b.name("lib"), "twice", vec![b.float(1.5)])))
        .build();
    let results = run(loader, main);

    let lib = results.module_named("lib").expect("lib loaded");
    assert_eq!(name_type(&results, "main", "lib"), Type::Module(lib));
    assert_eq!(name_type(&results, "main", "a"), Type::Int);
    assert_eq!(name_type(&results, "main", "t"), Type::Float);
    assert_eq!(results.file_path(FileId::new(1)), Some("lib.json"));
    assert_eq!(results.stats().get(Statistics::MODULES_LOADED), 2);
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_from_import_shares_bindings() {
    let mut loader = MemoryLoader::new();
    loader.add_module(library(1));

    let b = AstBuilder::new(FileId::new(0));
    let main = b
        .module("main")
        .stmt(b.from_import("lib", &["answer", "nothing"]))
        .build();
    let results = run(loader, main);

    assert_eq!(name_type(&results, "main", "answer"), Type::Int);
    assert!(messages(&results).contains(&"attribute not found in type: lib.".to_string()));

    let answer = results
        .bindings_named("answer")
        .next()
        .expect("answer binding");
    assert!(answer.is_referenced());
}

#[test]
fn test_wildcard_import_honors_all() {
    let mut loader = MemoryLoader::new();
    loader.add_module(library(1));

    let b = AstBuilder::new(FileId::new(0));
    let main = b.module("main").stmt(b.from_import_all("lib")).build();
    let results = run(loader, main);

    let main = results.module_named("main").expect("main");
    assert_eq!(results.module_type(main, "answer"), Some(Type::Int));
    assert!(matches!(results.module_type(main, "twice"), Some(Type::Function(_))));
    assert_eq!(results.module_type(main, "hidden"), None);
}

#[test]
fn test_wildcard_import_skips_private_names() {
    let mut loader = MemoryLoader::new();
    let lb = AstBuilder::new(FileId::new(1));
    loader.add_module(
        lb.module("util")
            .stmt(lb.assign(lb.name("public"), lb.int(1)))
            .stmt(lb.assign(lb.name("_private"), lb.int(2)))
            .build(),
    );

    let b = AstBuilder::new(FileId::new(0));
    let main = b.module("main").stmt(b.from_import_all("util")).build();
    let results = run(loader, main);

    let main = results.module_named("main").expect("main");
    assert_eq!(results.module_type(main, "public"), Some(Type::Int));
    assert_eq!(results.module_type(main, "_private"), None);
}

#[test]
fn test_dotted_import_and_submodules() {
    let mut loader = MemoryLoader::new();
    let pb = AstBuilder::new(FileId::new(1));
    loader.add_tree("pkg/__init__.json", pb.module("pkg").build());
    let ub = AstBuilder::new(FileId::new(2));
    loader.add_module(
        ub.module("pkg.util")
            .stmt(ub.def("name", &[], vec![ub.ret(ub.str("util"))]))
            .build(),
    );

    let b = AstBuilder::new(FileId::new(0));
    let main = b
        .module("main")
        .stmt(b.import("pkg.util", None))
        .stmt(b.assign(
            b.name("n"),
            b.method_call(b.attr(b.name("pkg"), "util"), "name", vec![]),
        ))
        .stmt(b.from_import("pkg", &["util"]))
        .build();
    let results = run(loader, main);

    let pkg = results.module_named("pkg").expect("pkg");
    let util = results.module_named("pkg.util").expect("pkg.util");
    assert_eq!(name_type(&results, "main", "pkg"), Type::Module(pkg));
    assert_eq!(results.module_type(pkg, "util"), Some(Type::Module(util)));
    assert_eq!(name_type(&results, "main", "n"), Type::Str);
    assert_eq!(name_type(&results, "main", "util"), Type::Module(util));
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_import_alias() {
    let mut loader = MemoryLoader::new();
    loader.add_module(library(1));

    let b = AstBuilder::new(FileId::new(0));
    let main = b
        .module("main")
        .stmt(b.import("lib", Some("l")))
        .stmt(b.assign(b.name("a"), b.attr(b.name("l"), "answer")))
        .build();
    let results = run(loader, main);

    assert_eq!(name_type(&results, "main", "a"), Type::Int);
    assert_eq!(results.module_type(results.module_named("main").unwrap(), "lib"), None);
}

#[test]
fn test_circular_imports_terminate() {
    let mut loader = MemoryLoader::new();
    let ab = AstBuilder::new(FileId::new(1));
    loader.add_module(
        ab.module("a")
            .stmt(ab.import("b", None))
            .stmt(ab.assign(ab.name("x"), ab.int(1)))
            .build(),
    );
    let bb = AstBuilder::new(FileId::new(2));
    loader.add_module(
        bb.module("b")
            .stmt(bb.import("a", None))
            .stmt(bb.assign(bb.name("y"), bb.str("s")))
            .build(),
    );

    let mut engine = Engine::with_loader(AnalyzerOptions::default(), Box::new(loader));
    let a = engine.load_module("a").unwrap().expect("a loads");
    let results = engine.finish().unwrap();

    let b = results.module_named("b").expect("b loaded through a");
    assert_eq!(results.module_type(a, "b"), Some(Type::Module(b)));
    assert_eq!(results.module_type(b, "a"), Some(Type::Unknown));
    assert_eq!(results.module_type(b, "y"), Some(Type::Str));
    assert_eq!(results.stats().get(Statistics::MODULES_LOADED), 2);
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_missing_module_is_reported() {
    let b = AstBuilder::new(FileId::new(0));
    let main = b
        .module("main")
        .stmt(b.import("nowhere", None))
        .stmt(b.from_import("elsewhere", &["thing"]))
        .build();
    let results = run(MemoryLoader::new(), main);

    let messages = messages(&results);
    assert!(messages.contains(&"Cannot load module nowhere.".to_string()));
    assert!(messages.contains(&"Cannot load module elsewhere.".to_string()));
    assert_eq!(name_type(&results, "main", "nowhere"), Type::Unknown);
    assert_eq!(name_type(&results, "main", "thing"), Type::Unknown);
}

#[test]
fn test_serialized_sources_and_parse_failures() {
    let mut loader = MemoryLoader::new();
    let text = encode_module(&library(7)).unwrap();
    loader.add_source("lib.json", &text);
    loader.add_source("broken.json", "{ this is not a tree");

    let b = AstBuilder::new(FileId::new(0));
    let main = b
        .module("main")
        .stmt(b.import("lib", None))
        .stmt(b.import("broken", None))
        .stmt(b.assign(b.name("a"), b.attr(b.name("lib"), "answer")))
        .build();
    let results = run(loader, main);

    assert_eq!(name_type(&results, "main", "a"), Type::Int);
    assert_eq!(name_type(&results, "main", "broken"), Type::Unknown);
    assert_eq!(results.stats().get(Statistics::PARSE_FAILURES), 1);

    let messages = messages(&results);
    assert!(messages.iter().any(|m| m.starts_with("Failed to parse broken.json")));
    assert!(!messages.iter().any(|m| m.starts_with("Cannot load module")));
}

#[test]
fn test_analyze_source_text() {
    let mut loader = MemoryLoader::new();
    loader.add_module(library(1));

    let b = AstBuilder::new(FileId::new(0));
    let tool = b
        .module("tool")
        .stmt(b.from_import("lib", &["answer"]))
        .stmt(b.assign(b.name("n"), b.name("answer")))
        .build();
    let text = encode_module(&tool).unwrap();

    let mut engine = Engine::with_loader(AnalyzerOptions::default(), Box::new(loader));
    let id = engine
        .analyze_source("tools/tool.json", &text)
        .unwrap()
        .expect("tool should decode");
    // a path is only analyzed once
    assert_eq!(engine.analyze_source("tools/tool.json", &text).unwrap(), Some(id));
    assert_eq!(engine.analyze_source("bad.json", "[").unwrap(), None);
    let results = engine.finish().unwrap();

    assert_eq!(results.module_named("tools.tool"), Some(id));
    assert_eq!(name_type(&results, "tools.tool", "n"), Type::Int);
    assert_eq!(results.stats().get(Statistics::PARSE_FAILURES), 1);
    assert_eq!(results.stats().get(Statistics::MODULES_LOADED), 2);
}

#[test]
fn test_analyze_directory() {
    let dir = TempDir::new().unwrap();
    let lb = AstBuilder::new(FileId::new(0));
    let lib = lb
        .module("lib")
        .stmt(lb.def("greet", &["who"], vec![lb.ret(lb.name("who"))]))
        .build();
    let mb = AstBuilder::new(FileId::new(0));
    let main = mb
        .module("main")
        .stmt(mb.from_import("lib", &["greet"]))
        .stmt(mb.assign(mb.name("g"), mb.call(mb.name("greet"), vec![mb.str("you")])))
        .build();
    fs::write(dir.path().join("lib.json"), encode_module(&lib).unwrap()).unwrap();
    fs::write(dir.path().join("main.json"), encode_module(&main).unwrap()).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let mut engine = Engine::from_fs(AnalyzerOptions::default());
    let modules = engine.analyze_dir(dir.path()).unwrap();
    assert_eq!(modules.len(), 2);
    let results = engine.finish().unwrap();

    assert_eq!(results.stats().get(Statistics::MODULES_LOADED), 2);
    assert_eq!(name_type(&results, "main", "g"), Type::Str);
    assert_eq!(results.files().count(), 2);
}

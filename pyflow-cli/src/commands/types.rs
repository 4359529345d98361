//! Inferred types of top-level names

use super::{run_analysis, Outcome};
use crate::config::CliConfig;
use crate::utils::print_module_heading;
use crate::AnalyzeArgs;
use anyhow::{bail, Result};
use colored::*;
use pyflow_infer::AnalysisResults;

pub fn types_command(args: &AnalyzeArgs, config: &CliConfig, module: Option<&str>, private: bool) -> Result<Outcome> {
    let (results, _) = run_analysis(args, config)?;
    if let Some(name) = module {
        if results.module_named(name).is_none() {
            bail!("Module not found: {}", name);
        }
    }
    print_module_types(&results, module, private);
    Ok(Outcome::Clean)
}

pub fn print_module_types(results: &AnalysisResults, only: Option<&str>, private: bool) {
    for (module, lines) in module_types(results, only, private) {
        let path = results
            .module_named(&module)
            .map(|id| results.store().module(id).path.clone())
            .unwrap_or_default();
        print_module_heading(&module, &path);
        for (name, ty) in lines {
            println!("  {} : {}", name.cyan(), ty);
        }
    }
}

/// `(module name, [(name, printed type)])` for every analyzed module
pub fn module_types(results: &AnalysisResults, only: Option<&str>, private: bool) -> Vec<(String, Vec<(String, String)>)> {
    let store = results.store();
    let mut modules: Vec<_> = store
        .modules()
        .filter(|(_, data)| only.map_or(true, |name| data.name == name))
        .collect();
    modules.sort_by(|a, b| a.1.name.cmp(&b.1.name));

    modules
        .into_iter()
        .map(|(id, data)| {
            let names: Vec<_> = store
                .scope(data.scope)
                .names()
                .filter(|name| private || !name.is_private())
                .copied()
                .collect();
            let lines = names
                .into_iter()
                .filter_map(|name| {
                    let ty = results.module_type(id, name.as_str())?;
                    Some((name.to_string(), results.display_type(&ty)))
                })
                .collect();
            (data.name.clone(), lines)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::FileId;
    use pyflow_builder::AstBuilder;
    use pyflow_infer::{Engine, MemoryLoader};

    #[test]
    fn test_module_types_lists_public_names() {
        let b = AstBuilder::new(FileId::new(0));
        let module = b
            .module("m")
            .stmt(b.def("ident", &["x"], vec![b.ret(b.name("x"))]))
            .stmt(b.assign(b.name("v"), b.call(b.name("ident"), vec![b.int(1)])))
            .stmt(b.assign(b.name("_hidden"), b.str("h")))
            .build();
        let mut engine = Engine::with_loader(Default::default(), Box::new(MemoryLoader::new()));
        engine.analyze_module(module).unwrap();
        let results = engine.finish().unwrap();

        let listed = module_types(&results, Some("m"), false);
        assert_eq!(listed.len(), 1);
        let (name, lines) = &listed[0];
        assert_eq!(name, "m");
        assert!(lines.contains(&("ident".to_string(), "(int) -> int".to_string())));
        assert!(lines.contains(&("v".to_string(), "int".to_string())));
        assert!(!lines.iter().any(|(n, _)| n.starts_with('_')));

        let with_private = module_types(&results, Some("m"), true);
        assert!(with_private[0].1.iter().any(|(n, _)| n == "_hidden"));
    }
}

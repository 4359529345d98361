//! Binding roster dump

use super::{run_analysis, Outcome};
use crate::config::CliConfig;
use crate::AnalyzeArgs;
use anyhow::Result;
use pyflow_infer::AnalysisResults;

pub fn roster_command(args: &AnalyzeArgs, config: &CliConfig, name: Option<&str>, builtins: bool) -> Result<Outcome> {
    let (results, _) = run_analysis(args, config)?;
    for line in roster_lines(&results, name, builtins) {
        println!("{}", line);
    }
    Ok(Outcome::Clean)
}

/// One rendered binding per line, in creation order
pub fn roster_lines(results: &AnalysisResults, name: Option<&str>, builtins: bool) -> Vec<String> {
    results
        .bindings()
        .iter()
        .filter(|binding| builtins || !binding.builtin)
        .filter(|binding| name.map_or(true, |n| binding.name.as_str() == n))
        .map(|binding| results.display_binding(binding))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::FileId;
    use pyflow_builder::AstBuilder;
    use pyflow_infer::{Engine, MemoryLoader};

    #[test]
    fn test_roster_filters() {
        let b = AstBuilder::new(FileId::new(0));
        let module = b
            .module("m")
            .stmt(b.assign(b.name("x"), b.int(1)))
            .stmt(b.assign(b.name("y"), b.name("x")))
            .build();
        let mut engine = Engine::with_loader(Default::default(), Box::new(MemoryLoader::new()));
        engine.analyze_module(module).unwrap();
        let results = engine.finish().unwrap();

        let xs = roster_lines(&results, Some("x"), false);
        assert_eq!(xs.len(), 1);
        assert!(xs[0].contains(":type=int:qname=m.x:refs=[file:0#"));

        let all = roster_lines(&results, None, false);
        let with_catalog = roster_lines(&results, None, true);
        assert!(with_catalog.len() > all.len());
        assert!(roster_lines(&results, Some("len"), true).len() == 1);
    }
}

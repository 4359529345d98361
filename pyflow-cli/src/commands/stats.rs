//! Run statistics

use super::{run_analysis, Outcome};
use crate::config::CliConfig;
use crate::utils::{format_elapsed, DiagnosticCounts, TableBuilder};
use crate::AnalyzeArgs;
use anyhow::{bail, Context, Result};
use colored::*;
use pyflow_infer::AnalysisResults;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub fn stats_command(args: &AnalyzeArgs, config: &CliConfig, format: &str) -> Result<Outcome> {
    if !matches!(format, "table" | "json") {
        bail!("Unknown format: {} (expected table or json)", format);
    }
    let (results, elapsed) = run_analysis(args, config)?;
    match format {
        "json" => {
            let text = serde_json::to_string_pretty(&stats_json(&results, elapsed)).context("Failed to render statistics")?;
            println!("{}", text);
        }
        _ => display_table_stats(&results, elapsed),
    }
    Ok(Outcome::Clean)
}

/// Counters collected by the engine plus roster sizes
fn summary(results: &AnalysisResults) -> Vec<(String, u64)> {
    let source_bindings = results.bindings().iter().filter(|b| !b.builtin).count();
    let source_functions = results
        .store()
        .functions()
        .filter(|(_, f)| !f.is_builtin() && f.origin.is_none())
        .count();
    let mut rows: Vec<(String, u64)> = results.stats().iter().map(|(k, v)| (k.to_string(), v)).collect();
    rows.push(("files".to_string(), results.files().count() as u64));
    rows.push(("bindings".to_string(), source_bindings as u64));
    rows.push(("functions".to_string(), source_functions as u64));
    rows.push(("resolved_names".to_string(), results.resolved().len() as u64));
    rows.push(("unresolved_names".to_string(), results.unresolved().len() as u64));
    rows
}

fn display_table_stats(results: &AnalysisResults, elapsed: Duration) {
    println!("{}", "Analysis Statistics".bold().underline());
    println!();

    summary(results)
        .into_iter()
        .fold(TableBuilder::new().headers(vec!["Counter", "Value"]), |table, (key, value)| {
            table.row(vec![key, value.to_string()])
        })
        .print();

    println!();
    println!("{}", "Diagnostics".bold());
    let counts = DiagnosticCounts::of(results.all_diagnostics());
    TableBuilder::new()
        .headers(vec!["Severity", "Count"])
        .row(vec!["error".to_string(), counts.errors.to_string()])
        .row(vec!["warning".to_string(), counts.warnings.to_string()])
        .row(vec!["info".to_string(), counts.notes.to_string()])
        .print();

    println!();
    println!("Elapsed: {}", format_elapsed(elapsed).cyan());
}

fn stats_json(results: &AnalysisResults, elapsed: Duration) -> Value {
    let counters: Map<String, Value> = summary(results).into_iter().map(|(k, v)| (k, json!(v))).collect();
    let counts = DiagnosticCounts::of(results.all_diagnostics());
    json!({
        "counters": counters,
        "diagnostics": {
            "error": counts.errors,
            "warning": counts.warnings,
            "info": counts.notes,
        },
        "elapsed_ms": elapsed.as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::FileId;
    use pyflow_builder::AstBuilder;
    use pyflow_infer::{Engine, MemoryLoader};

    #[test]
    fn test_stats_json_shape() {
        let b = AstBuilder::new(FileId::new(0));
        let module = b
            .module("m")
            .stmt(b.def("f", &["x"], vec![b.ret(b.name("x"))]))
            .stmt(b.expr_stmt(b.call(b.name("f"), vec![b.int(1)])))
            .stmt(b.expr_stmt(b.call(b.name("f"), vec![b.int(2)])))
            .stmt(b.expr_stmt(b.name("missing")))
            .build();
        let mut engine = Engine::with_loader(Default::default(), Box::new(MemoryLoader::new()));
        engine.analyze_module(module).unwrap();
        let results = engine.finish().unwrap();

        let value = stats_json(&results, Duration::from_millis(3));
        assert_eq!(value["counters"]["memo_hits"], json!(1));
        assert_eq!(value["counters"]["modules_loaded"], json!(1));
        assert_eq!(value["counters"]["functions"], json!(1));
        assert_eq!(value["counters"]["unresolved_names"], json!(1));
        assert_eq!(value["diagnostics"]["warning"], json!(1));
        assert_eq!(value["elapsed_ms"], json!(3));
    }
}

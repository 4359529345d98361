//! Diagnostics for analyzed modules

use super::{run_analysis, types::print_module_types, Outcome};
use crate::config::CliConfig;
use crate::utils::{print_summary, severity_label, DiagnosticCounts};
use crate::AnalyzeArgs;
use anyhow::Result;
use pyflow_infer::AnalysisResults;

pub fn check_command(args: &AnalyzeArgs, config: &CliConfig, quiet: bool) -> Result<Outcome> {
    let (results, elapsed) = run_analysis(args, config)?;

    if !quiet {
        for line in diagnostic_lines(&results) {
            println!("{}", line);
        }
    }
    if config.show_types {
        print_module_types(&results, None, config.show_private);
    }

    let counts = DiagnosticCounts::of(results.all_diagnostics());
    print_summary(counts, elapsed);

    Ok(if counts.has_problems() {
        Outcome::Problems
    } else {
        Outcome::Clean
    })
}

/// `path:start..end: severity: message`, grouped by file in id order
pub fn diagnostic_lines(results: &AnalysisResults) -> Vec<String> {
    let mut lines = Vec::new();
    for (file, path) in results.files() {
        for diagnostic in results.diagnostics(file) {
            lines.push(format!(
                "{}:{}..{}: {}: {}",
                path,
                diagnostic.span.start.0,
                diagnostic.span.end.0,
                severity_label(diagnostic.severity),
                diagnostic.message()
            ));
        }
    }
    lines
}

//! Command implementations for the pyflow CLI

pub mod check;
pub mod roster;
pub mod stats;
pub mod types;

// Re-export command functions
pub use check::check_command;
pub use roster::roster_command;
pub use stats::stats_command;
pub use types::types_command;

use crate::config::CliConfig;
use crate::utils::AnalysisProgress;
use crate::AnalyzeArgs;
use anyhow::{Context, Result};
use pyflow_infer::{AnalysisResults, AnalyzerOptions, Engine};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// How a command finished; `Problems` maps to a failing exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Problems,
}

/// Engine options from the configuration file with command-line overrides applied
pub fn effective_options(args: &AnalyzeArgs, config: &CliConfig) -> Result<AnalyzerOptions> {
    let mut options = config
        .analyzer
        .clone()
        .with_search_path(args.search_path.iter().cloned());
    if args.unused {
        options.report_unused = true;
    }
    if let Some(max_arrows) = args.max_arrows {
        options.max_arrows = max_arrows;
    }
    if args.input.is_file() {
        options.search_path.push(module_root(&args.input));
    }
    options.validate().context("Invalid analyzer options")?;
    Ok(options)
}

/// Directory a single module file's sibling imports resolve against
fn module_root(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Run the engine over the command's input
pub fn run_analysis(args: &AnalyzeArgs, config: &CliConfig) -> Result<(AnalysisResults, Duration)> {
    let options = effective_options(args, config)?;
    debug!(?options, input = %args.input.display(), "starting analysis");

    let started = Instant::now();
    let progress = AnalysisProgress::start(&args.input);
    let mut engine = Engine::from_fs(options);

    let loaded = if args.input.is_dir() {
        engine
            .analyze_dir(&args.input)
            .with_context(|| format!("Failed to analyze directory: {}", args.input.display()))
    } else {
        engine
            .analyze_file(&args.input)
            .map(|module| module.into_iter().collect::<Vec<_>>())
            .with_context(|| format!("Failed to analyze file: {}", args.input.display()))
    };
    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            progress.failed();
            return Err(e);
        }
    };

    progress.converging();
    let results = engine.finish().context("Failed to finish analysis")?;
    let elapsed = started.elapsed();
    progress.done(loaded.len());
    Ok((results, elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_for(input: PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            input,
            search_path: vec![PathBuf::from("vendor")],
            unused: true,
            max_arrows: Some(2),
        }
    }

    #[test]
    fn test_command_line_overrides_config() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("main.json");
        std::fs::write(&file, "{}").unwrap();

        let mut config = CliConfig::default();
        config.analyzer.search_path.push(PathBuf::from("lib"));

        let options = effective_options(&args_for(file), &config).unwrap();
        assert!(options.report_unused);
        assert_eq!(options.max_arrows, 2);
        assert_eq!(
            options.search_path,
            vec![PathBuf::from("lib"), PathBuf::from("vendor"), temp_dir.path().to_path_buf()]
        );
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut args = args_for(PathBuf::from("missing-dir"));
        args.max_arrows = Some(0);
        assert!(effective_options(&args, &CliConfig::default()).is_err());
    }

    #[test]
    fn test_module_root() {
        assert_eq!(module_root(Path::new("main.json")), PathBuf::from("."));
        assert_eq!(module_root(Path::new("src/main.json")), PathBuf::from("src"));
    }
}

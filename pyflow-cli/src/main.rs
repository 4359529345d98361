//! pyflow CLI - flow-based type inference over serialized module trees
//!
//! Loads module trees (the JSON form produced by `pyflow_ast::encode_module`),
//! runs the inference engine over them and prints diagnostics, inferred
//! types, the binding roster or run statistics.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::{debug, error};

mod commands;
mod config;
mod utils;

use commands::*;
use config::CliConfig;

/// pyflow - whole-program type inference for dynamically typed modules
#[derive(Parser)]
#[command(name = "pyflow")]
#[command(about = "Flow-based type inference over serialized module trees")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every analysis command
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Module tree file or directory of module trees
    pub input: PathBuf,

    /// Additional module search root (repeatable)
    #[arg(short = 'I', long = "search-path")]
    pub search_path: Vec<PathBuf>,

    /// Report variables that are never referenced
    #[arg(long)]
    pub unused: bool,

    /// Maximum memo entries kept per function
    #[arg(long)]
    pub max_arrows: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze modules and print diagnostics
    Check {
        #[command(flatten)]
        args: AnalyzeArgs,
        /// Only print the summary line
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the inferred types of top-level names
    Types {
        #[command(flatten)]
        args: AnalyzeArgs,
        /// Only show this module
        #[arg(short, long)]
        module: Option<String>,
        /// Include names starting with an underscore
        #[arg(long)]
        private: bool,
    },

    /// Dump the binding roster
    Roster {
        #[command(flatten)]
        args: AnalyzeArgs,
        /// Only show bindings with this name
        #[arg(short, long)]
        name: Option<String>,
        /// Include catalog bindings
        #[arg(long)]
        builtins: bool,
    },

    /// Show run statistics
    Stats {
        #[command(flatten)]
        args: AnalyzeArgs,
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = CliConfig::load(cli.config.as_deref())?;
    if cli.no_color || !config.color {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Check { args, quiet } => check_command(&args, &config, quiet),
        Commands::Types { args, module, private } => {
            types_command(&args, &config, module.as_deref(), private || config.show_private)
        }
        Commands::Roster { args, name, builtins } => roster_command(&args, &config, name.as_deref(), builtins),
        Commands::Stats { args, format } => stats_command(&args, &config, &format),
    };

    match result {
        Ok(Outcome::Clean) => {
            debug!("Command completed successfully");
            Ok(())
        }
        Ok(Outcome::Problems) => std::process::exit(1),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

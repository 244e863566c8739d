//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hierarchical parallel test-suite runner
#[derive(Parser, Debug)]
#[command(name = "suite-runner")]
#[command(version = "0.1.0")]
#[command(about = "Run module/class/method test suites with once-only fixtures")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scripted suite plan
    Run(RunArgs),

    /// Print the canonical tree of a plan
    Tree(TreeArgs),

    /// Inspect or create configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Plan file describing modules, classes and tests
    #[arg(short, long)]
    pub plan: PathBuf,

    /// Concurrency level (0 root, 1 module, 2 class, 3 method)
    #[arg(short = 'l', long)]
    pub level: Option<i32>,

    /// Number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Timeout in seconds for each wait barrier
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Run everything sequentially
    #[arg(long)]
    pub debug: bool,

    /// Buffer fixture and test output on the result
    #[arg(short, long)]
    pub buffer: bool,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for tree command
#[derive(Parser, Debug)]
pub struct TreeArgs {
    /// Plan file to convert
    #[arg(short, long)]
    pub plan: PathBuf,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Write an example configuration file
    Init {
        /// Destination path (.yaml or .json)
        path: PathBuf,
    },

    /// List supported environment variables
    Env,
}

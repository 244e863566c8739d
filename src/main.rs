//! Suite Runner - hierarchical parallel test-suite runner
//!
//! Loads a scripted plan of modules, classes and tests, converts it into
//! the canonical root/module/class/method tree and runs it either
//! sequentially or split across a worker pool at a chosen level.
//!
//! ## Usage
//!
//! ```bash
//! # Run a plan with classes spread over four workers
//! suite-runner run --plan plan.yaml --level 2 --workers 4
//!
//! # Show how a plan is grouped
//! suite-runner tree --plan plan.yaml
//!
//! # Write an example configuration
//! suite-runner config init suite-runner.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{debug, info};

use suite_runner::cli::{self, Args};
use suite_runner::config::{print_env_help, EnvConfig, RunnerConfig};
use suite_runner::output::{format_tree, write_result_to_file, OutputFormat, ResultFormatter};
use suite_runner::utils::{init_logger, LogLevel};
use suite_runner::{convert, Plan, TestResult, TestRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let mut config = load_config(args.config.as_deref(), &env)?;
    config.apply_env(&env);
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    let level: LogLevel = config.log_level.parse().map_err(anyhow::Error::msg)?;
    init_logger(level);

    match args.command {
        cli::Command::Run(run_args) => {
            let passed = run_plan(run_args, config).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        cli::Command::Tree(tree_args) => {
            show_tree(tree_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &config)?;
        }
    }

    Ok(())
}

/// Pick the config file from the flag, then the environment, then the
/// standard locations
fn load_config(flag: Option<&Path>, env: &EnvConfig) -> Result<RunnerConfig> {
    if let Some(path) = flag {
        return RunnerConfig::load(path);
    }
    if let Some(path) = &env.config_file {
        return RunnerConfig::load(path);
    }
    RunnerConfig::load_default()
}

async fn run_plan(args: cli::RunArgs, mut config: RunnerConfig) -> Result<bool> {
    if let Some(level) = args.level {
        config.concurrency_level = level;
    }
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if args.debug {
        config.debug = true;
    }
    if args.buffer {
        config.buffer = true;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    config.validate()?;

    let format: OutputFormat = config.format.parse().map_err(anyhow::Error::msg)?;

    let plan = Plan::load(&args.plan)?;
    let suite = convert(&plan.build());
    debug!("Converted plan into {} module suites", suite.len());

    info!(
        "Running {} tests from {} (level {}, {} workers)",
        suite.count_cases(),
        args.plan.display(),
        config.concurrency_level,
        config.max_workers
    );

    let result = if config.buffer {
        TestResult::buffered()
    } else {
        TestResult::new()
    };
    let runner = TestRunner::new(config.to_run_options());
    let result = runner.run(&suite, result).await?;

    let formatter = ResultFormatter::new(format);
    println!("{}", formatter.format_result(&result));

    if let Some(path) = &args.output {
        write_result_to_file(path, &result, format)?;
        info!("Results written to {}", path);
    }

    Ok(result.was_successful())
}

fn show_tree(args: cli::TreeArgs) -> Result<()> {
    let plan = Plan::load(&args.plan)?;
    let suite = convert(&plan.build());
    print!("{}", format_tree(&suite));
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, config: &RunnerConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Show => {
            println!("{}", serde_yaml::to_string(config)?);
        }

        cli::ConfigAction::Init { path } => {
            if path.exists() {
                anyhow::bail!("Configuration file already exists: {}", path.display());
            }
            RunnerConfig::example().save(&path)?;
            println!("✓ Configuration file created: {}", path.display());
        }

        cli::ConfigAction::Env => {
            print_env_help();
        }
    }

    Ok(())
}

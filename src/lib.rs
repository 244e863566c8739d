//! Suite Runner
//!
//! Runs a hierarchy of test suites (module, class, method) either
//! sequentially or split across a bounded worker pool at a chosen depth,
//! while running each module and class fixture at most once.
//!
//! ```no_run
//! use suite_runner::{convert, Plan, RunOptions, TestResult, TestRunner};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let plan = Plan::load("plan.yaml")?;
//! let suite = convert(&plan.build());
//! let runner = TestRunner::new(RunOptions::new().with_concurrency(2, 4));
//! let result = runner.run(&suite, TestResult::buffered()).await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod plan;
pub mod suite;
pub mod utils;

pub use config::RunnerConfig;
pub use error::{Phase, RunError};
pub use executor::{RunOptions, TestRunner};
pub use models::{
    ClassDef, FixtureHook, Level, ModuleDef, Outcome, TestCase, TestNode, TestResult, TestSuite,
};
pub use plan::Plan;
pub use suite::{check_well_formed, convert};

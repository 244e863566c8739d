//! Suite runner
//!
//! Validates run options and the suite shape, then drives either the
//! sequential or the parallel executor with a fresh fixture ledger.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::parallel::ParallelExecutor;
use super::sequential::run_sequential;
use crate::error::RunError;
use crate::models::{Level, TestResult, TestSuite};
use crate::suite::{check_well_formed, FixtureLedger};
use crate::utils::Timer;

/// Options for a single run
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    /// Force sequential execution
    pub debug: bool,
    /// Depth at which work stops being split, 0 (root) to 3 (method)
    pub concurrency_level: i32,
    pub max_workers: usize,
    /// Limit for each wait barrier of a parallel run
    pub timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            debug: false,
            concurrency_level: Level::Root.as_i32(),
            max_workers: 1,
            timeout: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, level: i32, max_workers: usize) -> Self {
        self.concurrency_level = level;
        self.max_workers = max_workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn runs_sequentially(&self, level: Level) -> bool {
        self.debug || level == Level::Root || self.max_workers <= 1
    }
}

/// Runs canonical suites
pub struct TestRunner {
    options: RunOptions,
}

impl TestRunner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run `suite` into `result`
    ///
    /// Fails before executing anything when the concurrency level is out of
    /// range or the suite is not well-formed. Each call uses its own
    /// fixture ledger.
    pub async fn run(&self, suite: &TestSuite, result: TestResult) -> Result<TestResult, RunError> {
        let level = Level::try_from(self.options.concurrency_level)?;
        check_well_formed(suite)?;

        let ledger = Arc::new(FixtureLedger::new());
        let root = suite.clone().into_node();
        let sequential = self.options.runs_sequentially(level);
        let mut result = result;
        result.started_at = Some(Utc::now());

        info!(
            "Running {} tests ({}, concurrency level {}, {} workers)",
            suite.count_cases(),
            if sequential { "sequential" } else { "parallel" },
            level,
            self.options.max_workers
        );
        let timer = Timer::start("suite run");

        let mut result = if sequential {
            tokio::task::spawn_blocking(move || {
                run_sequential(&ledger, &root, &mut result);
                result
            })
            .await
            .map_err(|err| RunError::Worker(err.to_string()))?
        } else {
            ParallelExecutor::new(ledger, level, self.options.max_workers)
                .with_timeout(self.options.timeout)
                .divide_and_conquer(root, result, Level::Root)
                .await?
        };

        result.finished_at = Some(Utc::now());
        info!(
            "Run completed in {}ms - {}",
            timer.stop().as_millis(),
            result.summary()
        );
        Ok(result)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

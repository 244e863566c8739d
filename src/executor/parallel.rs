//! Parallel suite execution
//!
//! Splits a canonical tree across a bounded worker pool. Above the
//! configured concurrency level every child of a suite becomes its own unit
//! of work; at that level the whole subtree is handed to the sequential
//! executor.
//!
//! For module and class suites the children go through three phases:
//! setup, body and teardown. A child's body is dispatched as soon as its
//! setup returns and its teardown as soon as its body returns, so a fixture
//! always brackets everything below it even though siblings interleave.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error};

use super::aggregate::combine_results;
use super::sequential::run_sequential;
use crate::error::{Phase, RunError};
use crate::models::{Level, TestNode, TestResult, TestSuite};
use crate::suite::{fixtures, FixtureLedger};

/// A child node paired with its result slot
type Slot = (usize, TestNode, TestResult);

type Unit<T> = JoinHandle<Result<T, RunError>>;

type FixtureFn = fn(&FixtureLedger, &TestSuite, &mut TestResult);

#[derive(Clone, Copy, Debug)]
enum FixtureScope {
    Module,
    Class,
}

impl FixtureScope {
    fn set_up(self) -> FixtureFn {
        match self {
            FixtureScope::Module => fixtures::set_up_module,
            FixtureScope::Class => fixtures::set_up_class,
        }
    }

    fn tear_down(self) -> FixtureFn {
        match self {
            FixtureScope::Module => fixtures::tear_down_module,
            FixtureScope::Class => fixtures::tear_down_class,
        }
    }
}

/// Divide-and-conquer scheduler over a worker pool
///
/// Only units of work (a fixture call, a case, a sequential subtree) hold a
/// worker; waiting on children never does, so small pools cannot starve.
#[derive(Clone)]
pub struct ParallelExecutor {
    ledger: Arc<FixtureLedger>,
    workers: Arc<Semaphore>,
    concurrency_level: Level,
    timeout: Option<Duration>,
}

impl ParallelExecutor {
    pub fn new(ledger: Arc<FixtureLedger>, concurrency_level: Level, max_workers: usize) -> Self {
        Self {
            ledger,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
            concurrency_level,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `node`, sitting at `level`, into `result`
    pub fn divide_and_conquer(
        &self,
        node: TestNode,
        result: TestResult,
        level: Level,
    ) -> BoxFuture<'static, Result<TestResult, RunError>> {
        let this = self.clone();
        async move { this.run_level(node, result, level).await }.boxed()
    }

    async fn run_level(
        self,
        node: TestNode,
        mut result: TestResult,
        level: Level,
    ) -> Result<TestResult, RunError> {
        if level >= self.concurrency_level {
            return self
                .unit(move |ledger| {
                    let mut result = result;
                    run_sequential(ledger, &node, &mut result);
                    result
                })
                .await;
        }

        let (suite, child_level) = match (&node, level.next()) {
            (TestNode::Suite(suite), Some(child_level)) => (suite.clone(), child_level),
            _ => {
                return Err(RunError::MalformedSuite(format!(
                    "expected a suite at {level} level"
                )))
            }
        };

        let slots: Vec<Slot> = suite
            .children()
            .iter()
            .enumerate()
            .map(|(index, child)| (index, child.clone(), result.spawn_child()))
            .collect();
        debug!("Dispatching {} children at {} level", slots.len(), level);

        let children = match level {
            Level::Root => {
                self.run_with_fixtures(slots, FixtureScope::Module, level, child_level)
                    .await?
            }
            Level::Module => {
                self.run_with_fixtures(slots, FixtureScope::Class, level, child_level)
                    .await?
            }
            _ => self.run_bodies(slots, level, child_level).await?,
        };

        combine_results(&mut result, children);
        Ok(result)
    }

    async fn run_with_fixtures(
        &self,
        slots: Vec<Slot>,
        scope: FixtureScope,
        level: Level,
        child_level: Level,
    ) -> Result<Vec<TestResult>, RunError> {
        let total = slots.len();
        let mut set_ups: FuturesUnordered<Unit<Slot>> = slots
            .into_iter()
            .map(|slot| self.spawn_fixture(slot, scope.set_up()))
            .collect();

        let deadline = self.deadline();
        let mut bodies = FuturesUnordered::new();
        while let Some(slot) = self
            .next_completed(&mut set_ups, deadline, Phase::SetUp, level)
            .await?
        {
            bodies.push(self.spawn_body(slot, child_level));
        }

        let deadline = self.deadline();
        let mut tear_downs = FuturesUnordered::new();
        while let Some(slot) = self
            .next_completed(&mut bodies, deadline, Phase::Body, level)
            .await?
        {
            tear_downs.push(self.spawn_fixture(slot, scope.tear_down()));
        }

        self.collect_slots(tear_downs, total, Phase::TearDown, level)
            .await
    }

    async fn run_bodies(
        &self,
        slots: Vec<Slot>,
        level: Level,
        child_level: Level,
    ) -> Result<Vec<TestResult>, RunError> {
        let total = slots.len();
        let bodies: FuturesUnordered<Unit<Slot>> = slots
            .into_iter()
            .map(|slot| self.spawn_body(slot, child_level))
            .collect();
        self.collect_slots(bodies, total, Phase::Body, level).await
    }

    /// Wait for every unit and put results back in child order
    async fn collect_slots(
        &self,
        mut pending: FuturesUnordered<Unit<Slot>>,
        total: usize,
        phase: Phase,
        level: Level,
    ) -> Result<Vec<TestResult>, RunError> {
        let mut results: Vec<Option<TestResult>> = (0..total).map(|_| None).collect();
        let deadline = self.deadline();
        while let Some((index, _, result)) =
            self.next_completed(&mut pending, deadline, phase, level).await?
        {
            results[index] = Some(result);
        }

        results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.ok_or_else(|| RunError::Worker(format!("no result for child {index}")))
            })
            .collect()
    }

    async fn next_completed<T>(
        &self,
        pending: &mut FuturesUnordered<Unit<T>>,
        deadline: Option<Instant>,
        phase: Phase,
        level: Level,
    ) -> Result<Option<T>, RunError> {
        let next = match (deadline, self.timeout) {
            (Some(deadline), Some(timeout)) => timeout_at(deadline, pending.next())
                .await
                .map_err(|_| {
                    error!(
                        "Timed out after {:?} waiting for {} at {} level",
                        timeout, phase, level
                    );
                    RunError::Timeout {
                        phase,
                        level,
                        timeout,
                    }
                })?,
            _ => pending.next().await,
        };

        match next {
            None => Ok(None),
            Some(joined) => joined
                .map_err(|err| RunError::Worker(err.to_string()))?
                .map(Some),
        }
    }

    fn spawn_fixture(&self, slot: Slot, fixture: FixtureFn) -> Unit<Slot> {
        let this = self.clone();
        tokio::spawn(async move {
            this.unit(move |ledger| {
                let (index, node, mut result) = slot;
                if let TestNode::Suite(suite) = &node {
                    fixture(ledger, suite, &mut result);
                }
                (index, node, result)
            })
            .await
        })
    }

    fn spawn_body(&self, slot: Slot, child_level: Level) -> Unit<Slot> {
        let (index, node, result) = slot;
        let body = self.divide_and_conquer(node.clone(), result, child_level);
        tokio::spawn(async move { body.await.map(|result| (index, node, result)) })
    }

    /// Run blocking work on one worker
    async fn unit<T, F>(&self, work: F) -> Result<T, RunError>
    where
        F: FnOnce(&FixtureLedger) -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| RunError::Worker(err.to_string()))?;
        let ledger = self.ledger.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work(&ledger)
        })
        .await
        .map_err(|err| RunError::Worker(err.to_string()))
    }

    /// `None` when there is no timeout or it lies beyond what `Instant` can hold
    fn deadline(&self) -> Option<Instant> {
        self.timeout
            .and_then(|timeout| Instant::now().checked_add(timeout))
    }
}

//! Sequential execution
//!
//! Depth-first walk of a subtree on the calling thread, running module and
//! class fixtures around their suites and cases in order.

use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

use crate::models::{Level, Outcome, TestCase, TestNode, TestResult};
use crate::suite::fixtures::{self, SET_UP_CLASS, SET_UP_MODULE};
use crate::suite::{classify, FixtureLedger};

/// Run `node` and everything below it into `result`
pub fn run_sequential(ledger: &FixtureLedger, node: &TestNode, result: &mut TestResult) {
    let suite = match node {
        TestNode::Case(case) => return execute_case(ledger, case, result),
        TestNode::Suite(suite) => suite,
    };

    match classify::suite_level_of(suite) {
        Some(Level::Module) => {
            fixtures::set_up_module(ledger, suite, result);
            for child in suite.children() {
                run_sequential(ledger, child, result);
            }
            fixtures::tear_down_module(ledger, suite, result);
        }
        Some(Level::Class) => {
            fixtures::set_up_class(ledger, suite, result);
            for child in suite.children() {
                run_sequential(ledger, child, result);
            }
            fixtures::tear_down_class(ledger, suite, result);
        }
        _ => {
            for child in suite.children() {
                run_sequential(ledger, child, result);
            }
        }
    }
}

/// Run a single case into `result`
///
/// Cases of a skipped class are recorded as skips. Cases under a failed
/// module or class setup are recorded as errors without running the body.
pub fn execute_case(ledger: &FixtureLedger, case: &TestCase, result: &mut TestResult) {
    result.start_test();
    let test_id = case.id();
    let class = &case.class;

    if let Some(reason) = &class.skip {
        result.add_skip(test_id, reason.clone());
        return;
    }
    if fixtures::module_setup_failed(ledger, &class.module) {
        let label = fixtures::module_label(SET_UP_MODULE, &class.module);
        result.add_error(test_id, format!("{label} failed"));
        return;
    }
    if fixtures::class_setup_failed(ledger, class) {
        let label = fixtures::class_label(SET_UP_CLASS, class);
        result.add_error(test_id, format!("{label} failed"));
        return;
    }

    debug!("Running {}", case);
    let (outcome, report) = {
        let mut scope = result.capture_scope(test_id.clone());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| case.body.call(scope.capture())));
        (outcome, scope.report())
    };

    let outcome = match outcome {
        Ok(Outcome::Fail(message)) => Outcome::Fail(format!("{message}{report}")),
        Ok(Outcome::Error(message)) => Outcome::Error(format!("{message}{report}")),
        Ok(outcome) => outcome,
        Err(payload) => Outcome::Error(format!("{}{report}", fixtures::panic_message(payload))),
    };
    result.record(test_id, outcome);
}

//! Result aggregation
//!
//! Folds the results of concurrently executed children back into their
//! parent, in child order.

use crate::models::TestResult;

/// Merge `children` into `parent` and keep them as its child results
pub fn combine_results(parent: &mut TestResult, children: Vec<TestResult>) {
    for child in &children {
        parent.tests_run += child.tests_run;
        parent.successes.extend(child.successes.iter().cloned());
        parent.failures.extend(child.failures.iter().cloned());
        parent.errors.extend(child.errors.iter().cloned());
        parent.skipped.extend(child.skipped.iter().cloned());
        parent.captured.extend(child.captured.iter().cloned());
    }
    parent.children.extend(children);
}

//! Test execution engine
//!
//! Provides sequential and parallel suite execution and the result
//! aggregation the parallel path relies on.

mod aggregate;
mod parallel;
mod runner;
mod sequential;

pub use aggregate::combine_results;
pub use parallel::ParallelExecutor;
pub use runner::{RunOptions, TestRunner};
pub use sequential::{execute_case, run_sequential};

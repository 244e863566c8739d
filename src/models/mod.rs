//! Data models for suite execution
//!
//! This module contains the test tree and result types shared by the
//! classifier, the executors and the output layer.

mod node;
mod test_result;

pub use node::{CaseFn, ClassDef, FixtureHook, Level, ModuleDef, TestCase, TestNode, TestSuite};
pub use test_result::{
    Capture, CaptureScope, CapturedOutput, Diagnostic, Outcome, RunSummary, TestResult,
    TestStatus,
};

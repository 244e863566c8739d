//! Test result models
//!
//! Defines test outcomes, the aggregating result sink and its summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome reported by a test body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
    Error(String),
    Skip(String),
}

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
            TestStatus::Error => "!",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// A test identity paired with its diagnostic text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub test_id: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(test_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.test_id, self.message)
    }
}

/// Console output written by a hook or test body
///
/// Each invocation gets its own capture, so concurrently running fixtures
/// never interleave their text.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    pub stdout: String,
    pub stderr: String,
}

impl Capture {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Text appended to a diagnostic when the invocation failed
    pub fn to_report(&self) -> String {
        let mut report = String::new();
        if !self.stdout.is_empty() {
            report.push_str("\nStdout:\n");
            report.push_str(&self.stdout);
        }
        if !self.stderr.is_empty() {
            report.push_str("\nStderr:\n");
            report.push_str(&self.stderr);
        }
        report
    }
}

/// Buffered output kept on the result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedOutput {
    pub source: String,
    pub stdout: String,
    pub stderr: String,
}

/// Aggregating result sink
///
/// A result produced by the scheduler for a suite also keeps one child
/// result per immediate child of that suite, in child order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestResult {
    pub tests_run: usize,
    pub successes: Vec<String>,
    pub failures: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    pub skipped: Vec<Diagnostic>,
    pub captured: Vec<CapturedOutput>,
    pub children: Vec<TestResult>,
    /// Keep hook and body output instead of echoing it
    pub buffer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffered() -> Self {
        Self {
            buffer: true,
            ..Self::default()
        }
    }

    /// Empty result sharing this result's settings
    pub fn spawn_child(&self) -> Self {
        Self {
            buffer: self.buffer,
            ..Self::default()
        }
    }

    pub fn start_test(&mut self) {
        self.tests_run += 1;
    }

    pub fn add_success(&mut self, test_id: impl Into<String>) {
        self.successes.push(test_id.into());
    }

    pub fn add_failure(&mut self, test_id: impl Into<String>, message: impl Into<String>) {
        self.failures.push(Diagnostic::new(test_id, message));
    }

    pub fn add_error(&mut self, test_id: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(test_id, message));
    }

    pub fn add_skip(&mut self, test_id: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(Diagnostic::new(test_id, reason));
    }

    /// Record a body outcome under `test_id`
    pub fn record(&mut self, test_id: impl Into<String>, outcome: Outcome) {
        match outcome {
            Outcome::Pass => self.add_success(test_id),
            Outcome::Fail(message) => self.add_failure(test_id, message),
            Outcome::Error(message) => self.add_error(test_id, message),
            Outcome::Skip(reason) => self.add_skip(test_id, reason),
        }
    }

    pub fn was_successful(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }

    /// Open a capture scope; its output is restored into this result when
    /// the scope ends, on every exit path
    pub fn capture_scope(&mut self, source: impl Into<String>) -> CaptureScope<'_> {
        CaptureScope {
            result: self,
            source: source.into(),
            capture: Capture::default(),
        }
    }

    fn restore_output(&mut self, source: String, capture: Capture) {
        if capture.is_empty() {
            return;
        }
        if self.buffer {
            self.captured.push(CapturedOutput {
                source,
                stdout: capture.stdout,
                stderr: capture.stderr,
            });
        } else {
            print!("{}", capture.stdout);
            eprint!("{}", capture.stderr);
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::new(self)
    }
}

/// Scoped redirection of hook/body output into a [`TestResult`]
pub struct CaptureScope<'a> {
    result: &'a mut TestResult,
    source: String,
    capture: Capture,
}

impl CaptureScope<'_> {
    pub fn capture(&mut self) -> &mut Capture {
        &mut self.capture
    }

    /// Captured text to attach to a failure, empty when unbuffered
    pub fn report(&self) -> String {
        if self.result.buffer {
            self.capture.to_report()
        } else {
            String::new()
        }
    }
}

impl Drop for CaptureScope<'_> {
    fn drop(&mut self) {
        let capture = std::mem::take(&mut self.capture);
        let source = std::mem::take(&mut self.source);
        self.result.restore_output(source, capture);
    }
}

/// Counts derived from a result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn new(result: &TestResult) -> Self {
        Self {
            total: result.tests_run,
            passed: result.successes.len(),
            failed: result.failures.len(),
            skipped: result.skipped.len(),
            errors: result.errors.len(),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {} | Pass Rate: {:.1}%",
            self.total,
            self.passed,
            self.failed,
            self.skipped,
            self.errors,
            self.pass_rate()
        )
    }
}

//! Output formatters for test results
//!
//! Provides Table, JSON, and summary output formats.

use std::io::Write;
use std::str::FromStr;

use crate::models::{Diagnostic, Level, TestNode, TestResult, TestStatus, TestSuite};
use crate::suite::classify;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "summary" => Ok(OutputFormat::Summary),
            _ => Err(format!(
                "Invalid output format: {s}. Valid: table, json, json-pretty, summary"
            )),
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format the result of a whole run
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_table(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Summary => self.format_brief(result),
        }
    }

    fn status_label(&self, status: TestStatus) -> String {
        if !self.colorize {
            return format!("{} {}", status.symbol(), status);
        }
        let color = match status {
            TestStatus::Pass => "32",
            TestStatus::Skip => "33",
            TestStatus::Fail | TestStatus::Error => "31",
        };
        format!("\x1b[{color}m{} {}\x1b[0m", status.symbol(), status)
    }

    fn format_diagnostics(&self, output: &mut String, status: TestStatus, entries: &[Diagnostic]) {
        for entry in entries {
            output.push_str(&format!("{}: {}\n", self.status_label(status), entry.test_id));
            for line in entry.message.lines() {
                output.push_str(&format!("    {line}\n"));
            }
        }
    }

    fn format_table(&self, result: &TestResult) -> String {
        let mut output = String::new();

        output.push_str("\n══════════════════════════════════════════════════════════════\n");

        for test_id in &result.successes {
            output.push_str(&format!("{}: {}\n", self.status_label(TestStatus::Pass), test_id));
        }
        self.format_diagnostics(&mut output, TestStatus::Skip, &result.skipped);
        self.format_diagnostics(&mut output, TestStatus::Fail, &result.failures);
        self.format_diagnostics(&mut output, TestStatus::Error, &result.errors);

        if !result.captured.is_empty() {
            output.push_str("──────────────────────────────────────────────────────────────\n");
            output.push_str(" Captured output:\n");
            for captured in &result.captured {
                output.push_str(&format!(" [{}]\n", captured.source));
                for line in captured.stdout.lines().chain(captured.stderr.lines()) {
                    output.push_str(&format!("    {line}\n"));
                }
            }
        }

        output.push_str("──────────────────────────────────────────────────────────────\n");
        let summary = result.summary();
        output.push_str(&format!(" {summary}\n"));
        if let (Some(start), Some(end)) = (result.started_at, result.finished_at) {
            output.push_str(&format!(
                " Duration: {}ms\n",
                (end - start).num_milliseconds()
            ));
        }

        let passed = summary.is_all_passed();
        let verdict = if passed { "OK" } else { "FAILED" };
        let verdict = match (self.colorize, passed) {
            (true, true) => format!("\x1b[32m{verdict}\x1b[0m"),
            (true, false) => format!("\x1b[31m{verdict}\x1b[0m"),
            (false, _) => verdict.to_string(),
        };
        output.push_str(&format!(" {verdict}\n"));
        output.push_str("══════════════════════════════════════════════════════════════\n");

        output
    }

    fn format_brief(&self, result: &TestResult) -> String {
        let summary = result.summary();
        format!(
            "{}/{} passed ({:.1}%), {} failed, {} errors, {} skipped",
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.failed,
            summary.errors,
            summary.skipped
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Render a canonical tree as indented text
pub fn format_tree(suite: &TestSuite) -> String {
    let mut output = String::new();
    render_suite(&mut output, suite, 0);
    output
}

fn render_suite(output: &mut String, suite: &TestSuite, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = match classify::suite_level_of(suite) {
        Some(level) => match (
            level,
            classify::representative_module(suite),
            classify::representative_class(suite),
        ) {
            (Level::Module, Some(module), _) => format!("module {}", module.name),
            (Level::Class, _, Some(class)) => {
                let skip = match &class.skip {
                    Some(reason) => format!(" (skipped: {reason})"),
                    None => String::new(),
                };
                format!("class {}{}", class.name, skip)
            }
            (level, _, _) => level.to_string(),
        },
        None => "suite".to_string(),
    };
    output.push_str(&format!("{indent}{name} [{} tests]\n", suite.count_cases()));

    for child in suite.children() {
        match child {
            TestNode::Suite(inner) => render_suite(output, inner, depth + 1),
            TestNode::Case(case) => {
                output.push_str(&format!("{}  {}\n", indent, case.method));
            }
        }
    }
}

/// Write a formatted result to a file
pub fn write_result_to_file(
    path: &str,
    result: &TestResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_result(result);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassDef, ModuleDef, Outcome, TestCase};
    use crate::suite::convert;
    use std::sync::Arc;

    fn sample_result() -> TestResult {
        let mut result = TestResult::new();
        result.start_test();
        result.add_success("m.A.test_ok");
        result.start_test();
        result.add_failure("m.A.test_bad", "1 != 2\nsecond line");
        result.add_error("setUpClass (m.B)", "no database");
        result
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse(), Ok(OutputFormat::Json));
        assert_eq!("TABLE".parse(), Ok(OutputFormat::Table));
        assert_eq!("json-pretty".parse(), Ok(OutputFormat::JsonPretty));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_table_lists_diagnostics() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_result(&sample_result());

        assert!(output.contains("✓ PASS: m.A.test_ok"));
        assert!(output.contains("✗ FAIL: m.A.test_bad"));
        assert!(output.contains("    second line"));
        assert!(output.contains("! ERROR: setUpClass (m.B)"));
        assert!(output.contains("FAILED"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_table_verdict_ignores_skips() {
        let mut result = TestResult::new();
        result.start_test();
        result.add_success("m.A.test_ok");
        result.start_test();
        result.add_skip("m.A.test_later", "not yet");

        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_result(&result);
        assert!(output.contains("○ SKIP: m.A.test_later"));
        assert!(output.contains(" OK\n"));
        assert!(!output.contains("FAILED"));
    }

    #[test]
    fn test_summary_format() {
        let output = ResultFormatter::new(OutputFormat::Summary).format_result(&sample_result());
        assert_eq!(output, "1/2 passed (50.0%), 1 failed, 1 errors, 0 skipped");
    }

    #[test]
    fn test_json_format() {
        let output = ResultFormatter::new(OutputFormat::Json).format_result(&sample_result());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["tests_run"], 2);
        assert_eq!(value["failures"][0]["test_id"], "m.A.test_bad");
    }

    #[test]
    fn test_format_tree() {
        let module = Arc::new(ModuleDef::new("pkg"));
        let class = Arc::new(ClassDef::new(module, "Alpha").skipped("later"));
        let raw = TestSuite::new(vec![
            TestCase::new(class.clone(), "test_one", |_| Outcome::Pass).into(),
            TestCase::new(class, "test_two", |_| Outcome::Pass).into(),
        ]);
        let tree = format_tree(&convert(&raw.into_node()));

        assert_eq!(
            tree,
            "root [2 tests]\n  module pkg [2 tests]\n    class Alpha (skipped: later) [2 tests]\n      test_one\n      test_two\n"
        );
    }
}

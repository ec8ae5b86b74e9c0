//! Test result reporting (pytest-style)
//!
//! The driver reports through the [`TestReporter`] trait so other output formats (JSON, TAP, ...)
//! can be added without touching execution.

use std::time::Duration;

use crate::runspec::TestCase;

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Passed(Duration),
    Failed(Duration, String),
    /// The case declared `expect_error` and the tool failed.
    XFailed(Duration, String),
    /// The case declared `expect_error` but the tool succeeded.
    XPassed(Duration),
}

impl TestResult {
    /// Whether this result fails the suite.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Failed(..) | TestResult::XPassed(_))
    }

    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Passed(d) | TestResult::Failed(d, _) | TestResult::XFailed(d, _) | TestResult::XPassed(d) => *d,
        }
    }
}

/// Summary of a suite run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub deselected: usize,
    pub duration: Duration,
}

impl TestSummary {
    pub fn record(&mut self, result: &TestResult) {
        self.total += 1;
        match result {
            TestResult::Passed(_) => self.passed += 1,
            TestResult::Failed(..) => self.failed += 1,
            TestResult::XFailed(..) => self.xfailed += 1,
            TestResult::XPassed(_) => self.xpassed += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.xpassed == 0
    }

    /// "2 passed, 1 failed" style counts; empty counts are omitted.
    pub fn counts_line(&self) -> String {
        let parts: Vec<String> = [
            (self.passed, "passed"),
            (self.failed, "failed"),
            (self.xfailed, "xfailed"),
            (self.xpassed, "xpassed"),
            (self.deselected, "deselected"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();

        if parts.is_empty() { "no tests ran".to_string() } else { parts.join(", ") }
    }
}

/// Trait for reporting test execution results.
pub trait TestReporter {
    /// Called once the runspec is loaded and filtered
    fn on_collection_complete(&mut self, _runspec: &str, _test_count: usize) {}

    fn on_test_start(&mut self, test: &TestCase);

    fn on_test_complete(&mut self, test: &TestCase, result: &TestResult);

    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Default console reporter
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    failures: Vec<(String, String)>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            failures: Vec::new(),
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, runspec: &str, test_count: usize) {
        println!("\x1b[1m=================== test session starts ===================\x1b[0m");
        println!("runspec: {runspec}");
        println!("collected {test_count} item(s)");
        println!();
    }

    fn on_test_start(&mut self, test: &TestCase) {
        if self.verbose {
            println!("{} ...", test.name);
        }
    }

    fn on_test_complete(&mut self, test: &TestCase, result: &TestResult) {
        let status = match result {
            TestResult::Passed(d) => format!("\x1b[32mPASSED\x1b[0m ({}ms)", d.as_millis()),
            TestResult::Failed(d, _) => format!("\x1b[31mFAILED\x1b[0m ({}ms)", d.as_millis()),
            TestResult::XFailed(_, reason) if self.verbose => format!("\x1b[33mXFAIL\x1b[0m ({reason})"),
            TestResult::XFailed(..) => "\x1b[33mXFAIL\x1b[0m".to_string(),
            TestResult::XPassed(_) => "\x1b[31mXPASS\x1b[0m".to_string(),
        };
        println!("{} {}", test.name, status);

        match result {
            TestResult::Failed(_, msg) => self.failures.push((test.name.clone(), msg.clone())),
            TestResult::XPassed(_) => self
                .failures
                .push((test.name.clone(), "Expected an error but the test passed.".to_string())),
            _ => {}
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        if !self.failures.is_empty() {
            println!();
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for (name, msg) in &self.failures {
                println!();
                println!("\x1b[1m___________ {name} ___________\x1b[0m");
                println!();
                println!("    {msg}");
            }
        }

        let color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        println!();
        println!(
            "{color}=================== {} in {:.2}s ===================\x1b[0m",
            summary.counts_line(),
            summary.duration.as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = TestSummary::default();
        summary.record(&TestResult::Passed(Duration::ZERO));
        summary.record(&TestResult::XFailed(Duration::ZERO, "boom".into()));
        assert!(summary.is_success());
        assert_eq!(summary.counts_line(), "1 passed, 1 xfailed");

        summary.record(&TestResult::XPassed(Duration::ZERO));
        assert!(!summary.is_success());
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_empty_summary_line() {
        assert_eq!(TestSummary::default().counts_line(), "no tests ran");
    }

    #[test]
    fn test_failure_kinds() {
        assert!(TestResult::Failed(Duration::ZERO, String::new()).is_failure());
        assert!(TestResult::XPassed(Duration::ZERO).is_failure());
        assert!(!TestResult::XFailed(Duration::ZERO, String::new()).is_failure());
        assert!(!TestResult::Passed(Duration::ZERO).is_failure());
    }

    #[test]
    fn test_console_reporter_collects_failures() {
        let mut reporter = ConsoleReporter::new(false);
        let case = TestCase::named("broken");
        reporter.on_test_complete(&case, &TestResult::Failed(Duration::ZERO, "missing".into()));
        reporter.on_test_complete(&case, &TestResult::Passed(Duration::ZERO));
        assert_eq!(reporter.failures, vec![("broken".to_string(), "missing".to_string())]);
    }
}

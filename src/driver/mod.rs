//! Test case driver
//!
//! Turns declarative runspec test cases into conversion runs and checks their post-conditions.
//!
//! ## Per-case flow
//!
//! 1. Reject a case with no inputs, no outputs and no arguments before anything is launched.
//! 2. Resolve input/output paths (absolute paths pass through, relative ones join the configured
//!    folders) and check that every input exists.
//! 3. Substitute `{INPUT}` in the arguments and run the tool, with the license detached if asked.
//! 4. Check outputs and help text; apply `expect_error`; clean up generated outputs if configured.

pub mod help;
pub mod reporter;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub use reporter::{ConsoleReporter, TestReporter, TestResult, TestSummary};

use crate::errors::{HarnessError, HarnessResult};
use crate::fs_utils::{check_file_exists, delete_generated_outputs, ensure_directory_exists};
use crate::license::LicenseGuard;
use crate::resolver::get_executable;
use crate::runner::{ConversionRunner, Invocation, RunnerConfig};
use crate::runspec::template::TemplateContext;
use crate::runspec::{GeneralConfig, Runspec, TestCase, load_runspec};

/// Message used when a case expected the tool to fail and it did not.
pub const UNEXPECTED_PASS_MESSAGE: &str = "Expected an error but the test passed.";

/// Resolved locations for a runspec's `general` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub executable: PathBuf,
    pub base_path: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub license_key: Option<PathBuf>,
    pub cleanup: bool,
}

impl Environment {
    /// Resolve directories against `base_dir`, create the output folder and locate the tool.
    ///
    /// A relative `license_key` is resolved against the tool's base path.
    #[tracing::instrument(skip_all, fields(tool = %general.tool_name))]
    pub fn setup(general: &GeneralConfig, base_dir: &Path) -> HarnessResult<Self> {
        let base_path = resolve_path(base_dir, &general.base_path);
        let input_dir = resolve_path(base_dir, &general.input_folder);
        let output_dir = resolve_path(base_dir, &general.output_folder);
        ensure_directory_exists(&output_dir)?;

        let executable = get_executable(&base_path, &base_path, &general.tool_name)?;
        tracing::info!("Executable found at {}", executable.display());

        let license_key = general
            .license_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| resolve_path(&base_path, key));

        Ok(Self {
            executable,
            base_path,
            input_dir,
            output_dir,
            license_key,
            cleanup: general.cleanup,
        })
    }
}

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}

/// How a single case ended when it did not raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    /// `expect_error` was set and the tool failed; carries the failure text.
    FailedAsExpected(String),
    /// `expect_error` was set but everything succeeded.
    UnexpectedPass,
}

/// Selection and stop behaviour for a suite run.
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Run only cases whose name contains this keyword.
    pub filter: Option<String>,
    /// Stop after the first failing case.
    pub stop_on_fail: bool,
}

/// Runs the test cases of one runspec against its executable.
#[derive(Debug)]
pub struct ConsoleTestRunner {
    runspec_file: PathBuf,
    runspec: Runspec,
    environment: Environment,
    runner: ConversionRunner,
}

impl ConsoleTestRunner {
    /// Load a runspec, resolving relative paths against the current directory.
    pub fn from_runspec(runspec_file: impl AsRef<Path>) -> HarnessResult<Self> {
        let cwd = env::current_dir().map_err(|err| HarnessError::io("reading current directory", err))?;
        Self::with_base_dir(runspec_file, &cwd)
    }

    /// Load a runspec, resolving relative paths against `base_dir`.
    pub fn with_base_dir(runspec_file: impl AsRef<Path>, base_dir: &Path) -> HarnessResult<Self> {
        let runspec_file = runspec_file.as_ref().to_path_buf();
        let runspec = load_runspec(&runspec_file)?;
        let environment = Environment::setup(&runspec.general, base_dir)?;
        Ok(Self {
            runspec_file,
            runspec,
            environment,
            runner: ConversionRunner::default(),
        })
    }

    pub fn with_runner_config(mut self, config: RunnerConfig) -> Self {
        self.runner = ConversionRunner::new(config);
        self
    }

    pub fn runspec(&self) -> &Runspec {
        &self.runspec
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Look up a case from the loaded runspec by name.
    pub fn test_case(&self, name: &str) -> Option<&TestCase> {
        self.runspec.tests.iter().find(|case| case.name == name)
    }

    /// Run one case. An unexpected pass of an `expect_error` case is an assertion failure.
    pub fn run_test(&self, case: &TestCase) -> HarnessResult<CaseOutcome> {
        match self.execute_case(case)? {
            CaseOutcome::UnexpectedPass => Err(HarnessError::Assertion(UNEXPECTED_PASS_MESSAGE.to_string())),
            outcome => Ok(outcome),
        }
    }

    /// Run every selected case in order. Failures are reported and the suite moves on, unless
    /// `stop_on_fail` is set.
    pub fn run_all_tests(&self, options: &SuiteOptions, reporter: &mut dyn TestReporter) -> TestSummary {
        tracing::info!("Starting all tests");
        let start = Instant::now();

        let (selected, deselected): (Vec<&TestCase>, Vec<&TestCase>) = self
            .runspec
            .tests
            .iter()
            .partition(|case| options.filter.as_deref().is_none_or(|kw| case.name.contains(kw)));

        let mut summary = TestSummary {
            deselected: deselected.len(),
            ..TestSummary::default()
        };
        reporter.on_collection_complete(&self.runspec_file.display().to_string(), selected.len());

        for case in selected {
            reporter.on_test_start(case);
            let started = Instant::now();
            let result = match self.execute_case(case) {
                Ok(CaseOutcome::Passed) => TestResult::Passed(started.elapsed()),
                Ok(CaseOutcome::FailedAsExpected(msg)) => TestResult::XFailed(started.elapsed(), msg),
                Ok(CaseOutcome::UnexpectedPass) => TestResult::XPassed(started.elapsed()),
                Err(err) => TestResult::Failed(started.elapsed(), err.to_string()),
            };
            summary.record(&result);
            reporter.on_test_complete(case, &result);

            if options.stop_on_fail && result.is_failure() {
                tracing::warn!("Stopping after first failure: {}", case.name);
                break;
            }
        }

        summary.duration = start.elapsed();
        reporter.on_run_complete(&summary);
        if summary.is_success() {
            tracing::info!("All tests completed successfully");
        } else {
            tracing::warn!("Test run finished with failures: {}", summary.counts_line());
        }
        summary
    }

    #[tracing::instrument(skip_all, fields(test = %case.name))]
    fn execute_case(&self, case: &TestCase) -> HarnessResult<CaseOutcome> {
        tracing::info!("Running test: {}", case.name);
        let outcome = self.execute_case_inner(case);
        if let Err(err) = &outcome {
            tracing::error!("Test {} failed: {err}", case.name);
        }
        outcome
    }

    fn execute_case_inner(&self, case: &TestCase) -> HarnessResult<CaseOutcome> {
        let env = &self.environment;

        let inputs: Vec<&str> = case.input_entries().collect();
        let outputs: Vec<&str> = case.output_entries().collect();
        if inputs.is_empty() && outputs.is_empty() && case.arguments.is_empty() {
            return Err(HarnessError::Validation(format!(
                "test case '{}' has no inputs, outputs or arguments",
                case.name
            )));
        }

        let input_files: Vec<PathBuf> = inputs.iter().map(|inp| resolve_path(&env.input_dir, inp)).collect();
        for input in &input_files {
            check_file_exists(input)?;
        }

        let output_files: Vec<PathBuf> = outputs.iter().map(|out| resolve_path(&env.output_dir, out)).collect();
        if case.create_output_dir {
            for output in &output_files {
                if let Some(parent) = output.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|err| HarnessError::io(format!("creating {}", parent.display()), err))?;
                }
            }
        }

        // `{INPUT}` is the first input's directory, or the configured input folder.
        let input_dir = input_files
            .first()
            .and_then(|first| first.parent())
            .unwrap_or(env.input_dir.as_path());
        let context = TemplateContext::for_input(input_dir);
        let tool_args = case
            .arguments
            .iter()
            .map(|arg| context.render(arg))
            .collect::<HarnessResult<Vec<_>>>()?;

        let invocation = self.invocation(&input_files, &output_files, tool_args);

        match self.run_and_check(case, &invocation, &output_files) {
            Ok(()) if case.expect_error => {
                tracing::error!("Test {}: {UNEXPECTED_PASS_MESSAGE}", case.name);
                Ok(CaseOutcome::UnexpectedPass)
            }
            Ok(()) => {
                tracing::info!("Test passed: {}", case.name);
                delete_generated_outputs(env.cleanup, &output_files)?;
                Ok(CaseOutcome::Passed)
            }
            Err(err) if case.expect_error && err.is_expected_failure() => {
                tracing::info!("Test failed as expected: {} - {err}", case.name);
                delete_generated_outputs(env.cleanup, &output_files)?;
                Ok(CaseOutcome::FailedAsExpected(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// `<tool> [--input <inputs>] [--output <outputs>] <args...>`; multiple paths are joined with
    /// spaces into a single argument.
    fn invocation(&self, inputs: &[PathBuf], outputs: &[PathBuf], tool_args: Vec<String>) -> Invocation {
        let mut invocation = Invocation::new(&self.environment.executable);
        if !inputs.is_empty() {
            invocation = invocation.arg("--input").arg(join_paths(inputs));
        }
        if !outputs.is_empty() {
            invocation = invocation.arg("--output").arg(join_paths(outputs));
        }
        invocation.args(tool_args)
    }

    fn run_and_check(&self, case: &TestCase, invocation: &Invocation, outputs: &[PathBuf]) -> HarnessResult<()> {
        let _license = if case.detach_license {
            let license = self.environment.license_key.as_deref().ok_or_else(|| {
                HarnessError::Configuration(format!(
                    "test case '{}' detaches the license but no license_key is configured",
                    case.name
                ))
            })?;
            Some(LicenseGuard::detach(license)?)
        } else {
            None
        };

        self.runner.run(invocation)?;

        if case.check_output_exist {
            for output in outputs {
                if !output.exists() {
                    return Err(HarnessError::Assertion(format!(
                        "Output file {} does not exist",
                        output.display()
                    )));
                }
            }
        }

        if let Some(expected) = &case.compare_string {
            help::compare_help(&self.environment.executable, expected, self.runner.config())?;
        }

        Ok(())
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

//! CLI module for the console test runner
//!
//! ## Commands
//!
//! - `--runspec <FILE>` - Run every test case of a runspec (pytest-style output)
//! - `generate <RUNSPEC> <OUTPUT_DIR>` - Write one Rust integration test per test case
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::errors::HarnessError;
use crate::version::RUNNER_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Harness errors reaching the CLI are rendered as miette reports (code, message, help).
impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        CliError::failure(format!("{:?}", miette::Report::new(err)))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Runs declarative console tests against a command-line conversion tool
#[derive(Parser, Debug)]
#[command(name = "console-test-runner")]
#[command(version = RUNNER_VERSION)]
#[command(about = "Run runspec-driven console tests against a conversion tool", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Runspec JSON file to execute
    #[arg(long, value_name = "FILE")]
    pub runspec: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Run only test cases whose name contains EXPR
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one Rust integration test per runspec test case
    Generate {
        /// Runspec JSON file
        #[arg(value_name = "RUNSPEC")]
        runspec: PathBuf,
        /// Directory receiving the generated test files
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::Generate { runspec, output_dir }) => commands::generate_scripts(&runspec, &output_dir),
        None => {
            let Some(runspec) = cli.runspec else {
                return Err(CliError::failure(
                    "Error: --runspec <FILE> is required (or use the `generate` subcommand)",
                ));
            };
            commands::run_suite(&runspec, cli.verbose, cli.stop_on_fail, cli.filter.as_deref())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_runspec() {
        let cli = Cli::try_parse_from(["console-test-runner", "--runspec", "specs/run.json"]).unwrap();
        assert_eq!(cli.runspec, Some(PathBuf::from("specs/run.json")));
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_suite_flags() {
        let cli =
            Cli::try_parse_from(["console-test-runner", "--runspec", "r.json", "-v", "-x", "-k", "license"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.stop_on_fail);
        assert_eq!(cli.filter.as_deref(), Some("license"));
    }

    #[test]
    fn test_cli_parse_generate() {
        let cli = Cli::try_parse_from(["console-test-runner", "generate", "r.json", "out"]).unwrap();
        if let Some(Command::Generate { runspec, output_dir }) = cli.command {
            assert_eq!(runspec, PathBuf::from("r.json"));
            assert_eq!(output_dir, PathBuf::from("out"));
        } else {
            panic!("Expected Generate command");
        }
    }

    #[test]
    fn test_missing_runspec_is_an_error() {
        let cli = Cli::try_parse_from(["console-test-runner"]).unwrap();
        let err = execute(cli).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("--runspec"));
    }

    #[test]
    fn test_harness_error_conversion() {
        let err: CliError = HarnessError::Validation("bad case".into()).into();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("bad case"));
    }
}

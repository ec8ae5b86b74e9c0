//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::env;
use std::path::Path;

use crate::codegen::ScriptGenerator;
use crate::driver::{ConsoleReporter, ConsoleTestRunner, SuiteOptions};
use crate::runspec::load_runspec;

use super::{CliError, CliResult, ExitCode};

/// Run every selected test case of a runspec and report pytest-style.
pub fn run_suite(runspec: &Path, verbose: bool, stop_on_fail: bool, filter: Option<&str>) -> CliResult<ExitCode> {
    let runner = ConsoleTestRunner::from_runspec(runspec)?;
    let options = SuiteOptions {
        filter: filter.map(str::to_string),
        stop_on_fail,
    };

    let mut reporter = ConsoleReporter::new(verbose);
    let summary = runner.run_all_tests(&options, &mut reporter);

    Ok(if summary.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Write one integration test per case into `output_dir`.
pub fn generate_scripts(runspec_file: &Path, output_dir: &Path) -> CliResult<ExitCode> {
    let runspec = load_runspec(runspec_file)?;
    let cwd = env::current_dir().map_err(|e| CliError::failure(format!("Error reading current directory: {e}")))?;
    let runspec_file = if runspec_file.is_absolute() { runspec_file.to_path_buf() } else { cwd.join(runspec_file) };

    let written = ScriptGenerator::new(&runspec, runspec_file, cwd).generate(output_dir)?;
    println!("Generated {} test file(s) in {}", written.len(), output_dir.display());
    Ok(ExitCode::SUCCESS)
}

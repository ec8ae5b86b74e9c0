//! Test-script generation
//!
//! Writes one Rust integration test per runspec test case. Each generated file loads the runspec
//! through the library and runs exactly that case, so a suite can be checked into a regular cargo
//! test crate and traced back to its requirement through the header comment.
//!
//! ```text
//! Runspec → (per case) quote! → syn::File → prettyplease → header + source → test_<name>.rs
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::errors::{HarnessError, HarnessResult};
use crate::fs_utils::ensure_directory_exists;
use crate::runspec::{GeneralConfig, Runspec, TestCase};
use crate::version::RUNNER_VERSION;

/// Placeholder for traceability fields missing from the runspec.
pub const UNKNOWN: &str = "UNKNOWN";

/// One rendered test file, not yet written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    pub test_name: String,
    pub file_name: String,
    pub source: String,
}

/// Generates test files for every case of a runspec.
#[derive(Debug)]
pub struct ScriptGenerator<'a> {
    runspec: &'a Runspec,
    runspec_file: PathBuf,
    base_dir: PathBuf,
}

impl<'a> ScriptGenerator<'a> {
    /// `base_dir` is embedded in the generated tests so relative runspec paths resolve the same
    /// way they did at generation time.
    pub fn new(runspec: &'a Runspec, runspec_file: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            runspec,
            runspec_file: runspec_file.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Render every case. Function names are de-duplicated with a numeric suffix.
    pub fn render_all(&self) -> HarnessResult<Vec<GeneratedScript>> {
        let mut seen = HashSet::new();
        let mut scripts = Vec::with_capacity(self.runspec.tests.len());

        for case in &self.runspec.tests {
            let base = sanitize_name(&case.name);
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            scripts.push(self.render_case(case, &name)?);
        }
        Ok(scripts)
    }

    /// Write all scripts into `output_dir`, returning the written paths in runspec order.
    #[tracing::instrument(skip_all, fields(output_dir = %output_dir.display()))]
    pub fn generate(&self, output_dir: &Path) -> HarnessResult<Vec<PathBuf>> {
        ensure_directory_exists(output_dir)?;

        let mut written = Vec::new();
        for script in self.render_all()? {
            let path = output_dir.join(&script.file_name);
            fs::write(&path, &script.source)
                .map_err(|err| HarnessError::io(format!("writing {}", path.display()), err))?;
            tracing::info!("Generated {} for test {}", path.display(), script.test_name);
            written.push(path);
        }
        Ok(written)
    }

    fn render_case(&self, case: &TestCase, ident_name: &str) -> HarnessResult<GeneratedScript> {
        let tokens = self.case_tokens(case, ident_name);
        let file: syn::File = syn::parse2(tokens).map_err(|err| {
            HarnessError::Validation(format!("generated test for '{}' is not valid Rust: {err}", case.name))
        })?;
        let body = prettyplease::unparse(&file);

        Ok(GeneratedScript {
            test_name: case.name.clone(),
            file_name: format!("test_{ident_name}.rs"),
            source: format!("{}\n{body}", traceability_header(&self.runspec.general, case)),
        })
    }

    fn case_tokens(&self, case: &TestCase, ident_name: &str) -> TokenStream {
        let fn_ident = format_ident!("test_{}", ident_name);
        let runspec_file = self.runspec_file.display().to_string();
        let base_dir = self.base_dir.display().to_string();
        let case_name = case.name.as_str();

        quote! {
            use std::path::Path;

            use console_test_runner::driver::ConsoleTestRunner;

            const RUNSPEC: &str = #runspec_file;
            const BASE_DIR: &str = #base_dir;
            const CASE: &str = #case_name;

            #[test]
            fn #fn_ident() {
                let runner = ConsoleTestRunner::with_base_dir(RUNSPEC, Path::new(BASE_DIR))
                    .expect("runspec loads");
                let case = runner.test_case(CASE).expect("test case is present in the runspec");
                runner.run_test(case).expect("test case passes");
            }
        }
    }
}

/// Comment block linking a generated test back to the requirement tracker.
pub fn traceability_header(general: &GeneralConfig, case: &TestCase) -> String {
    let field = |value: Option<&str>| value.filter(|v| !v.is_empty()).unwrap_or(UNKNOWN).to_string();
    format!(
        "// Sync folder: {}\n// Test ID: {}\n// Test URL: {}\n// Test name: {}\n// Version: 1\n// Generated by console-test-runner v{}\n",
        field(general.sync_folder.as_deref()),
        field(case.jama_id.as_deref()),
        field(case.jama_url.as_deref()),
        case.name,
        RUNNER_VERSION,
    )
}

/// Lowercased test name with every character outside `[a-z0-9_]` replaced by `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if cleaned.is_empty() { "case".to_string() } else { cleaned }
}

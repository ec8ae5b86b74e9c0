//! Error taxonomy for the harness.
//!
//! Two kinds of failure come from the executable under test and may be expected by a test case:
//! [`HarnessError::Authorization`] and [`HarnessError::Conversion`]. Everything else describes a
//! misconfigured harness (missing files, malformed runspec, invalid test case) and always propagates.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while loading a runspec, resolving the executable, or running test cases.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    /// The executable rejected its credentials; carries the offending output line.
    #[error("Authorization failed: {message}")]
    #[diagnostic(
        code(harness::authorization),
        help("the tool reported a credential or license problem; check the license key")
    )]
    Authorization { message: String },

    /// Non-zero exit, or an error marker seen on stdout.
    #[error("Conversion failed: {}", conversion_summary(.trigger, .detail))]
    #[diagnostic(code(harness::conversion))]
    Conversion {
        /// Exit code, if the process was reaped and exited normally.
        exit_code: Option<i32>,
        /// The stdout line that stopped the run early, if any.
        trigger: Option<String>,
        /// stderr, or stdout when stderr was empty.
        detail: String,
    },

    #[error("{what} not found: {}", .path.display())]
    #[diagnostic(code(harness::not_found))]
    NotFound { what: &'static str, path: PathBuf },

    #[error("configuration error: {0}")]
    #[diagnostic(code(harness::configuration), help("check the runspec JSON document"))]
    Configuration(String),

    #[error("invalid test case: {0}")]
    #[diagnostic(code(harness::validation))]
    Validation(String),

    #[error("assertion failed: {0}")]
    #[diagnostic(code(harness::assertion))]
    Assertion(String),

    #[error("failed to launch '{program}': {source}")]
    #[diagnostic(code(harness::launch))]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' did not finish within {}s", .after.as_secs_f64())]
    #[diagnostic(code(harness::timeout))]
    Timeout { program: String, after: Duration },

    #[error("unsupported package format: {}", .0.display())]
    #[diagnostic(code(harness::package), help("supported formats are .zip, .tar, .tar.gz, .tgz and .gz"))]
    UnsupportedPackage(PathBuf),

    #[error("{context}: {source}")]
    #[diagnostic(code(harness::io))]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// Build an [`HarnessError::Io`] with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// Whether this failure originates from the executable under test.
    ///
    /// Only these may be swallowed by a test case that declares `expect_error`.
    pub fn is_expected_failure(&self) -> bool {
        matches!(self, Self::Authorization { .. } | Self::Conversion { .. })
    }
}

fn conversion_summary<'a>(trigger: &'a Option<String>, detail: &'a str) -> &'a str {
    trigger.as_deref().unwrap_or(detail)
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

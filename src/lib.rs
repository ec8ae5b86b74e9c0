#![forbid(unsafe_code)]
//! Console test runner
//!
//! Runs declarative, JSON-described test cases against a command-line conversion tool: it locates
//! (or unpacks) the tool, launches it, watches its stdout for authorization and error markers,
//! terminates it early when one appears, and checks the expected outputs.
//!
//! ## Layers
//!
//! - `runspec` - runspec loading and placeholder templating
//! - `resolver` - executable search and package extraction
//! - `runner` - the Conversion Runner: process launch, live stdout classification, termination
//! - `driver` - per-test-case orchestration and reporting
//! - `codegen` - generation of one Rust test per runspec case
//! - `cli` - command-line entry point
//!
//! The runner knows nothing about runspecs or test cases; the driver composes it.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `codegen` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Generated code**: generated test scripts call `.expect()`; they are tests themselves.

pub mod cli;
pub mod codegen;
pub mod driver;
pub mod errors;
pub mod fs_utils;
pub mod license;
pub mod resolver;
pub mod runner;
pub mod runspec;
pub mod version;

pub use driver::{ConsoleTestRunner, SuiteOptions};
pub use errors::{HarnessError, HarnessResult};
pub use runner::{ConversionRunner, Invocation, RunnerConfig};
pub use runspec::{Runspec, TestCase, load_runspec};

//! Runner version information.
//!
//! Shared by the CLI `--version` output and the header of generated test scripts.

/// The runner version string, taken from Cargo metadata at compile time.
pub const RUNNER_VERSION: &str = env!("CARGO_PKG_VERSION");

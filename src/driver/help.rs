//! `--help` text comparison.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::Receiver;

use crate::errors::{HarnessError, HarnessResult};
use crate::runner::RunnerConfig;
use crate::runner::collect_stream;
use crate::runner::process::ProcessHandle;

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run `<executable> --help` and assert that `expected` occurs in its output, ignoring
/// whitespace differences.
///
/// The query is bounded by `config.help_timeout`; a tool that does not finish is terminated and
/// reported as [`HarnessError::Timeout`].
pub fn compare_help(executable: &Path, expected: &str, config: &RunnerConfig) -> HarnessResult<()> {
    tracing::info!("Comparing help output of {}", executable.display());
    let actual = query_help(executable, config)?;
    check_contains(&actual, expected)
}

/// Help text of `executable`: stdout, or stderr when stdout is blank.
pub fn query_help(executable: &Path, config: &RunnerConfig) -> HarnessResult<String> {
    let program = executable.display().to_string();
    let mut child = Command::new(executable)
        .arg("--help")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| HarnessError::Launch {
            program: program.clone(),
            source,
        })?;

    let stdout_rx = child.stdout.take().map(collect_stream);
    let stderr_rx = child.stderr.take().map(collect_stream);
    let process = ProcessHandle::new(child);

    let status = process
        .wait_timeout(config.help_timeout, config.poll_interval)
        .map_err(|err| HarnessError::io("waiting for --help", err))?;
    if status.is_none() {
        tracing::error!("{program} --help did not finish within {:?}", config.help_timeout);
        process.terminate();
        process
            .wait(config.grace_period, config.poll_interval)
            .map_err(|err| HarnessError::io("reaping --help", err))?;
        return Err(HarnessError::Timeout {
            program,
            after: config.help_timeout,
        });
    }

    let receive = |rx: Option<Receiver<String>>| {
        rx.and_then(|rx| rx.recv_timeout(config.stderr_timeout).ok())
            .unwrap_or_default()
    };
    let stdout = receive(stdout_rx);
    Ok(if stdout.trim().is_empty() { receive(stderr_rx) } else { stdout })
}

/// Whitespace-insensitive containment check.
pub fn check_contains(actual: &str, expected: &str) -> HarnessResult<()> {
    let actual = normalize_whitespace(actual);
    let expected = normalize_whitespace(expected);
    if actual.contains(&expected) {
        Ok(())
    } else {
        Err(HarnessError::Assertion(format!(
            "expected help text not found\n  expected: {expected}\n  actual:   {actual}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Usage:\n\t tool  [OPTIONS]\r\n"), "Usage: tool [OPTIONS]");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_check_contains_ignores_layout() {
        let help = "Usage: tool [OPTIONS]\n\nOptions:\n  --input <FILE>    Input file\n";
        check_contains(help, "--input <FILE> Input file").unwrap();
        check_contains(help, "Options:\n    --input").unwrap();
    }

    #[cfg(unix)]
    fn help_script(dir: &Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("tool");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_query_help_falls_back_to_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = help_script(tmp.path(), "echo 'Usage: tool' >&2");
        let help = query_help(&tool, &RunnerConfig::new()).unwrap();
        assert_eq!(help.trim(), "Usage: tool");
    }

    #[cfg(unix)]
    #[test]
    fn test_hanging_help_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = help_script(tmp.path(), "exec sleep 30");
        let config = RunnerConfig::new()
            .with_help_timeout(std::time::Duration::from_millis(200))
            .with_grace_period(std::time::Duration::from_secs(2));

        let started = std::time::Instant::now();
        let err = compare_help(&tool, "Usage", &config).unwrap_err();
        assert!(matches!(err, HarnessError::Timeout { .. }));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_check_contains_mismatch() {
        let err = check_contains("Usage: tool", "--output").unwrap_err();
        assert!(matches!(err, HarnessError::Assertion(_)));
    }
}

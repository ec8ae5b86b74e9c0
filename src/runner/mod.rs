//! Conversion runner
//!
//! Launches the executable under test, monitors its stdout on a dedicated thread, and terminates
//! it early when the output reports an error.
//!
//! ## Flow
//!
//! 1. Spawn the process with stdout and stderr piped.
//! 2. Drain stderr on a collector thread and stdout on the [`monitor`](monitor::Monitor).
//! 3. Park on the monitor join, then reap the process (bounded if it was terminated).
//! 4. Resolve the outcome: a monitor error first, then non-zero exit or stop signal, else stdout.

pub mod classify;
pub mod config;
pub mod monitor;
pub mod process;

use std::ffi::OsString;
use std::fmt;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;

pub use classify::{LineClassifier, LineKind, Rule};
pub use config::RunnerConfig;
pub use monitor::StopSignal;

use crate::errors::{HarnessError, HarnessResult};
use monitor::{Monitor, MonitorReport};
use process::ProcessHandle;

/// Program plus arguments for one conversion. Not modified once handed to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a full argument vector whose first element is the program.
    pub fn from_argv<S: Into<OsString>>(argv: impl IntoIterator<Item = S>) -> HarnessResult<Self> {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv
            .next()
            .ok_or_else(|| HarnessError::Validation("empty command line".to_string()))?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<S: Into<OsString>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        Path::new(&self.program)
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs the executable under test and classifies the outcome.
#[derive(Debug, Clone, Default)]
pub struct ConversionRunner {
    config: RunnerConfig,
}

impl ConversionRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the invocation, echoing progress lines to this process's stdout when enabled.
    ///
    /// Returns the captured stdout on success.
    pub fn run(&self, invocation: &Invocation) -> HarnessResult<String> {
        if self.config.echo {
            let mut stdout = io::stdout();
            self.run_with_echo(invocation, Some(&mut stdout))
        } else {
            self.run_with_echo::<io::Sink>(invocation, None)
        }
    }

    /// Run the invocation, forwarding progress lines to `echo`.
    #[tracing::instrument(skip_all, fields(program = %invocation.program().display()))]
    pub fn run_with_echo<W: Write + Send>(
        &self,
        invocation: &Invocation,
        echo: Option<&mut W>,
    ) -> HarnessResult<String> {
        tracing::info!("Executing command: {invocation}");

        let mut child = Command::new(invocation.program())
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Launch {
                program: invocation.program().display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let process = ProcessHandle::new(child);
        let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
            self.abandon(&process);
            return Err(HarnessError::io(
                "capturing tool output",
                io::Error::other("stdout or stderr pipe unavailable"),
            ));
        };

        let stderr_rx = collect_stream(stderr);
        let stop = StopSignal::new();

        let monitored = thread::scope(|scope| {
            let monitor = Monitor::new(&self.config.classifier, &stop, &process, echo);
            scope
                .spawn(move || monitor.drain(BufReader::new(stdout)))
                .join()
        });

        let report = match monitored {
            Ok(Ok(report)) => report,
            Ok(Err(err)) => {
                self.abandon(&process);
                return Err(err);
            }
            Err(_) => {
                self.abandon(&process);
                return Err(HarnessError::io(
                    "monitoring tool stdout",
                    io::Error::other("stdout monitor panicked"),
                ));
            }
        };

        let status = process
            .wait(self.config.grace_period, self.config.poll_interval)
            .map_err(|err| HarnessError::io("waiting for tool to exit", err))?;
        let stderr = stderr_rx
            .recv_timeout(self.config.stderr_timeout)
            .unwrap_or_else(|_| {
                tracing::debug!("stderr collector did not finish in time");
                String::new()
            });

        let exit_ok = status.is_some_and(|s| s.success());
        if stop.is_set() || !exit_ok {
            return Err(conversion_failure(report, status.and_then(|s| s.code()), stderr));
        }

        tracing::debug!("Command output: {}", report.captured);
        Ok(report.captured)
    }

    /// Terminate (if still running) and reap within the grace period.
    fn abandon(&self, process: &ProcessHandle) {
        process.terminate();
        if let Err(err) = process.wait(self.config.grace_period, self.config.poll_interval) {
            tracing::warn!("failed to reap tool process: {err}");
        }
    }
}

fn conversion_failure(report: MonitorReport, exit_code: Option<i32>, stderr: String) -> HarnessError {
    let detail = if stderr.trim().is_empty() { report.captured } else { stderr };
    tracing::error!(
        exit_code = ?exit_code,
        "Command execution failed: {}",
        report.trigger.as_deref().unwrap_or(detail.trim())
    );
    HarnessError::Conversion {
        exit_code,
        trigger: report.trigger,
        detail,
    }
}

/// Drain a child pipe on its own thread so a chatty stream cannot stall the child.
pub(crate) fn collect_stream<R: Read + Send + 'static>(mut stream: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(err) = stream.read_to_end(&mut buf) {
            tracing::debug!("pipe read ended early: {err}");
        }
        // The receiver may already have given up.
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

//! The stdout monitor.
//!
//! One monitor runs per process. It drains stdout line by line so the child never blocks on a full
//! pipe, echoes ordinary lines, and stops the run on the first error or authorization line.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use super::classify::{LineClassifier, LineKind};
use super::process::ProcessHandle;
use crate::errors::{HarnessError, HarnessResult};

/// Set-once flag raised by the monitor when it detects a terminal condition.
#[derive(Debug, Default)]
pub struct StopSignal(AtomicBool);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` for the call that raised it.
    pub fn trigger(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What the monitor saw before the stream ended or it stopped reading.
#[derive(Debug, Default)]
pub struct MonitorReport {
    /// Every line read, including its line terminator.
    pub captured: String,
    /// The error line that stopped the run, trimmed.
    pub trigger: Option<String>,
}

pub struct Monitor<'a, W: Write + Send> {
    classifier: &'a LineClassifier,
    stop: &'a StopSignal,
    process: &'a ProcessHandle,
    echo: Option<&'a mut W>,
}

impl<'a, W: Write + Send> Monitor<'a, W> {
    pub fn new(
        classifier: &'a LineClassifier,
        stop: &'a StopSignal,
        process: &'a ProcessHandle,
        echo: Option<&'a mut W>,
    ) -> Self {
        Self {
            classifier,
            stop,
            process,
            echo,
        }
    }

    /// Read until end of stream or a terminal line.
    ///
    /// An authorization line is returned as [`HarnessError::Authorization`] straight from here; a
    /// generic error line ends the drain with `trigger` set and leaves the verdict to the caller.
    pub fn drain<R: BufRead>(mut self, mut reader: R) -> HarnessResult<MonitorReport> {
        let mut report = MonitorReport::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|err| HarnessError::io("reading tool stdout", err))?;
            if read == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            report.captured.push_str(&line);
            let text = line.trim_end_matches(['\r', '\n']);

            match self.classifier.classify(text) {
                Some(LineKind::Authorization) => {
                    let message = text.trim().to_string();
                    tracing::error!("authorization failure detected: {message}");
                    self.stop_process();
                    return Err(HarnessError::Authorization { message });
                }
                Some(LineKind::Error) => {
                    let message = text.trim().to_string();
                    tracing::error!("error detected in tool output: {message}");
                    self.stop_process();
                    report.trigger = Some(message);
                    break;
                }
                None => self.forward(text),
            }
        }

        Ok(report)
    }

    fn stop_process(&self) {
        // The flag must be visible before the kill is requested.
        self.stop.trigger();
        self.process.terminate();
    }

    fn forward(&mut self, text: &str) {
        if let Some(echo) = self.echo.as_mut() {
            if let Err(err) = writeln!(echo, "{text}") {
                tracing::debug!("dropping echoed line: {err}");
            }
        }
    }
}

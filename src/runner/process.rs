//! Ownership of the spawned tool process.
//!
//! The monitor may request termination while the main path is parked on the monitor join, so the
//! child sits behind a mutex. Termination is issued at most once.

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

pub struct ProcessHandle {
    child: Mutex<Child>,
    terminated: AtomicBool,
}

impl ProcessHandle {
    pub fn new(child: Child) -> Self {
        Self {
            child: Mutex::new(child),
            terminated: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> u32 {
        self.lock().id()
    }

    /// Force-terminate the process.
    ///
    /// Returns `true` if this call issued the kill. A failed kill is logged and not retried: the
    /// bounded wait in [`ProcessHandle::wait`] is what keeps the caller from hanging.
    pub fn terminate(&self) -> bool {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }
        let mut child = self.lock();
        match child.kill() {
            Ok(()) => tracing::debug!(pid = child.id(), "termination requested"),
            Err(err) => tracing::warn!(pid = child.id(), "termination request failed: {err}"),
        }
        true
    }

    pub fn was_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Reap the process.
    ///
    /// A process that ran to completion is waited for without a bound. A terminated process is
    /// polled until `grace_period` elapses; `Ok(None)` means it was still not reaped by then.
    pub fn wait(&self, grace_period: Duration, poll_interval: Duration) -> io::Result<Option<ExitStatus>> {
        if !self.was_terminated() {
            return self.lock().wait().map(Some);
        }

        let status = self.wait_timeout(grace_period, poll_interval)?;
        if status.is_none() {
            tracing::warn!(
                pid = self.id(),
                "process did not exit within {}ms of termination; giving up on it",
                grace_period.as_millis()
            );
        }
        Ok(status)
    }

    /// Poll for exit for at most `timeout` without terminating. `Ok(None)` means still running.
    pub fn wait_timeout(&self, timeout: Duration, poll_interval: Duration) -> io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.lock().try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(poll_interval);
        }
    }
}

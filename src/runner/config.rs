//! Tuning for the conversion runner.

use std::time::Duration;

use super::classify::LineClassifier;

/// Conversion runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How long to wait for a terminated process to be reaped
    pub grace_period: Duration,
    /// Interval between exit-status polls while waiting out the grace period
    pub poll_interval: Duration,
    /// How long to wait for the stderr collector once the process is gone
    pub stderr_timeout: Duration,
    /// Upper bound for a `--help` query
    pub help_timeout: Duration,
    /// Rules used to classify stdout lines
    pub classifier: LineClassifier,
    /// Echo non-error stdout lines to the live output stream
    pub echo: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            poll_interval: Duration::from_millis(20),
            stderr_timeout: Duration::from_secs(5),
            help_timeout: Duration::from_secs(30),
            classifier: LineClassifier::default(),
            echo: true,
        }
    }
}

impl RunnerConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_stderr_timeout(mut self, stderr_timeout: Duration) -> Self {
        self.stderr_timeout = stderr_timeout;
        self
    }

    pub fn with_help_timeout(mut self, help_timeout: Duration) -> Self {
        self.help_timeout = help_timeout;
        self
    }

    pub fn with_classifier(mut self, classifier: LineClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Enable or disable the real-time echo of stdout lines
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grace_period() {
        let config = RunnerConfig::default();
        assert_eq!(config.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn test_default_echo_enabled() {
        assert!(RunnerConfig::new().echo);
    }

    #[test]
    fn test_builder_chain() {
        let config = RunnerConfig::new()
            .with_grace_period(Duration::from_millis(250))
            .with_poll_interval(Duration::from_millis(5))
            .with_stderr_timeout(Duration::from_secs(1))
            .with_echo(false);
        assert_eq!(config.grace_period, Duration::from_millis(250));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.stderr_timeout, Duration::from_secs(1));
        assert!(!config.echo);
    }
}

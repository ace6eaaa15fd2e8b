//! Execution polling.
//!
//! The platform's status vocabulary differs between deployments, so whether
//! an execution is finished is decided by a configurable [`TerminalPolicy`]:
//! a status outside the non-terminal set, or the presence of a result-shaped
//! field, ends the wait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PollingConfig;
use crate::metrics::POLL_ATTEMPTS;
use crate::platform::{AgentPlatform, ExecutionLookup, ExecutionRecord, PlatformError};

/// Errors returned while waiting for an execution.
#[derive(Debug, Error)]
pub enum PollError {
    /// Lookup failed with something other than "not ready".
    #[error("{label}: {source}")]
    Platform {
        label: String,
        #[source]
        source: PlatformError,
    },

    /// No terminal state before the deadline.
    #[error("{label}: execution did not finish within {timeout:?}")]
    Timeout { label: String, timeout: Duration },
}

/// Decides when an execution record is finished, and whether it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalPolicy {
    non_terminal_statuses: Vec<String>,
    result_fields: Vec<String>,
    failure_statuses: Vec<String>,
}

impl TerminalPolicy {
    pub fn new(
        non_terminal_statuses: Vec<String>,
        result_fields: Vec<String>,
        failure_statuses: Vec<String>,
    ) -> Self {
        let lower = |v: Vec<String>| v.into_iter().map(|s| s.trim().to_lowercase()).collect();
        Self {
            non_terminal_statuses: lower(non_terminal_statuses),
            result_fields,
            failure_statuses: lower(failure_statuses),
        }
    }

    pub fn is_terminal(&self, record: &ExecutionRecord) -> bool {
        let status_terminal = record
            .status()
            .is_some_and(|s| !self.non_terminal_statuses.contains(&s));

        status_terminal
            || self
                .result_fields
                .iter()
                .any(|field| record.field(field).is_some())
    }

    pub fn is_failure(&self, record: &ExecutionRecord) -> bool {
        record
            .status()
            .is_some_and(|s| self.failure_statuses.contains(&s))
    }
}

impl Default for TerminalPolicy {
    fn default() -> Self {
        PollingConfig::default().terminal_policy()
    }
}

/// Polls executions until they reach a terminal state.
#[derive(Clone)]
pub struct ExecutionPoller {
    platform: Arc<dyn AgentPlatform>,
    interval: Duration,
    timeout: Duration,
    policy: TerminalPolicy,
}

impl ExecutionPoller {
    pub fn new(
        platform: Arc<dyn AgentPlatform>,
        interval: Duration,
        timeout: Duration,
        policy: TerminalPolicy,
    ) -> Self {
        Self {
            platform,
            interval,
            timeout,
            policy,
        }
    }

    pub fn from_config(platform: Arc<dyn AgentPlatform>, config: &PollingConfig) -> Self {
        Self::new(
            platform,
            Duration::from_millis(config.interval_ms),
            Duration::from_secs(config.timeout_secs),
            config.terminal_policy(),
        )
    }

    pub fn policy(&self) -> &TerminalPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for `handle` to finish. `label` names the stage in errors.
    ///
    /// The timeout bounds the whole wait, including an in-flight lookup.
    pub async fn wait_for_execution(
        &self,
        handle: &str,
        label: &str,
    ) -> Result<ExecutionRecord, PollError> {
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, self.poll_until_terminal(handle, label)).await {
            Ok(result) => {
                if result.is_ok() {
                    debug!(
                        "{}: execution {} finished after {:?}",
                        label,
                        handle,
                        started.elapsed()
                    );
                }
                result
            }
            Err(_) => {
                POLL_ATTEMPTS.with_label_values(&["timeout"]).inc();
                warn!(
                    "{}: execution {} still running after {:?}, giving up",
                    label, handle, self.timeout
                );
                Err(PollError::Timeout {
                    label: label.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        handle: &str,
        label: &str,
    ) -> Result<ExecutionRecord, PollError> {
        loop {
            match self.platform.get_execution(handle).await {
                Ok(ExecutionLookup::Ready(record)) => {
                    if self.policy.is_terminal(&record) {
                        POLL_ATTEMPTS.with_label_values(&["terminal"]).inc();
                        return Ok(record);
                    }
                    POLL_ATTEMPTS.with_label_values(&["running"]).inc();
                    debug!(
                        "{}: execution {} status={:?}",
                        label,
                        handle,
                        record.status()
                    );
                }
                Ok(ExecutionLookup::NotReady) => {
                    POLL_ATTEMPTS.with_label_values(&["not_ready"]).inc();
                    debug!("{}: execution {} not ready yet", label, handle);
                }
                Err(source) => {
                    POLL_ATTEMPTS.with_label_values(&["error"]).inc();
                    return Err(PollError::Platform {
                        label: label.to_string(),
                        source,
                    });
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

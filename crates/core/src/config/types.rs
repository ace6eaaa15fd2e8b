use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::pipeline::{ModelDescriptor, PipelineOptions};
use crate::poller::TerminalPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted multipart upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Remote agent platform (SwarmNode) connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Platform base URL, without the `/v1` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer credential sent on every platform request.
    #[serde(default)]
    pub api_key: String,
    /// Per HTTP request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.swarmnode.ai".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Agent identifiers for each pipeline stage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub ingest: String,
    /// Signals stage is skipped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<String>,
    #[serde(default)]
    pub projections: String,
    #[serde(default)]
    pub consensus: String,
    #[serde(default)]
    pub optimizer: String,
}

impl AgentsConfig {
    /// Names of required agents that have no id configured.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("ingest", &self.ingest),
            ("projections", &self.projections),
            ("consensus", &self.consensus),
            ("optimizer", &self.optimizer),
        ]
        .into_iter()
        .filter(|(_, id)| id.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Signals agent id, treating a blank value as unset.
    pub fn signals_agent(&self) -> Option<&str> {
        self.signals
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Execution polling behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Delay between execution lookups (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    /// Deadline for a single execution to reach a terminal state (seconds).
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
    /// Status strings that mean "keep polling".
    #[serde(default = "default_non_terminal_statuses")]
    pub non_terminal_statuses: Vec<String>,
    /// Fields whose presence marks an execution finished regardless of status.
    #[serde(default = "default_result_fields")]
    pub result_fields: Vec<String>,
    /// Terminal statuses that mean the remote agent failed.
    #[serde(default = "default_failure_statuses")]
    pub failure_statuses: Vec<String>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            timeout_secs: default_poll_timeout(),
            non_terminal_statuses: default_non_terminal_statuses(),
            result_fields: default_result_fields(),
            failure_statuses: default_failure_statuses(),
        }
    }
}

impl PollingConfig {
    pub fn terminal_policy(&self) -> TerminalPolicy {
        TerminalPolicy::new(
            self.non_terminal_statuses.clone(),
            self.result_fields.clone(),
            self.failure_statuses.clone(),
        )
    }
}

fn default_poll_interval() -> u64 {
    1500
}

fn default_poll_timeout() -> u64 {
    600
}

fn default_non_terminal_statuses() -> Vec<String> {
    ["queued", "pending", "running", "in_progress"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_result_fields() -> Vec<String> {
    ["players", "lineups", "consensus", "output"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_failure_statuses() -> Vec<String> {
    ["failed", "error", "errored", "cancelled", "timeout"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Options forwarded to every stage plus the projection model list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub options: PipelineOptions,
    /// One projection job is fanned out per model.
    #[serde(default = "default_models")]
    pub models: Vec<ModelDescriptor>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            options: PipelineOptions::default(),
            models: default_models(),
        }
    }
}

fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("anthropic", "claude-3-5-sonnet", 0.2),
        ModelDescriptor::new("openai", "gpt-4o-mini", 0.2),
    ]
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub platform: SanitizedPlatformConfig,
    pub agents: AgentsConfig,
    pub polling: PollingConfig,
    pub pipeline: PipelineConfig,
}

/// Platform config with the credential hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlatformConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub request_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            platform: SanitizedPlatformConfig {
                base_url: config.platform.base_url.clone(),
                api_key_configured: !config.platform.api_key.trim().is_empty(),
                request_timeout_secs: config.platform.request_timeout_secs,
            },
            agents: config.agents.clone(),
            polling: config.polling.clone(),
            pipeline: config.pipeline.clone(),
        }
    }
}

//! Remote agent platform integration.
//!
//! Agents (ingest, projections, optimizer, ...) run on SwarmNode. This module
//! submits jobs to them and looks up the resulting executions.

mod swarmnode;
mod types;

pub use swarmnode::SwarmNodeClient;
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the agent platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Every create-job endpoint variant failed.
    #[error("Create job failed for agent {agent_id}: {attempts}")]
    CreateJob { agent_id: String, attempts: String },

    /// Create succeeded but the body carried no execution handle.
    #[error("Create job response for agent {agent_id} has no execution handle: {body}")]
    MissingHandle { agent_id: String, body: String },

    /// Execution lookup returned a non-2xx status other than 404.
    #[error("Execution {handle} lookup failed ({status}): {body}")]
    GetExecution {
        handle: String,
        status: u16,
        body: String,
    },

    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl PlatformError {
    /// Raw text returned by the platform, for operator diagnostics.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            PlatformError::CreateJob { attempts, .. } => Some(attempts),
            PlatformError::MissingHandle { body, .. } => Some(body),
            PlatformError::GetExecution { body, .. } => Some(body),
            PlatformError::ParseError(body) => Some(body),
            _ => None,
        }
    }
}

/// Operations the pipeline needs from the agent platform.
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    /// Submit a job to an agent and return the execution handle.
    async fn create_job(&self, agent_id: &str, payload: Value)
        -> Result<JobHandle, PlatformError>;

    /// Look up an execution. A missing execution is `NotReady`, not an error.
    async fn get_execution(&self, handle: &str) -> Result<ExecutionLookup, PlatformError>;

    /// Whether the platform credential is present.
    fn is_configured(&self) -> bool {
        true
    }
}

//! SwarmNode agent platform client.
//!
//! Endpoint paths differ between SwarmNode deployments, so each operation
//! walks a short list of known variants before giving up.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{ExecutionLookup, ExecutionRecord, JobHandle, JobRequest};
use super::{AgentPlatform, PlatformError};
use crate::config::PlatformConfig;
use crate::metrics::JOBS_CREATED;

/// SwarmNode API client.
pub struct SwarmNodeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SwarmNodeClient {
    /// Create a new client. A missing API key is reported per call, not here.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
        })
    }

    fn create_urls(&self) -> [String; 2] {
        [
            format!("{}/v1/agent-executor-jobs/create/", self.base_url),
            format!("{}/v1/agent-executor-jobs/", self.base_url),
        ]
    }

    fn execution_urls(&self, handle: &str) -> [String; 2] {
        let handle = urlencoding::encode(handle);
        [
            format!("{}/v1/executions/{}/", self.base_url, handle),
            format!("{}/v1/executions/{}", self.base_url, handle),
        ]
    }

    fn ensure_configured(&self) -> Result<(), PlatformError> {
        if self.api_key.is_empty() {
            return Err(PlatformError::NotConfigured(
                "SwarmNode API key is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AgentPlatform for SwarmNodeClient {
    async fn create_job(
        &self,
        agent_id: &str,
        payload: Value,
    ) -> Result<JobHandle, PlatformError> {
        self.ensure_configured()?;

        let request = JobRequest {
            agent_id: agent_id.to_string(),
            payload,
        };
        let mut attempts: Vec<String> = Vec::new();

        for url in self.create_urls() {
            debug!("SwarmNode create job: agent={}, url={}", agent_id, url);

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header(header::ACCEPT, "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("Create job transport error at {}: {}", url, e);
                    attempts.push(format!("POST {}: {}", url, e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.is_success() {
                let created = created_handle(agent_id, body);
                JOBS_CREATED
                    .with_label_values(&[created_label(&created)])
                    .inc();
                return created;
            }

            warn!(
                "Create job rejected at {} ({}) for agent {}",
                url, status, agent_id
            );
            let body = if body.is_empty() {
                "no body".to_string()
            } else {
                body
            };
            attempts.push(format!("POST {} ({}): {}", url, status.as_u16(), body));
        }

        JOBS_CREATED.with_label_values(&["failed"]).inc();
        Err(PlatformError::CreateJob {
            agent_id: agent_id.to_string(),
            attempts: attempts.join(" | "),
        })
    }

    async fn get_execution(&self, handle: &str) -> Result<ExecutionLookup, PlatformError> {
        self.ensure_configured()?;

        for url in self.execution_urls(handle) {
            debug!("SwarmNode get execution: url={}", url);

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(PlatformError::GetExecution {
                    handle: handle.to_string(),
                    status: status.as_u16(),
                    body: if body.is_empty() {
                        "no body".to_string()
                    } else {
                        body
                    },
                });
            }

            let record: Value = serde_json::from_str(&body).map_err(|e| {
                PlatformError::ParseError(format!("Bad JSON from {} ({}): {}", url, e, body))
            })?;
            return Ok(ExecutionLookup::Ready(ExecutionRecord::new(record)));
        }

        Ok(ExecutionLookup::NotReady)
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Extract the execution handle from a 2xx create response body.
fn created_handle(agent_id: &str, body: String) -> Result<JobHandle, PlatformError> {
    let parsed: Value = serde_json::from_str(&body).map_err(|e| {
        PlatformError::ParseError(format!("Create job bad JSON ({}): {}", e, body))
    })?;
    JobHandle::from_response(&parsed).ok_or_else(|| PlatformError::MissingHandle {
        agent_id: agent_id.to_string(),
        body,
    })
}

fn created_label(created: &Result<JobHandle, PlatformError>) -> &'static str {
    if created.is_ok() {
        "ok"
    } else {
        "failed"
    }
}

//! Mock agent platform for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::platform::{
    AgentPlatform, ExecutionLookup, ExecutionRecord, JobHandle, PlatformError,
};

/// How the mock responds to jobs for an agent.
#[derive(Debug, Clone)]
pub enum AgentBehavior {
    /// Create succeeds; lookups return these in order, repeating the last.
    Executes(Vec<ExecutionLookup>),
    /// Create fails with this diagnostic body.
    CreateFails(String),
    /// Create succeeds; every lookup fails with this status and body.
    PollFails { status: u16, body: String },
}

impl AgentBehavior {
    /// Succeeds immediately with `result`.
    pub fn succeeds(result: Value) -> Self {
        AgentBehavior::Executes(vec![ExecutionLookup::Ready(ExecutionRecord::new(
            json!({ "status": "succeeded", "result": result }),
        ))])
    }

    /// Reports "running" `polls` times, then succeeds with `result`.
    pub fn succeeds_after(polls: usize, result: Value) -> Self {
        let mut lookups = vec![
            ExecutionLookup::Ready(ExecutionRecord::new(json!({ "status": "running" })));
            polls
        ];
        lookups.push(ExecutionLookup::Ready(ExecutionRecord::new(
            json!({ "status": "succeeded", "result": result }),
        )));
        AgentBehavior::Executes(lookups)
    }

    /// Never leaves the "running" state.
    pub fn never_finishes() -> Self {
        AgentBehavior::Executes(vec![ExecutionLookup::Ready(ExecutionRecord::new(
            json!({ "status": "running" }),
        ))])
    }
}

/// A create-job call recorded by the mock.
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub agent_id: String,
    pub payload: Value,
    /// Handle returned, or `None` if the create failed.
    pub handle: Option<String>,
}

struct Rule {
    agent_id: String,
    /// JSON pointer into the payload and the value it must equal.
    condition: Option<(String, Value)>,
    behavior: AgentBehavior,
}

impl Rule {
    fn matches(&self, agent_id: &str, payload: &Value) -> bool {
        self.agent_id == agent_id
            && self
                .condition
                .as_ref()
                .map_or(true, |(pointer, expected)| payload.pointer(pointer) == Some(expected))
    }
}

#[derive(Default)]
struct ExecutionScript {
    lookups: VecDeque<ExecutionLookup>,
    failure: Option<(u16, String)>,
    lookup_count: usize,
}

/// Mock implementation of the AgentPlatform trait.
///
/// Provides controllable behavior for testing:
/// - Per-agent scripted executions (optionally keyed on payload content)
/// - Injected create and lookup failures
/// - Recorded jobs and lookup counts for assertions
///
/// # Example
///
/// ```rust,ignore
/// use slaterunner_core::testing::{AgentBehavior, MockAgentPlatform};
///
/// let platform = MockAgentPlatform::new();
/// platform.on_agent("ingest", AgentBehavior::succeeds(json!({"players": []}))).await;
///
/// let handle = platform.create_job("ingest", json!({})).await?;
/// assert_eq!(platform.create_count("ingest").await, 1);
/// ```
pub struct MockAgentPlatform {
    rules: Arc<RwLock<Vec<Rule>>>,
    executions: Arc<RwLock<HashMap<String, ExecutionScript>>>,
    jobs: Arc<RwLock<Vec<RecordedJob>>>,
    next_id: AtomicUsize,
    configured: AtomicBool,
}

impl Default for MockAgentPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgentPlatform {
    /// Create a mock with no agents configured.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            executions: Arc::new(RwLock::new(HashMap::new())),
            jobs: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicUsize::new(1),
            configured: AtomicBool::new(true),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the behavior for every job sent to `agent_id`.
    pub async fn on_agent(&self, agent_id: &str, behavior: AgentBehavior) {
        self.rules.write().await.push(Rule {
            agent_id: agent_id.to_string(),
            condition: None,
            behavior,
        });
    }

    /// Set the behavior for jobs to `agent_id` whose payload has `expected`
    /// at `pointer`. Conditional rules are checked before plain ones.
    pub async fn on_agent_when(
        &self,
        agent_id: &str,
        pointer: &str,
        expected: Value,
        behavior: AgentBehavior,
    ) {
        self.rules.write().await.insert(
            0,
            Rule {
                agent_id: agent_id.to_string(),
                condition: Some((pointer.to_string(), expected)),
                behavior,
            },
        );
    }

    /// Script lookups for a handle directly, bypassing job creation.
    pub async fn script_execution(&self, handle: &str, lookups: Vec<ExecutionLookup>) {
        self.executions.write().await.insert(
            handle.to_string(),
            ExecutionScript {
                lookups: lookups.into(),
                ..Default::default()
            },
        );
    }

    /// Make every lookup of `handle` fail with `status`.
    pub async fn fail_execution(&self, handle: &str, status: u16, body: &str) {
        self.executions.write().await.insert(
            handle.to_string(),
            ExecutionScript {
                failure: Some((status, body.to_string())),
                ..Default::default()
            },
        );
    }

    /// Pretend the platform credential is missing.
    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// All create-job calls, in order.
    pub async fn created_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.read().await.clone()
    }

    /// Create-job calls for one agent.
    pub async fn jobs_for(&self, agent_id: &str) -> Vec<RecordedJob> {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|j| j.agent_id == agent_id)
            .cloned()
            .collect()
    }

    /// Number of create-job calls for one agent.
    pub async fn create_count(&self, agent_id: &str) -> usize {
        self.jobs_for(agent_id).await.len()
    }

    /// Number of lookups made for a handle.
    pub async fn lookup_count(&self, handle: &str) -> usize {
        self.executions
            .read()
            .await
            .get(handle)
            .map_or(0, |s| s.lookup_count)
    }

    /// Total create and lookup calls.
    pub async fn total_calls(&self) -> usize {
        let lookups: usize = self
            .executions
            .read()
            .await
            .values()
            .map(|s| s.lookup_count)
            .sum();
        self.jobs.read().await.len() + lookups
    }
}

#[async_trait]
impl AgentPlatform for MockAgentPlatform {
    async fn create_job(
        &self,
        agent_id: &str,
        payload: Value,
    ) -> Result<JobHandle, PlatformError> {
        let behavior = self
            .rules
            .read()
            .await
            .iter()
            .find(|rule| rule.matches(agent_id, &payload))
            .map(|rule| rule.behavior.clone());

        let result = match behavior {
            None => Err(PlatformError::CreateJob {
                agent_id: agent_id.to_string(),
                attempts: "mock: no behavior configured".to_string(),
            }),
            Some(AgentBehavior::CreateFails(body)) => Err(PlatformError::CreateJob {
                agent_id: agent_id.to_string(),
                attempts: body,
            }),
            Some(AgentBehavior::Executes(lookups)) => {
                let handle = self.next_handle(agent_id);
                self.script_execution(&handle, lookups).await;
                Ok(JobHandle::new(handle))
            }
            Some(AgentBehavior::PollFails { status, body }) => {
                let handle = self.next_handle(agent_id);
                self.fail_execution(&handle, status, &body).await;
                Ok(JobHandle::new(handle))
            }
        };

        self.jobs.write().await.push(RecordedJob {
            agent_id: agent_id.to_string(),
            payload,
            handle: result.as_ref().ok().map(|h| h.execution_address.clone()),
        });

        result
    }

    async fn get_execution(&self, handle: &str) -> Result<ExecutionLookup, PlatformError> {
        let mut executions = self.executions.write().await;
        let Some(script) = executions.get_mut(handle) else {
            return Ok(ExecutionLookup::NotReady);
        };
        script.lookup_count += 1;

        if let Some((status, body)) = &script.failure {
            return Err(PlatformError::GetExecution {
                handle: handle.to_string(),
                status: *status,
                body: body.clone(),
            });
        }

        let lookup = if script.lookups.len() > 1 {
            script.lookups.pop_front()
        } else {
            script.lookups.front().cloned()
        };
        Ok(lookup.unwrap_or(ExecutionLookup::NotReady))
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }
}

impl MockAgentPlatform {
    fn next_handle(&self, agent_id: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("exec-{}-{}", agent_id, n)
    }
}

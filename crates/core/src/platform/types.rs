//! Types for agent platform requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body fields that may carry the execution handle, in lookup order.
const HANDLE_FIELDS: [&str; 3] = ["execution_address", "execution_id", "id"];

/// Body of a create-job request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRequest {
    pub agent_id: String,
    pub payload: Value,
}

/// Handle returned by the platform for a submitted job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobHandle {
    /// Opaque execution address used to poll the job.
    pub execution_address: String,
}

impl JobHandle {
    pub fn new(execution_address: impl Into<String>) -> Self {
        Self {
            execution_address: execution_address.into(),
        }
    }

    /// Extract the handle from a create-job response body.
    pub fn from_response(body: &Value) -> Option<Self> {
        HANDLE_FIELDS.iter().find_map(|field| match body.get(*field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(Self::new(s.trim())),
            Some(Value::Number(n)) => Some(Self::new(n.to_string())),
            _ => None,
        })
    }
}

/// Result of looking up an execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionLookup {
    /// The platform returned a record (possibly still running).
    Ready(ExecutionRecord),
    /// The platform does not know the execution yet.
    NotReady,
}

/// An execution record as returned by the platform.
///
/// The shape differs between deployments, so the record keeps the raw JSON
/// and offers lenient accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionRecord(pub Value);

impl ExecutionRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Lower-cased `status` (or `state`) string, if any.
    pub fn status(&self) -> Option<String> {
        ["status", "state"]
            .iter()
            .filter_map(|key| self.0.get(*key).and_then(Value::as_str))
            .map(|s| s.trim().to_lowercase())
            .find(|s| !s.is_empty())
    }

    /// The `result` payload, when present and not null.
    pub fn result(&self) -> Option<&Value> {
        self.0.get("result").filter(|v| !v.is_null())
    }

    /// Look up a field at the top level or inside `result`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0
            .get(name)
            .filter(|v| !v.is_null())
            .or_else(|| self.result().and_then(|r| r.get(name)).filter(|v| !v.is_null()))
    }

    /// Error reported by the agent, if any.
    pub fn error(&self) -> Option<&Value> {
        self.field("error").filter(|v| match v {
            Value::Bool(b) => *b,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

//! Types for the lineup pipeline.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::platform::PlatformError;
use crate::poller::PollError;

/// The uploaded slate. Built once per request and never modified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slate {
    pub sport: String,
    pub site: String,
    /// Slate date (YYYY-MM-DD).
    pub date: String,
    pub csv_text: String,
}

impl Slate {
    /// Create a slate dated today (UTC).
    pub fn new(
        sport: impl Into<String>,
        site: impl Into<String>,
        csv_text: impl Into<String>,
    ) -> Self {
        Self {
            sport: sport.into(),
            site: site.into(),
            date: Utc::now().format("%Y-%m-%d").to_string(),
            csv_text: csv_text.into(),
        }
    }

    /// Build a slate from an uploaded file.
    ///
    /// Fails with [`PipelineError::Input`] when the file is missing, is not
    /// UTF-8, or holds only whitespace.
    pub fn from_upload(
        sport: impl Into<String>,
        site: impl Into<String>,
        file: Option<&[u8]>,
    ) -> Result<Self, PipelineError> {
        let bytes = file.ok_or_else(|| PipelineError::Input("Missing file".to_string()))?;
        let csv_text = std::str::from_utf8(bytes)
            .map_err(|_| PipelineError::Input("File is not valid UTF-8 text".to_string()))?;
        if csv_text.trim().is_empty() {
            return Err(PipelineError::Input("File is empty".to_string()));
        }
        Ok(Self::new(sport, site, csv_text))
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }
}

/// Options forwarded unchanged to every stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineOptions {
    #[serde(default = "default_n_lineups")]
    pub n_lineups: u32,
    #[serde(default = "default_salary_cap")]
    pub salary_cap: u32,
    #[serde(default = "default_min_players")]
    pub min_players: u32,
    #[serde(default = "default_include_injuries")]
    pub include_injuries: bool,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Local fallback drops players below this salary.
    #[serde(default = "default_min_salary")]
    pub min_salary: f64,
    /// Local fallback keeps at most this many players.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
}

fn default_n_lineups() -> u32 {
    20
}

fn default_salary_cap() -> u32 {
    50_000
}

fn default_min_players() -> u32 {
    8
}

fn default_include_injuries() -> bool {
    true
}

fn default_format() -> String {
    "classic".to_string()
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_min_salary() -> f64 {
    3500.0
}

fn default_max_players() -> usize {
    120
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            n_lineups: default_n_lineups(),
            salary_cap: default_salary_cap(),
            min_players: default_min_players(),
            include_injuries: default_include_injuries(),
            format: default_format(),
            version: default_version(),
            min_salary: default_min_salary(),
            max_players: default_max_players(),
        }
    }
}

/// LLM settings for one projection run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDescriptor {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub temperature: f64,
}

impl ModelDescriptor {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            temperature,
        }
    }
}

/// A pipeline stage, used to label logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Signals,
    /// One branch of the projections fan-out.
    Projection(usize),
    Consensus,
    Optimizer,
}

impl Stage {
    /// Stage name without the fan-out index (metric label).
    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Signals => "signals",
            Stage::Projection(_) => "projections",
            Stage::Consensus => "consensus",
            Stage::Optimizer => "optimizer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Projection(i) => write!(f, "projections[{}]", i),
            other => f.write_str(other.kind()),
        }
    }
}

/// Where the ingested players came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayersSource {
    Remote,
    Fallback,
}

/// Execution handles and ingest facts collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineDebug {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_exec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals_exec: Option<String>,
    pub proj_execs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cons_exec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_exec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players_source: Option<PlayersSource>,
    pub player_count: usize,
}

impl PipelineDebug {
    /// True when no remote job was created.
    pub fn is_empty(&self) -> bool {
        self.ingest_exec.is_none()
            && self.signals_exec.is_none()
            && self.proj_execs.is_empty()
            && self.cons_exec.is_none()
            && self.opt_exec.is_none()
            && self.players_source.is_none()
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    /// Optimizer output, passed through untouched.
    pub lineups: Value,
    pub debug: PipelineDebug,
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload missing or unusable.
    #[error("{0}")]
    Input(String),

    /// Credential or agent id missing.
    #[error("Missing configuration: {0}")]
    Configuration(String),

    #[error("{stage}: create job failed: {source}")]
    RemoteCreate {
        stage: Stage,
        #[source]
        source: PlatformError,
    },

    #[error("{stage}: {source}")]
    RemotePoll {
        stage: Stage,
        #[source]
        source: PlatformError,
    },

    #[error("{stage}: execution did not finish within {timeout:?}")]
    PollTimeout { stage: Stage, timeout: Duration },

    /// The agent finished but reported failure.
    #[error("{stage}: agent reported {status}: {detail}")]
    StageFailed {
        stage: Stage,
        status: String,
        detail: String,
    },

    /// Remote ingest and the local fallback both produced no players.
    #[error("No players could be ingested (remote ingest: {0}; local CSV fallback found no usable rows)")]
    IngestionExhausted(String),
}

impl PipelineError {
    pub(crate) fn from_poll(stage: Stage, err: PollError) -> Self {
        match err {
            PollError::Platform { source, .. } => PipelineError::RemotePoll { stage, source },
            PollError::Timeout { timeout, .. } => PipelineError::PollTimeout { stage, timeout },
        }
    }

    /// Whether the caller can fix this by changing the upload.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PipelineError::Input(_))
    }

    /// Raw platform text for operators, when the failure came from remote.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            PipelineError::RemoteCreate { source, .. } | PipelineError::RemotePoll { source, .. } => {
                source.diagnostic().map(str::to_string)
            }
            PipelineError::StageFailed { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }
}

/// A failed run together with whatever handles were collected before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    #[source]
    pub error: PipelineError,
    pub debug: PipelineDebug,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slate_date_format() {
        let slate = Slate::new("NBA", "DK", "name,salary\n");
        assert_eq!(slate.date.len(), 10);
        assert_eq!(slate.date.matches('-').count(), 2);

        let slate = slate.with_date("2024-01-15");
        assert_eq!(slate.date, "2024-01-15");
    }

    #[test]
    fn test_slate_from_upload() {
        let slate = Slate::from_upload("NFL", "FD", Some(b"name,salary\n".as_slice())).unwrap();
        assert_eq!(slate.sport, "NFL");
        assert_eq!(slate.csv_text, "name,salary\n");

        const NOT_UTF8: &[u8] = &[0xff, 0xfe, 0x41];
        let cases: [(Option<&[u8]>, &str); 3] = [
            (None, "Missing file"),
            (Some(NOT_UTF8), "File is not valid UTF-8 text"),
            (Some(b" \n\t ".as_slice()), "File is empty"),
        ];
        for (file, message) in cases {
            let err = Slate::from_upload("NBA", "DK", file).unwrap_err();
            assert!(err.is_input_error());
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_options_serialize_flat() {
        let json = serde_json::to_value(PipelineOptions::default()).unwrap();
        assert_eq!(json["n_lineups"], 20);
        assert_eq!(json["salary_cap"], 50000);
        assert_eq!(json["min_players"], 8);
        assert_eq!(json["include_injuries"], true);
        assert_eq!(json["format"], "classic");
        assert_eq!(json["version"], "v1");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Ingest.to_string(), "ingest");
        assert_eq!(Stage::Projection(1).to_string(), "projections[1]");
        assert_eq!(Stage::Projection(1).kind(), "projections");
        assert_eq!(Stage::Optimizer.to_string(), "optimizer");
    }

    #[test]
    fn test_debug_serialization_skips_missing_handles() {
        let debug = PipelineDebug {
            ingest_exec: Some("exec-1".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&debug).unwrap();
        assert_eq!(json["ingest_exec"], "exec-1");
        assert!(json.get("signals_exec").is_none());
        assert_eq!(json["proj_execs"], serde_json::json!([]));
        assert!(!debug.is_empty());
        assert!(PipelineDebug::default().is_empty());
    }

    #[test]
    fn test_error_display_and_diagnostic() {
        let err = PipelineError::PollTimeout {
            stage: Stage::Consensus,
            timeout: Duration::from_secs(120),
        };
        assert_eq!(
            err.to_string(),
            "consensus: execution did not finish within 120s"
        );
        assert!(err.diagnostic().is_none());

        let err = PipelineError::PollTimeout {
            stage: Stage::Optimizer,
            timeout: Duration::from_millis(80),
        };
        assert_eq!(
            err.to_string(),
            "optimizer: execution did not finish within 80ms"
        );

        let err = PipelineError::RemoteCreate {
            stage: Stage::Projection(0),
            source: PlatformError::CreateJob {
                agent_id: "proj".to_string(),
                attempts: "POST x (503): unavailable".to_string(),
            },
        };
        assert!(err.to_string().starts_with("projections[0]: create job failed"));
        assert_eq!(err.diagnostic().as_deref(), Some("POST x (503): unavailable"));
        assert!(!err.is_input_error());
        assert!(PipelineError::Input("Missing file".to_string()).is_input_error());
    }

    #[test]
    fn test_from_poll_error() {
        let err = PipelineError::from_poll(
            Stage::Optimizer,
            PollError::Timeout {
                label: "optimizer".to_string(),
                timeout: Duration::from_secs(5),
            },
        );
        assert!(matches!(
            err,
            PipelineError::PollTimeout {
                stage: Stage::Optimizer,
                ..
            }
        ));
    }
}

//! Lineup pipeline implementation.
//!
//! Drives one slate through the remote agents:
//! - Ingest: sequential, falls back to local CSV parsing
//! - Signals: sequential, skipped when no agent is configured
//! - Projections: one job per model, created and polled concurrently
//! - Consensus, Optimizer: sequential

use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, try_join_all};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::{AgentsConfig, Config, PipelineConfig};
use crate::ingest::parse_csv;
use crate::metrics::{INGEST_FALLBACKS, PIPELINE_RUNS, STAGE_DURATION};
use crate::platform::{AgentPlatform, ExecutionRecord};
use crate::poller::ExecutionPoller;

use super::payload;
use super::types::{
    ModelDescriptor, PipelineDebug, PipelineError, PipelineFailure, PipelineOptions,
    PipelineOutcome, PlayersSource, Slate, Stage,
};

/// Runs slates through the agent pipeline. Holds no per-run state, so one
/// instance is shared by all requests.
pub struct LineupPipeline {
    platform: Arc<dyn AgentPlatform>,
    poller: ExecutionPoller,
    agents: AgentsConfig,
    options: PipelineOptions,
    models: Vec<ModelDescriptor>,
}

impl LineupPipeline {
    /// Create a new pipeline.
    pub fn new(
        platform: Arc<dyn AgentPlatform>,
        poller: ExecutionPoller,
        agents: AgentsConfig,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            platform,
            poller,
            agents,
            options: pipeline.options,
            models: pipeline.models,
        }
    }

    /// Build a pipeline from the loaded configuration.
    pub fn from_config(platform: Arc<dyn AgentPlatform>, config: &Config) -> Self {
        let poller = ExecutionPoller::from_config(Arc::clone(&platform), &config.polling);
        Self::new(
            platform,
            poller,
            config.agents.clone(),
            config.pipeline.clone(),
        )
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Check credential and required agent ids before touching the platform.
    pub fn check_configuration(&self) -> Result<(), PipelineError> {
        let mut missing: Vec<String> = Vec::new();
        if !self.platform.is_configured() {
            missing.push("platform api key".to_string());
        }
        missing.extend(
            self.agents
                .missing()
                .into_iter()
                .map(|name| format!("{} agent id", name)),
        );
        if self.models.is_empty() {
            missing.push("projection models".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Configuration(missing.join(", ")))
        }
    }

    /// Run the full pipeline for one slate.
    ///
    /// On failure the handles created so far are returned with the error.
    pub async fn run(&self, slate: Slate) -> Result<PipelineOutcome, PipelineFailure> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", run_id = %run_id, sport = %slate.sport, site = %slate.site);

        async move {
            let started = Instant::now();
            let mut debug = PipelineDebug::default();

            match self.execute(&slate, &mut debug).await {
                Ok(lineups) => {
                    PIPELINE_RUNS.with_label_values(&["success"]).inc();
                    info!("Pipeline finished in {:?}", started.elapsed());
                    Ok(PipelineOutcome { lineups, debug })
                }
                Err(error) => {
                    let label = if matches!(error, PipelineError::Configuration(_)) {
                        "misconfigured"
                    } else {
                        "failed"
                    };
                    PIPELINE_RUNS.with_label_values(&[label]).inc();
                    error!("Pipeline aborted after {:?}: {}", started.elapsed(), error);
                    Err(PipelineFailure { error, debug })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        slate: &Slate,
        debug: &mut PipelineDebug,
    ) -> Result<Value, PipelineError> {
        self.check_configuration()?;

        let base = payload::base_payload(slate, &self.options);

        let players = self.ingest(slate, &base, debug).await?;
        let signals = self.signals(&base, &players, debug).await?;
        let projection_sets = self
            .projections(&base, &players, signals.as_ref(), debug)
            .await?;
        let consensus = self.consensus(&base, projection_sets, debug).await?;
        self.optimize(&base, consensus, debug).await
    }

    // =========================================================================
    // Stages
    // =========================================================================

    async fn ingest(
        &self,
        slate: &Slate,
        base: &Value,
        debug: &mut PipelineDebug,
    ) -> Result<Vec<Value>, PipelineError> {
        let reason = match self.remote_ingest(base, debug).await {
            Ok(players) if !players.is_empty() => {
                info!("Remote ingest returned {} players", players.len());
                debug.players_source = Some(PlayersSource::Remote);
                debug.player_count = players.len();
                return Ok(players);
            }
            Ok(_) => "no players returned".to_string(),
            Err(e) => e.to_string(),
        };

        warn!("Remote ingest unusable ({}), parsing CSV locally", reason);
        INGEST_FALLBACKS.inc();

        let players = parse_csv(
            &slate.csv_text,
            self.options.min_salary,
            self.options.max_players,
        );
        if players.is_empty() {
            return Err(PipelineError::IngestionExhausted(reason));
        }

        info!("Local CSV fallback produced {} players", players.len());
        debug.players_source = Some(PlayersSource::Fallback);
        debug.player_count = players.len();
        Ok(players.iter().map(|p| p.to_json()).collect())
    }

    async fn remote_ingest(
        &self,
        base: &Value,
        debug: &mut PipelineDebug,
    ) -> Result<Vec<Value>, PipelineError> {
        let stage = Stage::Ingest;
        let handle = self.create(stage, &self.agents.ingest, base.clone()).await?;
        debug.ingest_exec = Some(handle.clone());

        let record = self.wait(stage, &handle).await?;
        if let Some(err) = record.error() {
            return Err(PipelineError::StageFailed {
                stage,
                status: record.status().unwrap_or_else(|| "error".to_string()),
                detail: describe(err),
            });
        }
        self.ensure_succeeded(stage, &record)?;

        Ok(payload::extract_players(&record).unwrap_or_default())
    }

    async fn signals(
        &self,
        base: &Value,
        players: &[Value],
        debug: &mut PipelineDebug,
    ) -> Result<Option<Map<String, Value>>, PipelineError> {
        let Some(agent_id) = self.agents.signals_agent() else {
            debug!("No signals agent configured, skipping signals stage");
            return Ok(None);
        };

        let stage = Stage::Signals;
        let handle = self
            .create(stage, agent_id, payload::signals_payload(base, players))
            .await?;
        debug.signals_exec = Some(handle.clone());

        let record = self.wait(stage, &handle).await?;
        self.ensure_succeeded(stage, &record)?;

        let signals = payload::extract_signals(&record);
        if signals.is_none() {
            warn!("Signals result is not an object, ignoring it");
        }
        Ok(signals)
    }

    async fn projections(
        &self,
        base: &Value,
        players: &[Value],
        signals: Option<&Map<String, Value>>,
        debug: &mut PipelineDebug,
    ) -> Result<Vec<Value>, PipelineError> {
        info!("Fanning out {} projection jobs", self.models.len());

        let creates = self.models.iter().enumerate().map(|(i, model)| {
            let stage = Stage::Projection(i);
            let payload = payload::projection_payload(base, players, signals, model);
            async move {
                self.create(stage, &self.agents.projections, payload)
                    .await
                    .map(|handle| (stage, handle))
            }
        });

        let mut handles = Vec::with_capacity(self.models.len());
        let mut first_error = None;
        for created in join_all(creates).await {
            match created {
                Ok((stage, handle)) => {
                    debug.proj_execs.push(handle.clone());
                    handles.push((stage, handle));
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let records = try_join_all(handles.iter().map(|(stage, handle)| async move {
            let record = self.wait(*stage, handle).await?;
            self.ensure_succeeded(*stage, &record)?;
            Ok::<_, PipelineError>(record)
        }))
        .await?;

        Ok(records.iter().map(payload::normalize_projection).collect())
    }

    async fn consensus(
        &self,
        base: &Value,
        projection_sets: Vec<Value>,
        debug: &mut PipelineDebug,
    ) -> Result<Value, PipelineError> {
        let stage = Stage::Consensus;
        let handle = self
            .create(
                stage,
                &self.agents.consensus,
                payload::consensus_payload(base, projection_sets),
            )
            .await?;
        debug.cons_exec = Some(handle.clone());

        let record = self.wait(stage, &handle).await?;
        self.ensure_succeeded(stage, &record)?;
        Ok(payload::extract_consensus(&record))
    }

    async fn optimize(
        &self,
        base: &Value,
        consensus: Value,
        debug: &mut PipelineDebug,
    ) -> Result<Value, PipelineError> {
        let stage = Stage::Optimizer;
        let handle = self
            .create(
                stage,
                &self.agents.optimizer,
                payload::optimizer_payload(base, consensus),
            )
            .await?;
        debug.opt_exec = Some(handle.clone());

        let record = self.wait(stage, &handle).await?;
        self.ensure_succeeded(stage, &record)?;

        let lineups = payload::extract_lineups(&record);
        if lineups.is_null() {
            warn!("Optimizer finished without a lineups field");
        }
        Ok(lineups)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn create(
        &self,
        stage: Stage,
        agent_id: &str,
        payload: Value,
    ) -> Result<String, PipelineError> {
        let handle = self
            .platform
            .create_job(agent_id, payload)
            .await
            .map_err(|source| PipelineError::RemoteCreate { stage, source })?;

        info!("{}: created execution {}", stage, handle.execution_address);
        Ok(handle.execution_address)
    }

    async fn wait(&self, stage: Stage, handle: &str) -> Result<ExecutionRecord, PipelineError> {
        let started = Instant::now();
        let label = stage.to_string();
        let result = self.poller.wait_for_execution(handle, &label).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        STAGE_DURATION
            .with_label_values(&[stage.kind(), outcome])
            .observe(started.elapsed().as_secs_f64());

        result.map_err(|e| PipelineError::from_poll(stage, e))
    }

    fn ensure_succeeded(&self, stage: Stage, record: &ExecutionRecord) -> Result<(), PipelineError> {
        if !self.poller.policy().is_failure(record) {
            return Ok(());
        }
        Err(PipelineError::StageFailed {
            stage,
            status: record.status().unwrap_or_default(),
            detail: record
                .error()
                .map(describe)
                .unwrap_or_else(|| "no error details".to_string()),
        })
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Lineup pipeline: slate upload to optimized lineups via remote agents.
//!
//! Stages run in order Ingest → Signals → Projections → Consensus →
//! Optimizer. Each stage's output is folded into the next stage's payload,
//! and every payload carries the original slate and options.

mod payload;
mod runner;
mod types;

pub use payload::{
    base_payload, consensus_payload, extract_consensus, extract_lineups, extract_players,
    extract_signals, normalize_projection, optimizer_payload, projection_payload,
    signals_payload,
};
pub use runner::LineupPipeline;
pub use types::{
    ModelDescriptor, PipelineDebug, PipelineError, PipelineFailure, PipelineOptions,
    PipelineOutcome, PlayersSource, Slate, Stage,
};

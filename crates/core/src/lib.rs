pub mod config;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod platform;
pub mod poller;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use ingest::{parse_csv, Player};
pub use pipeline::{
    LineupPipeline, ModelDescriptor, PipelineDebug, PipelineError, PipelineFailure,
    PipelineOptions, PipelineOutcome, PlayersSource, Slate, Stage,
};
pub use platform::{AgentPlatform, ExecutionLookup, ExecutionRecord, JobHandle, PlatformError, SwarmNodeClient};
pub use poller::{ExecutionPoller, PollError, TerminalPolicy};

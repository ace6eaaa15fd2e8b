use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for structured overrides, e.g. `SLATERUNNER_POLLING__TIMEOUT_SECS`.
const ENV_PREFIX: &str = "SLATERUNNER_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from the environment only (no config file on disk).
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(Env::raw().filter_map(|key| legacy_env_key(key.as_str()).map(Into::into)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Maps the plain deployment variables onto config keys.
fn legacy_env_key(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "SWARMNODE_API_KEY" => Some("platform.api_key"),
        "SWARMNODE_BASE" => Some("platform.base_url"),
        "INGEST_AGENT_ID" => Some("agents.ingest"),
        "SIGNALS_AGENT_ID" => Some("agents.signals"),
        "PROJECTIONS_AGENT_ID" => Some("agents.projections"),
        "CONSENSUS_AGENT_ID" => Some("agents.consensus"),
        "OPTIMIZER_AGENT_ID" => Some("agents.optimizer"),
        _ => None,
    }
}

//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides a mock of the agent platform trait, allowing
//! pipeline and server tests without a real SwarmNode deployment.
//!
//! # Example
//!
//! ```rust,ignore
//! use slaterunner_core::testing::{fixtures, AgentBehavior, MockAgentPlatform};
//!
//! let platform = MockAgentPlatform::new();
//! platform.on_agent("ingest", AgentBehavior::succeeds(fixtures::ingest_result(&["Alice"]))).await;
//!
//! // Use in LineupPipeline...
//! ```

mod mock_platform;

pub use mock_platform::{AgentBehavior, MockAgentPlatform, RecordedJob};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::config::{AgentsConfig, Config};

    /// Agent ids used by [`agents`].
    pub const INGEST_AGENT: &str = "agent-ingest";
    pub const SIGNALS_AGENT: &str = "agent-signals";
    pub const PROJECTIONS_AGENT: &str = "agent-projections";
    pub const CONSENSUS_AGENT: &str = "agent-consensus";
    pub const OPTIMIZER_AGENT: &str = "agent-optimizer";

    /// A small DraftKings-style slate export.
    pub const SAMPLE_CSV: &str = "\
Position,Name + ID,Name,ID,Roster Position,Salary,Game Info,TeamAbbrev,AvgPointsPerGame
PG,Alice Guard (1001),Alice Guard,1001,PG/G/UTIL,9800,LAL@BOS 07:30PM ET,LAL,48.2
SF,Bob Wing (1002),Bob Wing,1002,SF/F/UTIL,7600,LAL@BOS 07:30PM ET,BOS,38.9
C,Carl Center (1003),Carl Center,1003,C/UTIL,5400,LAL@BOS 07:30PM ET,BOS,27.1
SG,Dan Bench (1004),Dan Bench,1004,SG/G/UTIL,3000,LAL@BOS 07:30PM ET,LAL,8.4
";

    /// Agents config with every stage set, signals included.
    pub fn agents() -> AgentsConfig {
        AgentsConfig {
            ingest: INGEST_AGENT.to_string(),
            signals: Some(SIGNALS_AGENT.to_string()),
            projections: PROJECTIONS_AGENT.to_string(),
            consensus: CONSENSUS_AGENT.to_string(),
            optimizer: OPTIMIZER_AGENT.to_string(),
        }
    }

    /// A complete config suitable for tests, with fast polling.
    pub fn config() -> Config {
        let mut config = Config::default();
        config.platform.api_key = "test-key".to_string();
        config.agents = agents();
        config.polling.interval_ms = 5;
        config.polling.timeout_secs = 5;
        config
    }

    /// Player JSON as an ingest agent would return it.
    pub fn player(name: &str, salary: f64) -> Value {
        json!({
            "name": name,
            "player_id": name.to_lowercase().replace(' ', "-"),
            "positions": ["UTIL"],
            "salary": salary,
        })
    }

    /// Ingest result with one player per name.
    pub fn ingest_result(names: &[&str]) -> Value {
        let players: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| player(name, 9000.0 - i as f64 * 500.0))
            .collect();
        json!({ "players": players })
    }

    /// Projection result for the given names.
    pub fn projection_result(names: &[&str], points: f64) -> Value {
        let players: Vec<Value> = names
            .iter()
            .map(|name| json!({ "name": name, "proj": points }))
            .collect();
        json!({ "output": { "players": players } })
    }

    pub fn consensus_result(names: &[&str]) -> Value {
        let players: Vec<Value> = names
            .iter()
            .map(|name| json!({ "name": name, "proj": 30.0 }))
            .collect();
        json!({ "consensus": { "players": players } })
    }

    pub fn lineups_result(lineups: Value) -> Value {
        json!({ "lineups": lineups })
    }
}

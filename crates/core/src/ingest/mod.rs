//! Player ingestion helpers.
//!
//! Remote ingestion is an agent's job; this module only holds the player
//! shape and the local CSV fallback used when that agent is unavailable.

mod csv;

pub use self::csv::parse_csv;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Position assigned when a row lists none.
pub const DEFAULT_POSITION: &str = "UTIL";

/// A player available on the slate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub name: String,
    pub player_id: String,
    /// Position codes, never empty.
    pub positions: Vec<String>,
    pub salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl Player {
    /// JSON form forwarded to downstream agents.
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "name": self.name,
            "player_id": self.player_id,
            "positions": self.positions,
            "salary": self.salary,
        });
        if let (Some(team), Some(obj)) = (&self.team, value.as_object_mut()) {
            obj.insert("team".to_string(), Value::String(team.clone()));
        }
        value
    }
}

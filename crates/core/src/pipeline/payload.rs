//! Stage payload construction and result extraction.
//!
//! Agents return loosely shaped JSON, so extraction tries the known field
//! locations in order and falls back to the raw record.

use serde_json::{json, Map, Value};

use super::types::{ModelDescriptor, PipelineOptions, Slate};
use crate::platform::ExecutionRecord;

/// Locations checked for the ingested player list, in order.
const PLAYER_POINTERS: [&str; 4] = [
    "/result/players",
    "/result/output/players",
    "/result/data/players",
    "/players",
];

/// `{slate, options}`, the part every stage payload starts from.
pub fn base_payload(slate: &Slate, options: &PipelineOptions) -> Value {
    json!({
        "slate": slate,
        "options": options,
    })
}

/// Shallow merge: keys from `extra` overwrite keys in `base`.
pub fn merge(base: &Value, extra: Map<String, Value>) -> Value {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    merged.extend(extra);
    Value::Object(merged)
}

pub fn signals_payload(base: &Value, players: &[Value]) -> Value {
    merge(base, with_players(players))
}

/// Base payload plus players and signals, with the model under `options.llm`.
/// Signals never override the base `slate` or `options`.
pub fn projection_payload(
    base: &Value,
    players: &[Value],
    signals: Option<&Map<String, Value>>,
    model: &ModelDescriptor,
) -> Value {
    let mut payload = merge(base, with_players(players));
    if let Some(signals) = signals {
        payload = merge(&payload, signals.clone());
    }

    let mut options = base
        .get("options")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    options.insert("llm".to_string(), json!(model));

    let mut extra = Map::new();
    if let Some(slate) = base.get("slate") {
        extra.insert("slate".to_string(), slate.clone());
    }
    extra.insert("options".to_string(), Value::Object(options));
    merge(&payload, extra)
}

pub fn consensus_payload(base: &Value, projection_sets: Vec<Value>) -> Value {
    let mut extra = Map::new();
    extra.insert("method".to_string(), json!("avg"));
    extra.insert("projection_sets".to_string(), Value::Array(projection_sets));
    merge(base, extra)
}

pub fn optimizer_payload(base: &Value, consensus: Value) -> Value {
    let mut extra = Map::new();
    extra.insert("consensus".to_string(), consensus);
    merge(base, extra)
}

fn with_players(players: &[Value]) -> Map<String, Value> {
    let mut extra = Map::new();
    extra.insert("players".to_string(), Value::Array(players.to_vec()));
    extra
}

/// First non-empty player array found in an ingest record.
pub fn extract_players(record: &ExecutionRecord) -> Option<Vec<Value>> {
    PLAYER_POINTERS.iter().find_map(|pointer| {
        record
            .as_value()
            .pointer(pointer)
            .and_then(Value::as_array)
            .filter(|players| !players.is_empty())
            .cloned()
    })
}

/// Signals output as an object to spread into projection payloads.
pub fn extract_signals(record: &ExecutionRecord) -> Option<Map<String, Value>> {
    record
        .result()
        .unwrap_or_else(|| record.as_value())
        .as_object()
        .cloned()
}

/// One projection set, reduced to `{players}` when the agent returned them.
pub fn normalize_projection(record: &ExecutionRecord) -> Value {
    let raw = record.as_value();
    let data = raw
        .pointer("/result/output")
        .filter(|v| !v.is_null())
        .or_else(|| record.result())
        .or_else(|| raw.get("data").filter(|v| !v.is_null()))
        .unwrap_or(raw);

    match data.get("players") {
        Some(players) if !players.is_null() => json!({ "players": players }),
        _ => data.clone(),
    }
}

pub fn extract_consensus(record: &ExecutionRecord) -> Value {
    record
        .as_value()
        .pointer("/result/consensus")
        .filter(|v| !v.is_null())
        .or_else(|| record.result())
        .unwrap_or_else(|| record.as_value())
        .clone()
}

/// Optimizer lineups, or `null` when the agent returned none.
pub fn extract_lineups(record: &ExecutionRecord) -> Value {
    let raw = record.as_value();
    raw.pointer("/result/lineups")
        .filter(|v| !v.is_null())
        .or_else(|| raw.get("lineups").filter(|v| !v.is_null()))
        .cloned()
        .unwrap_or(Value::Null)
}

//! Wire types shared with the dialog engine.
//!
//! The engine owns the shape of these payloads; we only model the fields the
//! enrichment pipeline reads or writes and round-trip everything else through
//! `extra` maps so no context the client maintains is dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Request body sent to the dialog engine's message endpoint. The client is
/// responsible for echoing `context` back on every turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub workspace_id: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub input: MessageInput,
}

impl MessagePayload {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self { workspace_id: workspace_id.into(), context: Map::new(), input: MessageInput::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputPayload {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response from the dialog engine, mutated in place by the enrichment
/// pipeline and returned verbatim to the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogResponse {
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputPayload>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DialogResponse {
    /// Top-ranked intent name, if the engine returned any.
    pub fn top_intent(&self) -> Option<&str> {
        self.intents.first().map(|intent| intent.intent.as_str())
    }

    /// The `currency` context value, when present and a non-null string.
    pub fn currency(&self) -> Option<&str> {
        match self.context.get("currency") {
            Some(Value::String(ticker)) => Some(ticker.as_str()),
            _ => None,
        }
    }

    /// Guarantees `output` exists before any handler touches it.
    pub fn ensure_output(&mut self) -> &mut OutputPayload {
        self.output.get_or_insert_with(OutputPayload::default)
    }
}

//! Audit records and their CSV export shape.
//!
//! When audit logging is enabled, every recorded request/response pair is
//! persisted exactly once and later flattened into one export row per chat
//! turn. The flattening is pure so it can be tested without a store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dialog::{DialogResponse, MessagePayload};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub request: MessagePayload,
    pub response: DialogResponse,
    pub time: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(request: MessagePayload, response: DialogResponse) -> Self {
        Self { id: Uuid::new_v4(), request, response, time: Utc::now() }
    }
}

pub const CSV_HEADER: [&str; 6] = ["Question", "Intent", "Confidence", "Entity", "Output", "Time"];

/// One row of the `/chats` export.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRow {
    pub question: String,
    pub intent: String,
    pub confidence: f64,
    pub entity: String,
    pub output: String,
    pub time: String,
}

impl ChatRow {
    pub fn from_record(record: &AuditRecord) -> Self {
        let question = record.request.input.text.clone().unwrap_or_default();

        let (intent, confidence) = match record.response.intents.first() {
            Some(top) => (top.intent.clone(), top.confidence),
            None => ("<no intent>".to_owned(), 0.0),
        };

        let entity = match record.response.entities.first() {
            Some(first) => format!("{} : {}", first.entity, first.value),
            None => "<no entity>".to_owned(),
        };

        let output = match &record.response.output {
            Some(output) if !output.text.is_empty() => output.text.join(" "),
            _ => "<no dialog>".to_owned(),
        };

        Self {
            question,
            intent,
            confidence,
            entity,
            output,
            time: record.time.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn fields(&self) -> [String; 6] {
        [
            self.question.clone(),
            self.intent.clone(),
            self.confidence.to_string(),
            self.entity.clone(),
            self.output.clone(),
            self.time.clone(),
        ]
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Renders rows (already sorted by the caller) into an RFC 4180 document with
/// the fixed header line.
pub fn render_csv(rows: &[ChatRow]) -> String {
    let mut document = CSV_HEADER.join(",");
    document.push_str("\r\n");
    for row in rows {
        let line: Vec<String> = row.fields().iter().map(|field| escape_field(field)).collect();
        document.push_str(&line.join(","));
        document.push_str("\r\n");
    }
    document
}

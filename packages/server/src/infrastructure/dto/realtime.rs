//! Phoenix channel frames of the hosted realtime endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::ChangeKind;

/// One Phoenix v1 JSON frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixFrame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixFrame {
    /// `phx_join` subscribing to every change of `schema.table`
    pub fn join(schema: &str, table: &str, reference: &str) -> Self {
        Self {
            topic: format!("realtime:{}:{}", schema, table),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "postgres_changes": [
                        { "event": "*", "schema": schema, "table": table }
                    ]
                }
            }),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: &str) -> Self {
        Self {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// `Some(Ok)` / `Some(Err(reason))` when this is the reply to `reference`
    pub fn reply_to(&self, reference: &str) -> Option<Result<(), String>> {
        if self.event != "phx_reply" || self.reference.as_deref() != Some(reference) {
            return None;
        }
        match self.payload.get("status").and_then(Value::as_str) {
            Some("ok") => Some(Ok(())),
            _ => Some(Err(self
                .payload
                .get("response")
                .map(Value::to_string)
                .unwrap_or_else(|| "join rejected".to_string()))),
        }
    }

    /// Change kind of a `postgres_changes` frame for `table`
    pub fn change_of(&self, table: &str) -> Option<ChangeKind> {
        if self.event != "postgres_changes" {
            return None;
        }
        let data = self.payload.get("data")?;
        if data
            .get("table")
            .and_then(Value::as_str)
            .is_some_and(|changed| changed != table)
        {
            return None;
        }
        match data.get("type").and_then(Value::as_str)? {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

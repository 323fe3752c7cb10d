//! Push event types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ConsoleError;
use crate::events::decoder::SseFrame;

/// Named push event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LogCreated,
    AccountUpdated,
    TaskUpdated,
    Heartbeat,
    /// Generic type; subscribers under it see every event
    Message,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::LogCreated,
        EventType::AccountUpdated,
        EventType::TaskUpdated,
        EventType::Heartbeat,
        EventType::Message,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LogCreated => "log_created",
            EventType::AccountUpdated => "account_updated",
            EventType::TaskUpdated => "task_updated",
            EventType::Heartbeat => "heartbeat",
            EventType::Message => "message",
        }
    }

    /// Map a wire name; anything unrecognised is a generic message
    pub fn from_wire(name: &str) -> Self {
        name.parse().unwrap_or(EventType::Message)
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log_created" => Ok(EventType::LogCreated),
            "account_updated" => Ok(EventType::AccountUpdated),
            "task_updated" => Ok(EventType::TaskUpdated),
            "heartbeat" => Ok(EventType::Heartbeat),
            "message" => Ok(EventType::Message),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded push event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl SseEvent {
    pub fn new(event_type: EventType, data: Map<String, Value>) -> Self {
        Self {
            event_type,
            data,
            timestamp: None,
        }
    }

    /// Decode a frame.
    ///
    /// The backend sends `{"type": ..., "data": {...}}` both on named and on
    /// unnamed frames; heartbeats carry only `type` and `timestamp`. The frame
    /// name wins over the JSON `type` field.
    pub fn from_frame(frame: &SseFrame) -> Result<Self, ConsoleError> {
        let value: Value = serde_json::from_str(&frame.data)
            .map_err(|e| ConsoleError::Decode(format!("event payload is not JSON: {e}")))?;

        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ConsoleError::Decode(format!(
                    "event payload must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let event_type = frame
            .event
            .as_deref()
            .or_else(|| object.get("type").and_then(Value::as_str))
            .map(EventType::from_wire)
            .unwrap_or(EventType::Message);

        let timestamp = match object.remove("timestamp") {
            Some(Value::String(ts)) => Some(ts),
            _ => None,
        };

        let data = match object.remove("data") {
            Some(Value::Object(data)) => data,
            Some(other) => {
                let mut data = Map::new();
                data.insert("value".to_string(), other);
                data
            }
            None => {
                object.remove("type");
                object
            }
        };

        Ok(Self {
            event_type,
            data,
            timestamp,
        })
    }

    /// String field of the payload
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Generic journal event records.

use std::path::Path;
use std::sync::Arc;

use compact_str::CompactString;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Where an event was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOrigin {
    pub path: Arc<Path>,
    /// Position among the records read from this path, starting at 0.
    pub seq: u64,
}

impl EventOrigin {
    pub fn new(path: impl Into<Arc<Path>>, seq: u64) -> Self {
        Self {
            path: path.into(),
            seq,
        }
    }
}

/// One journal record: its type tag plus the untouched field mapping, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEvent {
    pub event_type: CompactString,
    pub timestamp: Option<OffsetDateTime>,
    pub fields: Map<String, Value>,
    pub origin: EventOrigin,
}

/// A record that cannot be turned into a [`JournalEvent`]. The record is dropped.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Not valid JSON.
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an object.
    #[error("record is not a JSON object")]
    NotAnObject,

    /// The `"event"` tag is absent or not a string.
    #[error("record has no \"event\" tag")]
    MissingEventType,
}

impl JournalEvent {
    pub fn parse(line: &str, origin: EventOrigin) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value, origin)
    }

    pub fn from_value(value: Value, origin: EventOrigin) -> Result<Self, ParseError> {
        let Value::Object(fields) = value else {
            return Err(ParseError::NotAnObject);
        };
        let event_type = fields
            .get("event")
            .and_then(Value::as_str)
            .map(CompactString::from)
            .ok_or(ParseError::MissingEventType)?;
        let timestamp = fields
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok());
        Ok(Self {
            event_type,
            timestamp,
            fields,
            origin,
        })
    }

    /// Decode the record into a typed payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edcm_sdk::journal::DockedEvent;

    fn origin() -> EventOrigin {
        EventOrigin::new(Path::new("Journal.2025-04-12T180000.01.log"), 0)
    }

    #[test]
    fn test_parse_keeps_field_order() {
        let line = r#"{"timestamp":"2025-04-12T18:22:10Z","event":"Docked","StationName":"Ayres Hub","MarketID":42}"#;
        let event = JournalEvent::parse(line, origin()).unwrap();
        assert_eq!(event.event_type, "Docked");
        assert_eq!(event.timestamp.unwrap().unix_timestamp(), 1744482130);
        let keys: Vec<_> = event.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["timestamp", "event", "StationName", "MarketID"]);

        let docked: DockedEvent = event.decode().unwrap();
        assert_eq!(docked.market_id, 42);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            JournalEvent::parse("{not json", origin()),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            JournalEvent::parse("[1,2]", origin()),
            Err(ParseError::NotAnObject)
        ));
        assert!(matches!(
            JournalEvent::parse(r#"{"event":7}"#, origin()),
            Err(ParseError::MissingEventType)
        ));
        assert!(matches!(
            JournalEvent::parse(r#"{"timestamp":"2025-04-12T18:22:10Z"}"#, origin()),
            Err(ParseError::MissingEventType)
        ));
    }

    #[test]
    fn test_bad_timestamp_is_not_fatal() {
        let event = JournalEvent::parse(r#"{"event":"Music","timestamp":"yesterday"}"#, origin())
            .unwrap();
        assert!(event.timestamp.is_none());
    }
}

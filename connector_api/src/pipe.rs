//! Pipe configuration records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pipe identifier. Pipe ids are opaque strings assigned by the
/// configuration store, not by this service.
pub type Id = String;

/// A configured data-integration job linking a source connector to a
/// destination. The record is owned by the external configuration store;
/// the orchestrator reads it once per callback and may receive an updated
/// copy back from a connector's post-processing hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub id: Id,
    pub name: String,
    /// Identifier of the connector plugin responsible for this pipe's source.
    pub connector_id: String,
    /// Source-specific configuration, opaque to the orchestrator.
    #[serde(default)]
    pub source_config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipe {
    /// Build a new pipe record with empty source configuration.
    pub fn new(id: impl Into<Id>, name: impl Into<String>, connector_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            connector_id: connector_id.into(),
            source_config: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipe_round_trips_through_json() {
        let mut pipe = Pipe::new("pipe-1", "Orders sync", "salesforce");
        pipe.source_config = json!({"instance": "na3"});

        let serialized = serde_json::to_string(&pipe).unwrap();
        let deserialized: Pipe = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, pipe);
    }
}

//! Registry of installed connector plugins.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::connector::Connector;
use crate::pipe::Pipe;

/// Read-mostly registry of connectors, keyed by connector id.
///
/// Connectors are registered by the platform's plugin loader; the
/// orchestrator never owns their lifecycle and only resolves them here.
/// The concurrent map keeps lookups safe while integrations are installed
/// or removed.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: DashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: DashMap::new(),
        }
    }

    /// Register a connector under its own id, replacing any previous one.
    pub fn register(&self, connector: Arc<dyn Connector>) {
        let id = connector.id().to_string();
        debug!("registering connector [{id}]");
        self.connectors.insert(id, connector);
    }

    /// Remove a connector by id.
    pub fn deregister(&self, connector_id: &str) -> Option<Arc<dyn Connector>> {
        debug!("deregistering connector [{connector_id}]");
        self.connectors
            .remove(connector_id)
            .map(|(_, connector)| connector)
    }

    /// Look up a connector by id.
    pub fn get(&self, connector_id: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(connector_id).map(|entry| entry.clone())
    }

    /// Resolve the connector responsible for a pipe by inspecting its record.
    pub fn connector_for_pipe(&self, pipe: &Pipe) -> Option<Arc<dyn Connector>> {
        self.get(&pipe.connector_id)
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

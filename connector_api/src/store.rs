//! Pipe configuration store contract.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, ConnectorApiErrorKind};
use crate::pipe::{Id, Pipe};

/// Read access to pipe configurations.
///
/// Pipe records are owned by an external configuration store; the
/// orchestrator reads one record per callback and never writes back.
#[async_trait]
pub trait PipeStore: Send + Sync {
    /// Fetch a pipe configuration by id. `Ok(None)` means no record exists;
    /// `Err` means the store itself failed to execute the lookup.
    async fn get_pipe(&self, id: &Id) -> Result<Option<Pipe>, Error>;
}

/// In-memory pipe store used for local wiring and tests.
#[derive(Default)]
pub struct InMemoryPipeStore {
    pipes: RwLock<HashMap<Id, Pipe>>,
}

impl InMemoryPipeStore {
    pub fn new() -> Self {
        Self {
            pipes: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, pipe: Pipe) {
        self.pipes.write().await.insert(pipe.id.clone(), pipe);
    }
}

#[async_trait]
impl PipeStore for InMemoryPipeStore {
    async fn get_pipe(&self, id: &Id) -> Result<Option<Pipe>, Error> {
        if id.is_empty() {
            return Err(Error {
                source: None,
                error_kind: ConnectorApiErrorKind::Invalid,
            });
        }
        Ok(self.pipes.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_pipe_returns_inserted_record() {
        let store = InMemoryPipeStore::new();
        let pipe = Pipe::new("pipe-1", "Orders sync", "salesforce");
        store.insert(pipe.clone()).await;

        let found = store.get_pipe(&"pipe-1".to_string()).await.unwrap();
        assert_eq!(found, Some(pipe));
    }

    #[tokio::test]
    async fn test_get_pipe_missing_is_none_not_error() {
        let store = InMemoryPipeStore::new();
        let found = store.get_pipe(&"nope".to_string()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_pipe_empty_id_is_invalid() {
        let store = InMemoryPipeStore::new();
        let err = store.get_pipe(&String::new()).await.unwrap_err();
        assert_eq!(err.error_kind, ConnectorApiErrorKind::Invalid);
    }
}

//! Registry mapping pipe ids to auth strategies.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::AuthStrategy;

/// Mapping from pipe id to the strategy that authenticates its provider.
///
/// Strategies are added and removed dynamically as connector integrations
/// are installed; the concurrent map keeps in-flight lookups safe against
/// modification from other requests.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: DashMap<String, Arc<dyn AuthStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: DashMap::new(),
        }
    }

    /// Register a strategy under a pipe id, replacing any previous one.
    pub fn add_strategy(&self, pipe_id: impl Into<String>, strategy: Arc<dyn AuthStrategy>) {
        let pipe_id = pipe_id.into();
        debug!(pipe_id = %pipe_id, "registering auth strategy");
        self.strategies.insert(pipe_id, strategy);
    }

    /// Remove the strategy registered under a pipe id, if any.
    pub fn remove_strategy(&self, pipe_id: &str) -> Option<Arc<dyn AuthStrategy>> {
        debug!(pipe_id = %pipe_id, "removing auth strategy");
        self.strategies.remove(pipe_id).map(|(_, strategy)| strategy)
    }

    /// Look up the strategy for a pipe id.
    pub fn get(&self, pipe_id: &str) -> Option<Arc<dyn AuthStrategy>> {
        self.strategies.get(pipe_id).map(|entry| entry.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::strategy::{AuthOutcome, CallbackRequest};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct NullStrategy;

    #[async_trait]
    impl AuthStrategy for NullStrategy {
        fn authorization_url(&self, state: &str, _extra: &HashMap<String, String>) -> String {
            format!("https://provider.test/authorize?state={state}")
        }

        async fn authenticate(
            &self,
            _request: &CallbackRequest,
            _pipe_id: &str,
        ) -> Result<AuthOutcome, Error> {
            Ok(AuthOutcome::default())
        }
    }

    #[test]
    fn test_add_and_get_strategy() {
        let registry = StrategyRegistry::new();
        assert!(registry.get("pipe-1").is_none());

        registry.add_strategy("pipe-1", Arc::new(NullStrategy));
        assert!(registry.get("pipe-1").is_some());
        assert!(registry.get("pipe-2").is_none());
    }

    #[test]
    fn test_remove_strategy() {
        let registry = StrategyRegistry::new();
        registry.add_strategy("pipe-1", Arc::new(NullStrategy));

        assert!(registry.remove_strategy("pipe-1").is_some());
        assert!(registry.get("pipe-1").is_none());
        assert!(registry.remove_strategy("pipe-1").is_none());
    }
}

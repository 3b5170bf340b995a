//! Optional router selecting between multiple memory adapters (spec §9:
//! "the router that selects between adapters is optional scaffolding and
//! may be omitted until a second backend exists"). Kept minimal: routes by
//! a session key to whichever adapter was registered for it, falling back
//! to a default.

use crate::adapter::{MemoryAdapter, MemoryError, MemoryItem};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MemoryRouter {
    default: Arc<dyn MemoryAdapter>,
    overrides: RwLock<HashMap<String, Arc<dyn MemoryAdapter>>>,
}

impl MemoryRouter {
    pub fn new(default: Arc<dyn MemoryAdapter>) -> Self {
        Self {
            default,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, session_key: impl Into<String>, adapter: Arc<dyn MemoryAdapter>) {
        self.overrides.write().insert(session_key.into(), adapter);
    }

    fn resolve(&self, session_key: &str) -> Arc<dyn MemoryAdapter> {
        self.overrides
            .read()
            .get(session_key)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    pub async fn store(&self, session_key: &str, item: MemoryItem) -> Result<(), MemoryError> {
        self.resolve(session_key).store(item).await
    }

    pub async fn retrieve(&self, session_key: &str, k: usize) -> Result<Vec<MemoryItem>, MemoryError> {
        self.resolve(session_key).retrieve(k).await
    }
}

#[async_trait]
impl MemoryAdapter for MemoryRouter {
    async fn store(&self, item: MemoryItem) -> Result<(), MemoryError> {
        self.default.store(item).await
    }

    async fn retrieve(&self, k: usize) -> Result<Vec<MemoryItem>, MemoryError> {
        self.default.retrieve(k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Role;
    use crate::in_memory::InMemoryMemory;

    #[tokio::test]
    async fn routes_to_registered_override() {
        let router = MemoryRouter::new(Arc::new(InMemoryMemory::new()));
        let override_adapter: Arc<dyn MemoryAdapter> = Arc::new(InMemoryMemory::new());
        router.register("session-a", override_adapter.clone());

        router
            .store(
                "session-a",
                MemoryItem {
                    content: "hi".into(),
                    role: Role::User,
                },
            )
            .await
            .unwrap();

        assert_eq!(override_adapter.retrieve(8).await.unwrap().len(), 1);
        assert_eq!(router.retrieve("session-b", 8).await.unwrap().len(), 0);
    }
}

//! Default in-process, ephemeral memory adapter (spec §6: "the default
//! memory adapter is in-memory and ephemeral").

use crate::adapter::{MemoryAdapter, MemoryError, MemoryItem};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

const MAX_RETAINED: usize = 256;

#[derive(Default)]
pub struct InMemoryMemory {
    items: Mutex<VecDeque<MemoryItem>>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryAdapter for InMemoryMemory {
    async fn store(&self, item: MemoryItem) -> Result<(), MemoryError> {
        let mut items = self.items.lock();
        items.push_back(item);
        while items.len() > MAX_RETAINED {
            items.pop_front();
        }
        Ok(())
    }

    async fn retrieve(&self, k: usize) -> Result<Vec<MemoryItem>, MemoryError> {
        let items = self.items.lock();
        let start = items.len().saturating_sub(k);
        Ok(items.iter().skip(start).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Role;

    #[tokio::test]
    async fn retrieve_returns_last_k_oldest_first() {
        let memory = InMemoryMemory::new();
        for i in 0..5 {
            memory
                .store(MemoryItem {
                    content: format!("msg {i}"),
                    role: Role::User,
                })
                .await
                .unwrap();
        }
        let last3 = memory.retrieve(3).await.unwrap();
        assert_eq!(last3.len(), 3);
        assert_eq!(last3[0].content, "msg 2");
        assert_eq!(last3[2].content, "msg 4");
    }

    #[tokio::test]
    async fn retrieve_more_than_stored_returns_all() {
        let memory = InMemoryMemory::new();
        memory
            .store(MemoryItem {
                content: "only one".into(),
                role: Role::Assistant,
            })
            .await
            .unwrap();
        assert_eq!(memory.retrieve(8).await.unwrap().len(), 1);
    }
}

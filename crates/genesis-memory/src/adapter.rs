//! Memory adapter contract (spec §9 design note: "keep the adapter
//! interface minimal (`store`, `retrieve(k)`)"). Only the contract is
//! specified here — concrete backends beyond the in-process default are
//! out of scope (§1).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub content: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory store unavailable: {0}")]
    Unavailable(String),
}

/// Conversation memory for one agent session.
///
/// §4.5 step 9: writes happen strictly user-then-assistant, and not until
/// turn completion. §4.5 step 2/Error semantics: retrieve failures degrade
/// to an empty history rather than aborting the turn; store failures are
/// logged but do not fail the turn.
#[async_trait]
pub trait MemoryAdapter: Send + Sync {
    async fn store(&self, item: MemoryItem) -> Result<(), MemoryError>;

    /// Last `k` items, oldest first.
    async fn retrieve(&self, k: usize) -> Result<Vec<MemoryItem>, MemoryError>;
}

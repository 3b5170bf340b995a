pub mod adapter;
pub mod in_memory;
pub mod router;

pub use adapter::{MemoryAdapter, MemoryError, MemoryItem, Role};
pub use in_memory::InMemoryMemory;
pub use router::MemoryRouter;

//! §4.3 RPC request/reply layer: broadcast → lock → targeted addressing,
//! tie-breaking for broadcast replies, timeouts, and soft wall-clock
//! budgets on the agent side.

pub mod channel;
pub mod client;
pub mod error;
pub mod roster;
pub mod server;
pub mod topic;
pub mod types;

pub use client::RpcSession;
pub use error::{Result, RpcError};
pub use roster::{rank_of, RosterSource};
pub use server::{run_replier, should_reply};
pub use types::{ReplyStatus, RpcReply, RpcRequest};

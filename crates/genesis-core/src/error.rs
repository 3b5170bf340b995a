//! The Genesis error taxonomy (spec §7), as a concrete `thiserror` enum.
//!
//! Mirrors `querymt::error::LLMError` / `querymt_agent::tools::ToolError` in
//! shape: one flat enum per failure domain, `Display` messages suitable to
//! surface directly to a caller, `#[from]` conversions at the boundaries that
//! wrap a lower layer (`genesis-rpc`, `genesis-registry`) into this one.

use crate::guid::Guid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("bus unavailable: {0}")]
    BusUnavailable(String),

    #[error("discovery timed out waiting for an agent offering '{service_name}'")]
    DiscoveryTimeout { service_name: String },

    #[error("RPC requester for '{service_name}' never matched a replier")]
    BindTimeout { service_name: String },

    #[error("RPC request {conversation_id} to '{service_name}' timed out")]
    RpcTimeout {
        service_name: String,
        conversation_id: Guid,
    },

    #[error("request cancelled")]
    Cancelled,

    #[error("tool '{tool_name}' failed: {message}")]
    ToolError { tool_name: String, message: String },

    #[error("LLM call failed: {0}")]
    LlmError(String),

    #[error("tool-call arguments for '{tool_name}' failed schema validation: {message}")]
    InvalidSchema { tool_name: String, message: String },

    #[error("agent-to-agent call {call_id} refused: cycle detected at depth {depth}")]
    CycleDetected { call_id: Guid, depth: u32 },
}

impl GenesisError {
    /// Numeric status code carried in an `RPCReply`/agent reply. `0` is
    /// reserved for success and is never produced by this type; `CYCLE`
    /// gets a status distinct from the generic non-zero bucket so callers
    /// (and §8 scenario 5's test) can distinguish it from an ordinary
    /// tool failure.
    pub fn status_code(&self) -> u32 {
        match self {
            GenesisError::BusUnavailable(_) => 1,
            GenesisError::DiscoveryTimeout { .. } => 2,
            GenesisError::BindTimeout { .. } => 3,
            GenesisError::RpcTimeout { .. } => 4,
            GenesisError::Cancelled => 5,
            GenesisError::ToolError { .. } => 6,
            GenesisError::LlmError(_) => 7,
            GenesisError::InvalidSchema { .. } => 8,
            GenesisError::CycleDetected { .. } => CYCLE_STATUS,
        }
    }
}

/// Reserved status code for `CYCLE_DETECTED`, distinct from every other
/// non-zero status (spec §8 scenario 5).
pub const CYCLE_STATUS: u32 = 90;

pub type Result<T> = std::result::Result<T, GenesisError>;

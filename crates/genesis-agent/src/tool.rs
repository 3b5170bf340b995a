//! §4.5 step 5: the uniform tool shape the LLM sees, regardless of whether
//! a tool call ends up executing a remote function, a peer-agent RPC, or an
//! in-process internal tool.

use genesis_core::Guid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Where a tool call, once issued by the LLM, should be dispatched.
#[derive(Debug, Clone)]
pub enum ToolSource {
    ExternalFunction { function_id: Guid },
    Internal,
    PeerAgent { target_agent_id: Guid, service_name: String },
}

#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub definition: ToolDefinition,
    pub source: ToolSource,
}

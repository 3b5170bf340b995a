//! §3 RPCRequest / RPCReply, and the §4.5 cycle-protection extensions
//! (`call_id`, `depth`) carried as part of the request's `extensions`.

use genesis_core::Guid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `target_service_guid` is empty for broadcast, non-empty for targeted
/// (§3 invariant: targeted requests never fan out).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub message: Value,
    pub conversation_id: Guid,
    pub target_service_guid: Option<Guid>,
    pub service_instance_tag: Option<String>,
    /// Cycle-protection ancestry (§4.5 step 7): the GUIDs of the
    /// participants that have already delegated this chain onward, in
    /// order. A participant refuses to delegate to a target already in
    /// this list rather than minting a call that would loop back.
    pub call_id: Guid,
    pub depth: u32,
    pub ancestry: Vec<Guid>,
    /// Threads a monitoring `chain_id` end-to-end across roles (§4.8).
    pub chain_id: Guid,
}

impl RpcRequest {
    pub fn new_root(message: Value) -> Self {
        Self {
            message,
            conversation_id: Guid::new(),
            target_service_guid: None,
            service_instance_tag: None,
            call_id: Guid::new(),
            depth: 0,
            ancestry: Vec::new(),
            chain_id: Guid::new(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.target_service_guid.is_none()
    }

    /// Build the request a tool-dispatch hop to a peer agent would send:
    /// same chain/conversation-adjacent metadata, depth + 1, ancestry
    /// extended with `delegated_by` — the GUID of the participant making
    /// this hop, not a fresh random id, so a chain that loops back through
    /// the same participant is detectable by membership in `ancestry`
    /// rather than by coincidence of a repeated `call_id`.
    pub fn child_call(&self, message: Value, delegated_by: Guid) -> Self {
        let mut ancestry = self.ancestry.clone();
        ancestry.push(delegated_by);
        Self {
            message,
            conversation_id: Guid::new(),
            target_service_guid: None,
            service_instance_tag: None,
            call_id: Guid::new(),
            depth: self.depth + 1,
            ancestry,
            chain_id: self.chain_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyStatus {
    Success,
    Error(u32),
}

impl ReplyStatus {
    pub fn code(self) -> u32 {
        match self {
            ReplyStatus::Success => 0,
            ReplyStatus::Error(c) => c,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ReplyStatus::Success)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReply {
    pub message: Value,
    pub status: ReplyStatus,
    pub replier_service_guid: Guid,
    pub service_instance_tag: Option<String>,
    pub conversation_id: Guid,
}

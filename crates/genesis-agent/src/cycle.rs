//! §4.5 step 7: cycle protection for agent-to-agent delegation.
//!
//! Every hop carries `depth` and `ancestry` in the `RpcRequest` itself
//! (`genesis_rpc::RpcRequest::child_call`), so detection needs no shared
//! coordinator: each delegating agent only has to look at the request it
//! was just handed plus the GUID of the peer it's about to call.
//!
//! `ancestry` holds the GUIDs of participants that have already delegated
//! this chain onward, not `call_id`s — a fresh `call_id` is minted on every
//! hop (§4.3 addressing requires it to be unique per request), so a
//! `call_id`-based repeat check can never fire. Membership of the *next*
//! target in `ancestry` is what actually distinguishes "this chain already
//! passed through that participant" from an ordinary deeper call.

use genesis_core::{Guid, Result};
use genesis_rpc::RpcRequest;

/// Refuse the call if it has already exceeded `max_depth`, or if
/// `target` (the participant about to be delegated to) already appears in
/// `ancestry` — the chain would loop back through a participant it has
/// already visited.
pub fn check_cycle(request: &RpcRequest, target: Guid, max_depth: u32) -> Result<()> {
    if request.depth >= max_depth {
        return Err(cycle_error(request));
    }
    if request.ancestry.contains(&target) {
        return Err(cycle_error(request));
    }
    Ok(())
}

fn cycle_error(request: &RpcRequest) -> genesis_core::GenesisError {
    genesis_core::GenesisError::CycleDetected {
        call_id: request.call_id,
        depth: request.depth,
    }
}

/// Build the delegated call's request, threading ancestry/depth through,
/// then validate it before it is ever published (§4.5: refuse up front
/// rather than let the callee discover the cycle). `delegated_by` is the
/// calling participant's own GUID (pushed into the child's ancestry);
/// `target` is the peer agent the call is about to be sent to.
pub fn prepare_child_call(
    parent: &RpcRequest,
    message: serde_json::Value,
    delegated_by: Guid,
    target: Guid,
    max_depth: u32,
) -> Result<RpcRequest> {
    let child = parent.child_call(message, delegated_by);
    check_cycle(&child, target, max_depth)?;
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_core::GenesisError;

    #[test]
    fn root_request_passes_cycle_check() {
        let root = RpcRequest::new_root(serde_json::json!({}));
        assert!(check_cycle(&root, Guid::new(), 4).is_ok());
    }

    #[test]
    fn exceeding_max_depth_is_refused() {
        let mut request = RpcRequest::new_root(serde_json::json!({}));
        request.depth = 4;
        let err = check_cycle(&request, Guid::new(), 4).unwrap_err();
        assert!(matches!(err, GenesisError::CycleDetected { depth: 4, .. }));
    }

    #[test]
    fn delegating_back_to_an_already_visited_participant_is_refused() {
        // A delegates to B: ancestry gains A's guid.
        let agent_a = Guid::new();
        let agent_b = Guid::new();
        let root = RpcRequest::new_root(serde_json::json!({}));
        let at_b = prepare_child_call(&root, serde_json::json!({}), agent_a, agent_b, 4).unwrap();

        // B now tries to delegate straight back to A — a real two-hop cycle,
        // not a coincidence of repeated `call_id`s (every hop mints a fresh one).
        let err = check_cycle(&at_b, agent_a, 4).unwrap_err();
        assert!(matches!(err, GenesisError::CycleDetected { .. }));
    }

    #[test]
    fn delegating_to_a_participant_not_yet_in_the_chain_is_allowed() {
        let agent_a = Guid::new();
        let agent_c = Guid::new();
        let root = RpcRequest::new_root(serde_json::json!({}));
        let at_b = prepare_child_call(&root, serde_json::json!({}), agent_a, Guid::new(), 4).unwrap();
        assert!(check_cycle(&at_b, agent_c, 4).is_ok());
    }

    #[test]
    fn mutual_delegation_is_refused_before_the_fourth_hop() {
        let mut request = RpcRequest::new_root(serde_json::json!({}));
        for _ in 0..4 {
            request = request.child_call(serde_json::json!({}), Guid::new());
        }
        let err = check_cycle(&request, Guid::new(), 4).unwrap_err();
        assert!(matches!(err, GenesisError::CycleDetected { depth: 4, .. }));
    }
}

//! §4.3 agent-side replier: content-filtered request consumption, broadcast
//! tie-breaking, and a soft wall-clock budget on handling.

use crate::channel::{publish_reply, subscribe_requests};
use crate::roster::rank_of;
use crate::roster::RosterSource;
use crate::types::{ReplyStatus, RpcReply, RpcRequest};
use genesis_core::{Guid, Participant};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Whether this candidate should reply to `request`, applying the §4.3
/// content filter (`target_service_guid IN {"", my_guid}`) and, for
/// broadcast requests, the rank-0 tie-break.
pub fn should_reply(
    request: &RpcRequest,
    my_guid: Guid,
    service_name: &str,
    roster: &dyn RosterSource,
) -> bool {
    match request.target_service_guid {
        Some(target) => target == my_guid,
        None => {
            let roster = roster.roster(service_name);
            rank_of(roster, my_guid) == Some(0)
        }
    }
}

/// Drive one agent's replier loop for `service_name` forever, calling
/// `handle` for each request this candidate should answer. `handle` is
/// given the soft wall-clock budget as its own timeout; if it does not
/// finish in time the replier sends a non-zero status reply itself rather
/// than hanging (§4.3: "the agent must reply with status ≠ 0 rather than
/// hang").
pub async fn run_replier<F, Fut>(
    participant: Participant,
    service_name: String,
    my_guid: Guid,
    roster: Arc<dyn RosterSource>,
    soft_timeout: Duration,
    handle: F,
) where
    F: Fn(RpcRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcReply> + Send + 'static,
{
    let mut requests = subscribe_requests(&participant, &service_name);
    let handle = Arc::new(handle);

    loop {
        let request = match requests.recv().await {
            Ok(r) => r,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        };

        if !should_reply(&request, my_guid, &service_name, roster.as_ref()) {
            continue;
        }

        let participant = participant.clone();
        let service_name = service_name.clone();
        let handle = handle.clone();
        tokio::spawn(async move {
            let conversation_id = request.conversation_id;
            let reply = match tokio::time::timeout(soft_timeout, handle(request)).await {
                Ok(reply) => reply,
                Err(_elapsed) => RpcReply {
                    message: serde_json::json!({
                        "error": "agent processing exceeded its soft wall-clock budget"
                    }),
                    status: ReplyStatus::Error(7),
                    replier_service_guid: my_guid,
                    service_instance_tag: None,
                    conversation_id,
                },
            };
            publish_reply(&participant, &service_name, reply);
        });
    }
}

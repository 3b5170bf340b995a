//! §2 Interface role façade: the client entry point. Discovers agents,
//! opens an RPC session, emits requests, receives replies.

use genesis_core::{Guid, Participant};
use genesis_rpc::{RpcReply, RpcSession};
use std::time::Duration;

/// One conversational session from a single interface to a single logical
/// agent service. Owns the RPC session's lock state; per §5's ordering
/// guarantee, callers must not issue a second request before the first
/// resolves.
pub struct Interface {
    session: RpcSession,
}

impl Interface {
    pub fn new(participant: Participant, service_name: impl Into<String>) -> Self {
        Self { session: RpcSession::new(participant, service_name) }
    }

    pub fn locked_target(&self) -> Option<Guid> {
        self.session.locked_target()
    }

    /// Send one user message and wait for a reply, broadcasting on the
    /// first call and addressing the locked target on subsequent calls
    /// (§4.3).
    pub async fn send_message(&mut self, text: impl Into<String>, timeout: Duration) -> genesis_rpc::Result<RpcReply> {
        self.session
            .send_request(serde_json::json!({ "message": text.into() }), timeout, false)
            .await
    }

    /// Clear the locked target and broadcast again — used after a
    /// `RPC_TIMEOUT` to fail over to a different replier (§4.3 step 5).
    pub async fn send_message_with_failover(
        &mut self,
        text: impl Into<String>,
        timeout: Duration,
    ) -> genesis_rpc::Result<RpcReply> {
        self.session
            .send_request(serde_json::json!({ "message": text.into() }), timeout, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_core::bus::LocalBus;
    use genesis_rpc::channel::{publish_reply, subscribe_requests};
    use genesis_rpc::types::ReplyStatus;
    use std::sync::Arc;

    fn spawn_echo(participant: Participant, service_name: &'static str, my_guid: Guid) {
        let mut requests = subscribe_requests(&participant, service_name);
        tokio::spawn(async move {
            while let Ok(req) = requests.recv().await {
                let reply = RpcReply {
                    message: req.message.clone(),
                    status: ReplyStatus::Success,
                    replier_service_guid: my_guid,
                    service_instance_tag: None,
                    conversation_id: req.conversation_id,
                };
                publish_reply(&participant, service_name, reply);
            }
        });
    }

    #[tokio::test]
    async fn send_message_locks_onto_the_first_replier() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let my_guid = Guid::new();
        spawn_echo(participant.clone(), "Primary", my_guid);

        let mut interface = Interface::new(participant, "Primary");
        assert!(interface.locked_target().is_none());

        let reply = interface.send_message("hello", Duration::from_millis(500)).await.unwrap();
        assert!(reply.status.is_success());
        assert_eq!(interface.locked_target(), Some(my_guid));
    }

    #[tokio::test]
    async fn failover_clears_the_lock_before_resending() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let my_guid = Guid::new();
        spawn_echo(participant.clone(), "Primary", my_guid);

        let mut interface = Interface::new(participant, "Primary");
        interface.send_message("hi", Duration::from_millis(500)).await.unwrap();
        assert!(interface.locked_target().is_some());

        let reply = interface
            .send_message_with_failover("hi again", Duration::from_millis(500))
            .await
            .unwrap();
        assert!(reply.status.is_success());
    }
}

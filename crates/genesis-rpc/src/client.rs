//! §4.3 interface-side `send_request`: broadcast → lock → targeted, with
//! reply drain and failover via `reset_target`.

use crate::channel::{publish_request, subscribe_replies};
use crate::error::{Result, RpcError};
use crate::types::{RpcReply, RpcRequest};
use genesis_core::{Guid, Participant};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

/// Per-interface RPC session. Owns at most one locked target GUID at a
/// time (§3 invariant: "an interface holds at most one target agent GUID
/// per RPC session; targeted requests never fan out").
pub struct RpcSession {
    participant: Participant,
    service_name: String,
    locked_target: Option<Guid>,
}

impl RpcSession {
    pub fn new(participant: Participant, service_name: impl Into<String>) -> Self {
        Self {
            participant,
            service_name: service_name.into(),
            locked_target: None,
        }
    }

    pub fn locked_target(&self) -> Option<Guid> {
        self.locked_target
    }

    /// `reset_target=true` clears the lock and returns to broadcast (§4.3
    /// step 5), used for failover or explicit rebind.
    pub async fn send_request(
        &mut self,
        message: Value,
        timeout: Duration,
        reset_target: bool,
    ) -> Result<RpcReply> {
        self.send_request_with(message, timeout, reset_target, Duration::from_secs(1))
            .await
    }

    pub async fn send_request_with(
        &mut self,
        message: Value,
        timeout: Duration,
        reset_target: bool,
        drain_window: Duration,
    ) -> Result<RpcReply> {
        self.send_built_request(RpcRequest::new_root(message), timeout, reset_target, drain_window)
            .await
    }

    /// Like [`Self::send_request`], but sends a request already built by the
    /// caller (e.g. via [`RpcRequest::child_call`]) instead of constructing
    /// a fresh root request — the path agent-to-agent delegation uses to
    /// carry cycle-protection ancestry across the wire (§4.5 step 7).
    pub async fn send_child_request(
        &mut self,
        request: RpcRequest,
        timeout: Duration,
        reset_target: bool,
    ) -> Result<RpcReply> {
        self.send_built_request(request, timeout, reset_target, Duration::from_secs(1))
            .await
    }

    async fn send_built_request(
        &mut self,
        mut request: RpcRequest,
        timeout: Duration,
        reset_target: bool,
        drain_window: Duration,
    ) -> Result<RpcReply> {
        if reset_target {
            self.locked_target = None;
        }
        request.target_service_guid = self.locked_target;

        // Subscribe before publishing to avoid a race where a fast replier's
        // answer is sent before we start listening.
        let mut replies = subscribe_replies(&self.participant, &self.service_name);
        publish_request(&self.participant, &self.service_name, request.clone());

        let deadline = Instant::now() + timeout;
        let first = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RpcError::Timeout {
                    conversation_id: request.conversation_id,
                });
            }
            match tokio::time::timeout(remaining, replies.recv()).await {
                Ok(Ok(reply)) if reply.conversation_id == request.conversation_id => break reply,
                Ok(Ok(_other)) => continue,
                Ok(Err(_closed_or_lagged)) => continue,
                Err(_elapsed) => {
                    return Err(RpcError::Timeout {
                        conversation_id: request.conversation_id,
                    });
                }
            }
        };

        // §4.3 step 3: drain additional replies within a short quiet window,
        // keeping the last one, to tolerate progressive/final-reply agents.
        let mut latest = first;
        loop {
            match tokio::time::timeout(drain_window, replies.recv()).await {
                Ok(Ok(reply)) if reply.conversation_id == latest.conversation_id => {
                    latest = reply;
                }
                Ok(Ok(_other)) => continue,
                Ok(Err(_)) => break,
                Err(_elapsed) => break,
            }
        }

        self.locked_target = Some(latest.replier_service_guid);
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{publish_reply, subscribe_requests};
    use crate::types::ReplyStatus;
    use genesis_core::bus::LocalBus;
    use serde_json::json;
    use std::sync::Arc;

    fn agent_echo(
        participant: Participant,
        service_name: &'static str,
        my_guid: Guid,
    ) -> tokio::task::JoinHandle<()> {
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
        })
    }

    #[tokio::test]
    async fn broadcast_then_lock_then_targeted() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let my_guid = Guid::new();
        let _agent = agent_echo(participant.clone(), "Math", my_guid);

        let mut session = RpcSession::new(participant, "Math");
        assert!(session.locked_target().is_none());

        let reply = session
            .send_request(json!({"message": "ping 1"}), Duration::from_millis(500), false)
            .await
            .unwrap();
        assert_eq!(reply.replier_service_guid, my_guid);
        assert_eq!(session.locked_target(), Some(my_guid));

        let reply2 = session
            .send_request(json!({"message": "ping 2"}), Duration::from_millis(500), false)
            .await
            .unwrap();
        assert_eq!(reply2.replier_service_guid, my_guid);
    }

    #[tokio::test]
    async fn reset_target_returns_to_broadcast() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let my_guid = Guid::new();
        let _agent = agent_echo(participant.clone(), "Math", my_guid);

        let mut session = RpcSession::new(participant, "Math");
        session
            .send_request(json!({"message": "ping"}), Duration::from_millis(500), false)
            .await
            .unwrap();
        assert!(session.locked_target().is_some());

        let reply = session
            .send_request(json!({"message": "ping"}), Duration::from_millis(500), true)
            .await
            .unwrap();
        assert_eq!(reply.replier_service_guid, my_guid);
    }

    #[tokio::test]
    async fn no_replier_times_out() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let mut session = RpcSession::new(participant, "Nobody");
        let err = session
            .send_request(json!({"message": "hi"}), Duration::from_millis(50), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Timeout { .. }));
    }
}

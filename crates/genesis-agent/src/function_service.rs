//! §2 Function Service role façade: a stateless capability provider.
//! Advertises one or more functions with JSON-schema parameters and serves
//! RPC calls for them.

use genesis_core::advertisement::{Advertisement, Kind};
use genesis_core::Participant;
use genesis_registry::LocalFunction;
use genesis_rpc::roster::RosterSource;
use genesis_rpc::server::{run_replier, should_reply};
use genesis_rpc::types::{ReplyStatus, RpcReply, RpcRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;

/// A roster of exactly one: a function service does not participate in
/// broadcast tie-breaking the way agents offering the same capability do
/// (§4.3 assumes each function service owns a distinct `service_name`), so
/// it always replies to broadcasts addressed to it.
struct SoloRoster {
    my_guid: genesis_core::Guid,
}

impl RosterSource for SoloRoster {
    fn roster(&self, _service_name: &str) -> Vec<(genesis_core::Guid, OffsetDateTime)> {
        vec![(self.my_guid, OffsetDateTime::now_utc())]
    }
}

/// Hosts a fixed set of named functions behind one `service_name`,
/// dispatching `{"function": name, "args": args}` requests the way
/// [`genesis_registry::FunctionRegistry::invoke`] builds them for remote
/// functions.
pub struct FunctionService {
    pub participant: Participant,
    pub service_name: String,
    functions: HashMap<String, (String, Value, Vec<String>, Arc<dyn LocalFunction>)>,
}

impl FunctionService {
    pub fn new(participant: Participant, service_name: impl Into<String>) -> Self {
        Self { participant, service_name: service_name.into(), functions: HashMap::new() }
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: Value,
        capabilities: Vec<String>,
        callable: Arc<dyn LocalFunction>,
    ) -> Self {
        self.functions.insert(name.into(), (description.into(), parameter_schema, capabilities, callable));
        self
    }

    /// Publish one FUNCTION advertisement per registered function.
    pub async fn announce(&self) -> genesis_core::Result<()> {
        for (name, (_description, schema, capabilities, _callable)) in &self.functions {
            let advertisement = Advertisement {
                advertisement_id: format!("{}/{}", self.participant.guid(), name),
                kind: Kind::Function,
                name: name.clone(),
                service_name: self.service_name.clone(),
                provider_id: self.participant.guid(),
                schema_json: schema.clone(),
                capabilities: capabilities.clone(),
                classification_tags: vec![],
                specializations: vec![],
                timestamp: OffsetDateTime::now_utc(),
            };
            self.participant.bus().publish(advertisement).await?;
        }
        Ok(())
    }

    async fn handle_one(&self, request: RpcRequest) -> RpcReply {
        let function_name = request.message["function"].as_str().unwrap_or_default();
        let args = request.message["args"].clone();

        let reply_message = match self.functions.get(function_name) {
            Some((_description, _schema, _capabilities, callable)) => match callable.call(args).await {
                Ok(result) => (result, ReplyStatus::Success),
                Err(message) => (serde_json::json!({ "error": message }), ReplyStatus::Error(6)),
            },
            None => (
                serde_json::json!({ "error": format!("unknown function '{function_name}'") }),
                ReplyStatus::Error(6),
            ),
        };

        RpcReply {
            message: reply_message.0,
            status: reply_message.1,
            replier_service_guid: self.participant.guid(),
            service_instance_tag: None,
            conversation_id: request.conversation_id,
        }
    }

    pub async fn serve(self: Arc<Self>) {
        let roster: Arc<dyn RosterSource> = Arc::new(SoloRoster { my_guid: self.participant.guid() });
        let my_guid = self.participant.guid();
        let service_name = self.service_name.clone();
        let participant = self.participant.clone();
        let this = self.clone();

        run_replier(
            participant,
            service_name,
            my_guid,
            roster,
            std::time::Duration::from_secs(60),
            move |request: RpcRequest| {
                let this = this.clone();
                async move { this.handle_one(request).await }
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_core::bus::LocalBus;

    #[tokio::test]
    async fn calls_the_named_function_with_its_args() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let service = FunctionService::new(participant, "Math").register(
            "add",
            "adds two numbers",
            serde_json::json!({"type": "object"}),
            vec![],
            Arc::new(|args: Value| async move {
                let x = args["x"].as_f64().unwrap_or(0.0);
                let y = args["y"].as_f64().unwrap_or(0.0);
                Ok(serde_json::json!({ "result": x + y }))
            }),
        );

        let request = RpcRequest::new_root(serde_json::json!({
            "function": "add",
            "args": {"x": 127, "y": 384}
        }));
        let reply = service.handle_one(request).await;
        assert!(reply.status.is_success());
        assert_eq!(reply.message["result"], 511.0);
    }

    #[tokio::test]
    async fn unknown_function_replies_with_nonzero_status() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let service = FunctionService::new(participant, "Math");
        let request = RpcRequest::new_root(serde_json::json!({"function": "missing", "args": {}}));
        let reply = service.handle_one(request).await;
        assert!(!reply.status.is_success());
    }

    #[test]
    fn solo_roster_always_wins_rank_zero() {
        let my_guid = genesis_core::Guid::new();
        let roster = SoloRoster { my_guid };
        let request = RpcRequest::new_root(serde_json::json!({}));
        assert!(should_reply(&request, my_guid, "Math", &roster));
    }
}

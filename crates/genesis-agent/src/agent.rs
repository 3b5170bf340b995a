//! §2 Agent role façade: a primary processor exposing an RPC service.
//! Advertises capabilities, consumes requests from interfaces or other
//! agents, orchestrates a turn via [`crate::orchestration::OrchestrationContext`],
//! and emits replies.

use crate::classifier::{FunctionClassifier, NoopClassifier};
use crate::internal_tool::{InternalToolCache, StaticDispatch};
use crate::llm::LlmClient;
use crate::monitoring::MonitoringDecorator;
use crate::orchestration::OrchestrationContext;
use crate::tool::ToolEntry;
use genesis_core::advertisement::{Advertisement, AdvertisementEvent, Kind};
use genesis_core::{DiscoveryCache, Participant};
use genesis_registry::FunctionRegistry;
use genesis_rpc::types::{ReplyStatus, RpcReply, RpcRequest};
use genesis_rpc::{run_replier, RosterSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use time::OffsetDateTime;

/// Adapts an agent's own `DiscoveryCache` into the roster broadcast
/// tie-breaking needs (§4.3): every currently-ALIVE agent advertising this
/// agent's `service_name`.
struct CacheRoster {
    cache: Arc<StdMutex<DiscoveryCache>>,
}

impl RosterSource for CacheRoster {
    fn roster(&self, service_name: &str) -> Vec<(genesis_core::Guid, OffsetDateTime)> {
        self.cache
            .lock()
            .expect("discovery cache poisoned")
            .by_service_name(service_name)
            .filter(|ad| matches!(ad.kind, Kind::Agent))
            .map(|ad| (ad.provider_id, ad.timestamp))
            .collect()
    }
}

/// Everything needed to run one agent role-instance: identity, the
/// orchestration context it delegates turns to, and the discovery cache
/// used for both peer-agent-as-tool plumbing and broadcast tie-breaking.
pub struct Agent {
    pub participant: Participant,
    pub name: String,
    pub service_name: String,
    pub specializations: Vec<String>,
    pub capabilities: Vec<String>,
    context: Arc<OrchestrationContext>,
    discovery: Arc<StdMutex<DiscoveryCache>>,
}

impl Agent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        participant: Participant,
        name: impl Into<String>,
        service_name: impl Into<String>,
        specializations: Vec<String>,
        capabilities: Vec<String>,
        registry: FunctionRegistry,
        memory: Arc<dyn genesis_memory::MemoryAdapter>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let config = participant.config();
        let context = Arc::new(OrchestrationContext {
            participant: participant.clone(),
            config,
            registry,
            memory,
            llm,
            classifier: Arc::new(NoopClassifier) as Arc<dyn FunctionClassifier>,
            monitoring: MonitoringDecorator::null(),
            internal_tools: Vec::new(),
            internal_dispatch: None,
            peer_tool_cache: StdMutex::new(HashMap::new()),
        });
        Self {
            participant,
            name: name.into(),
            service_name: service_name.into(),
            specializations,
            capabilities,
            context,
            discovery: Arc::new(StdMutex::new(DiscoveryCache::new())),
        }
    }

    /// Reflect `T`'s `#[genesis_tools]`-annotated methods and bind them to
    /// `instance`, wiring both the tool-set entries and the runtime
    /// dispatcher the orchestration loop calls into (§4.7).
    pub fn with_internal_tools<T: Send + Sync + 'static>(mut self, instance: Arc<T>) -> Self {
        let cache = Arc::new(InternalToolCache::for_type::<T>());
        let entries: Vec<ToolEntry> = cache
            .records()
            .iter()
            .map(|record| ToolEntry {
                definition: crate::tool::ToolDefinition {
                    name: record.tool_name.clone(),
                    description: record.description.clone(),
                    parameters: record.parameter_schema.clone(),
                },
                source: crate::tool::ToolSource::Internal,
            })
            .collect();
        let dispatch: StaticDispatch = crate::internal_tool::make_dispatcher(instance, cache);

        let context = Arc::get_mut(&mut self.context)
            .expect("internal tools must be wired before the agent starts serving");
        context.internal_tools = entries;
        context.internal_dispatch = Some(dispatch);
        self
    }

    pub fn with_monitoring(mut self, monitoring: MonitoringDecorator) -> Self {
        Arc::get_mut(&mut self.context)
            .expect("monitoring must be wired before the agent starts serving")
            .monitoring = monitoring;
        self
    }

    /// Publish this agent's AGENT advertisement (§3, §4.1).
    pub async fn announce(&self) -> genesis_core::Result<()> {
        let advertisement = Advertisement {
            advertisement_id: self.participant.guid().to_string(),
            kind: Kind::Agent,
            name: self.name.clone(),
            service_name: self.service_name.clone(),
            provider_id: self.participant.guid(),
            schema_json: serde_json::json!({}),
            capabilities: self.capabilities.clone(),
            classification_tags: vec![],
            specializations: self.specializations.clone(),
            timestamp: OffsetDateTime::now_utc(),
        };
        self.participant.bus().publish(advertisement).await
    }

    /// Feed one bus event into this agent's peer-agent / function caches
    /// (§4.5 step 1: "ensure discoveries are fresh").
    pub fn observe_event(&self, event: AdvertisementEvent) {
        match &event {
            AdvertisementEvent::Alive(ad) if matches!(ad.kind, Kind::Agent) => {
                self.context.observe_peer_agent(ad);
            }
            AdvertisementEvent::Alive(ad) if matches!(ad.kind, Kind::Function) => {
                self.context.registry.apply_bus_event(
                    AdvertisementEvent::Alive(ad.clone()),
                    &ad.service_name,
                );
            }
            AdvertisementEvent::Departed { .. } => {
                self.context.registry.apply_bus_event(event.clone(), "");
            }
            _ => {}
        }
        self.discovery.lock().expect("discovery cache poisoned").apply(event);
    }

    /// Drive this agent's replier loop forever (§4.3): broadcast tie-break
    /// plus targeted addressing, soft wall-clock budget per request.
    pub async fn serve(self: Arc<Self>) {
        let roster: Arc<dyn RosterSource> = Arc::new(CacheRoster { cache: self.discovery.clone() });
        let my_guid = self.participant.guid();
        let soft_timeout = self.context.config.agent_soft_timeout();
        let service_name = self.service_name.clone();
        let participant = self.participant.clone();
        let this = self.clone();

        run_replier(participant, service_name, my_guid, roster, soft_timeout, move |request: RpcRequest| {
            let this = this.clone();
            async move { this.handle_one(request).await }
        })
        .await;
    }

    async fn handle_one(&self, request: RpcRequest) -> RpcReply {
        let user_message = request.message["message"].as_str().unwrap_or_default().to_string();
        let outcome = self.context.run_turn(&request, user_message).await;
        let status = match outcome.status {
            Ok(()) => ReplyStatus::Success,
            Err(e) => ReplyStatus::Error(e.status_code()),
        };
        RpcReply {
            message: outcome.message,
            status,
            replier_service_guid: self.participant.guid(),
            service_instance_tag: None,
            conversation_id: request.conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, LlmError, LlmTurn};
    use async_trait::async_trait;
    use genesis_core::bus::LocalBus;
    use genesis_memory::InMemoryMemory;

    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn chat(&self, messages: &[ChatMessage], _tools: &[crate::tool::ToolDefinition]) -> Result<LlmTurn, LlmError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(LlmTurn::Final(ChatMessage::assistant(format!("echo: {last}"))))
        }
    }

    #[tokio::test]
    async fn handle_one_replies_with_the_llms_final_message() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let registry = FunctionRegistry::new(participant.clone());
        let agent = Agent::new(
            participant,
            "Primary",
            "Primary",
            vec![],
            vec![],
            registry,
            Arc::new(InMemoryMemory::new()),
            Arc::new(EchoLlm),
        );

        let request = RpcRequest::new_root(serde_json::json!({"message": "hello"}));
        let reply = agent.handle_one(request).await;
        assert!(reply.status.is_success());
        assert_eq!(reply.message["message"], "echo: hello");
    }

    #[test]
    fn discovery_cache_roster_excludes_non_agent_advertisements() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let registry = FunctionRegistry::new(participant.clone());
        let agent = Agent::new(
            participant.clone(),
            "Primary",
            "Primary",
            vec![],
            vec![],
            registry,
            Arc::new(InMemoryMemory::new()),
            Arc::new(EchoLlm),
        );

        let function_ad = Advertisement {
            advertisement_id: "f1".to_string(),
            kind: Kind::Function,
            name: "add".to_string(),
            service_name: "Primary".to_string(),
            provider_id: genesis_core::Guid::new(),
            schema_json: serde_json::json!({}),
            capabilities: vec![],
            classification_tags: vec![],
            specializations: vec![],
            timestamp: OffsetDateTime::now_utc(),
        };
        agent.observe_event(AdvertisementEvent::Alive(function_ad));

        let roster = CacheRoster { cache: agent.discovery.clone() };
        assert!(roster.roster("Primary").is_empty());
    }
}

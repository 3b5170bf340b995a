//! §4.5 Agent Orchestration Loop: the agent's core processing step for one
//! incoming user/agent request, expressed as an explicit sequence of stages
//! rather than recursion through a generic "agent executor" — each stage
//! below corresponds 1:1 to one numbered step in that section.

use crate::classifier::FunctionClassifier;
use crate::cycle::check_cycle;
use crate::llm::{chat_with_retry, ChatMessage, LlmClient, LlmTurn, ToolCallRequest};
use crate::monitoring::{ChainEventType, MonitoringDecorator};
use crate::peer_tool;
use crate::tool::{ToolDefinition, ToolEntry, ToolSource};
use genesis_core::{Config, GenesisError, Guid, Participant, Result};
use genesis_memory::{MemoryAdapter, MemoryItem, Role as MemoryRole};
use genesis_registry::FunctionRegistry;
use genesis_rpc::RpcRequest;
use std::collections::HashMap;
use std::sync::Arc;

const GENERAL_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const TOOL_CAPABLE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant with access to tools. Use them when they help answer the request.";

/// Reflects an agent's own `#[genesis_tools]`-annotated methods, assembles
/// external-function, peer-agent, and internal tool caches, and dispatches
/// tool calls to the right backend. One instance is owned per agent.
pub struct OrchestrationContext {
    pub participant: Participant,
    pub config: Arc<Config>,
    pub registry: FunctionRegistry,
    pub memory: Arc<dyn MemoryAdapter>,
    pub llm: Arc<dyn LlmClient>,
    pub classifier: Arc<dyn FunctionClassifier>,
    pub monitoring: MonitoringDecorator,
    pub internal_tools: Vec<ToolEntry>,
    /// Bound to the concrete agent instance by the role façade that owns
    /// this context (§4.7: internal tools are direct in-process calls on
    /// the agent instance, not routed through the registry or the bus).
    pub internal_dispatch: Option<crate::internal_tool::StaticDispatch>,
    pub peer_tool_cache: std::sync::Mutex<HashMap<String, ToolEntry>>,
}

/// The result an orchestration turn hands back to whichever RPC replier
/// invoked it (§4.5 step 10).
pub struct TurnOutcome {
    pub message: serde_json::Value,
    pub status: Result<()>,
}

impl OrchestrationContext {
    /// Feed one discovered peer-agent advertisement into the agent-tool
    /// cache (§4.6), excluding self.
    pub fn observe_peer_agent(&self, advertisement: &genesis_core::advertisement::Advertisement) {
        if advertisement.provider_id == self.participant.guid() {
            return;
        }
        let entries = peer_tool::tool_entries_for(advertisement);
        let mut cache = self.peer_tool_cache.lock().expect("peer tool cache poisoned");
        peer_tool::merge_into_cache(&mut cache, entries);
    }

    fn external_function_tools(&self) -> Vec<ToolEntry> {
        self.registry
            .list()
            .into_iter()
            .map(|record| ToolEntry {
                definition: ToolDefinition {
                    name: record.name.clone(),
                    description: record.description.clone(),
                    parameters: record.parameter_schema.clone(),
                },
                source: ToolSource::ExternalFunction { function_id: record.function_id },
            })
            .collect()
    }

    fn peer_agent_tools(&self) -> Vec<ToolEntry> {
        self.peer_tool_cache
            .lock()
            .expect("peer tool cache poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// §4.5 steps 1, 3, 4, 5: fresh tool-set assembly for one turn.
    async fn assemble_tool_set(&self) -> Vec<ToolEntry> {
        let external = self.external_function_tools();
        let classified = if self.config.classification_enabled
            && external.len() > self.config.classification_threshold
        {
            let candidates = self.registry.list();
            let kept = self.classifier.classify(candidates).await;
            let kept_ids: std::collections::HashSet<Guid> =
                kept.iter().map(|r| r.function_id).collect();
            external
                .into_iter()
                .filter(|entry| match entry.source {
                    ToolSource::ExternalFunction { function_id } => kept_ids.contains(&function_id),
                    _ => true,
                })
                .collect()
        } else {
            external
        };

        let mut tool_set = classified;
        tool_set.extend(self.peer_agent_tools());
        tool_set.extend(self.internal_tools.iter().cloned());
        tool_set
    }

    fn system_prompt(tool_set: &[ToolEntry]) -> &'static str {
        if tool_set.is_empty() {
            GENERAL_SYSTEM_PROMPT
        } else {
            TOOL_CAPABLE_SYSTEM_PROMPT
        }
    }

    /// Run one full turn of the loop (§4.5 steps 1–10) for `request`,
    /// producing the reply message/status the caller's RPC replier sends
    /// back. `request` carries the cycle-protection ancestry the caller is
    /// responsible for threading (root requests from an interface use
    /// [`genesis_rpc::RpcRequest::new_root`]).
    pub async fn run_turn(&self, request: &RpcRequest, user_message: String) -> TurnOutcome {
        let chain_id = request.chain_id;
        let call_id = request.call_id;
        self.monitoring.chain(
            chain_id,
            call_id,
            ChainEventType::AgentRequestStart,
            request.target_service_guid.unwrap_or(self.participant.guid()),
            self.participant.guid(),
            serde_json::json!({ "message": user_message }),
        );

        // This chain already passed through this very participant if our
        // own GUID is in `ancestry` — a loop came back around.
        if let Err(e) = check_cycle(request, self.participant.guid(), self.config.max_agent_depth) {
            return TurnOutcome {
                message: serde_json::json!({ "error": e.to_string() }),
                status: Err(e),
            };
        }

        // Step 2: memory retrieval; a failed retrieve degrades to empty
        // history rather than aborting the turn.
        let history = self
            .memory
            .retrieve(self.config.memory_k)
            .await
            .unwrap_or_default();

        let tool_set = self.assemble_tool_set().await;
        let tool_defs: Vec<ToolDefinition> = tool_set.iter().map(|e| e.definition.clone()).collect();

        let mut messages = vec![ChatMessage::system(Self::system_prompt(&tool_set))];
        for item in &history {
            messages.push(match item.role {
                MemoryRole::User => ChatMessage::user(item.content.clone()),
                MemoryRole::Assistant => ChatMessage::assistant(item.content.clone()),
            });
        }
        messages.push(ChatMessage::user(user_message.clone()));

        let tool_index: HashMap<&str, &ToolEntry> =
            tool_set.iter().map(|e| (e.definition.name.as_str(), e)).collect();

        let mut rounds = 0;
        let final_assistant_message = loop {
            self.monitoring.chain(
                chain_id,
                call_id,
                ChainEventType::LlmCallStart,
                self.participant.guid(),
                self.participant.guid(),
                serde_json::json!({ "round": rounds }),
            );

            let turn = chat_with_retry(
                self.llm.as_ref(),
                &messages,
                &tool_defs,
                1,
                self.config.llm_retry_backoff_ms,
                self.config.llm_retry_multiplier,
            )
            .await;

            let turn = match turn {
                Ok(t) => t,
                Err(e) => {
                    let error = GenesisError::LlmError(e.to_string());
                    return TurnOutcome {
                        message: serde_json::json!({ "error": error.to_string() }),
                        status: Err(error),
                    };
                }
            };

            self.monitoring.chain(
                chain_id,
                call_id,
                ChainEventType::LlmCallComplete,
                self.participant.guid(),
                self.participant.guid(),
                serde_json::json!({ "round": rounds }),
            );

            match turn {
                LlmTurn::Final(message) => break message,
                LlmTurn::ToolCalls(calls) => {
                    rounds += 1;
                    messages.push(ChatMessage::assistant_with_tool_calls(calls.clone()));

                    let results = self.dispatch_tool_calls(request, &tool_index, calls).await;
                    for (tool_call_id, result) in results {
                        messages.push(ChatMessage::tool_result(tool_call_id, result));
                    }

                    if rounds >= self.config.tool_round_budget {
                        break ChatMessage::assistant(
                            "I was unable to finish within the allotted tool-call rounds.",
                        );
                    }
                }
            }
        };

        // Step 9: memory write, strictly user-then-assistant, after turn
        // completion; store failures are logged but never fail the turn.
        if let Err(e) = self.memory.store(MemoryItem { content: user_message, role: MemoryRole::User }).await {
            tracing::warn!(error = %e, "memory store failed for user message");
        }
        if let Err(e) = self
            .memory
            .store(MemoryItem { content: final_assistant_message.content.clone(), role: MemoryRole::Assistant })
            .await
        {
            tracing::warn!(error = %e, "memory store failed for assistant message");
        }

        self.monitoring.chain(
            chain_id,
            call_id,
            ChainEventType::AgentResponse,
            self.participant.guid(),
            request.target_service_guid.unwrap_or(self.participant.guid()),
            serde_json::json!({ "message": final_assistant_message.content }),
        );

        TurnOutcome {
            message: serde_json::json!({ "message": final_assistant_message.content }),
            status: Ok(()),
        }
    }

    /// §4.5 step 7: dispatch every tool call concurrently, looking each up
    /// in order external function → internal tool → agent tool. Errors
    /// become a tool message with status text; they never abort the turn.
    async fn dispatch_tool_calls(
        &self,
        request: &RpcRequest,
        tool_index: &HashMap<&str, &ToolEntry>,
        calls: Vec<ToolCallRequest>,
    ) -> Vec<(String, String)> {
        let futures = calls.into_iter().map(|call| {
            let entry = tool_index.get(call.name.as_str()).copied().cloned();
            let request = request.clone();
            async move {
                let id = call.id.clone();
                let outcome = self.dispatch_one_tool_call(&request, entry, &call).await;
                (id, outcome)
            }
        });
        futures::future::join_all(futures).await
    }

    async fn dispatch_one_tool_call(
        &self,
        request: &RpcRequest,
        entry: Option<ToolEntry>,
        call: &ToolCallRequest,
    ) -> String {
        let Some(entry) = entry else {
            return format!("error: unknown tool '{}'", call.name);
        };

        self.monitoring.chain(
            request.chain_id,
            request.call_id,
            ChainEventType::FunctionCallStart,
            self.participant.guid(),
            self.participant.guid(),
            serde_json::json!({ "tool": call.name }),
        );

        let result = match &entry.source {
            ToolSource::ExternalFunction { function_id } => {
                self.registry
                    .invoke(function_id, call.arguments.clone())
                    .await
                    .map(|v| v.to_string())
                    .map_err(|e| e.to_string())
            }
            ToolSource::Internal => match &self.internal_dispatch {
                Some(dispatch) => dispatch(call.name.clone(), call.arguments.clone())
                    .await
                    .map(|v| v.to_string()),
                None => Err(format!("agent has no internal tool dispatcher wired for '{}'", call.name)),
            },
            ToolSource::PeerAgent { service_name, target_agent_id } => {
                let message = serde_json::json!({
                    "message": call.arguments.get("message").cloned().unwrap_or_else(|| call.arguments.clone())
                });
                match crate::cycle::prepare_child_call(
                    request,
                    message,
                    self.participant.guid(),
                    *target_agent_id,
                    self.config.max_agent_depth,
                ) {
                    Ok(child_request) => {
                        self.monitoring.edge(
                            crate::monitoring::EdgeKind::AgentToAgent,
                            self.participant.guid(),
                            *target_agent_id,
                        );
                        let mut session =
                            genesis_rpc::RpcSession::new(self.participant.clone(), service_name.clone());
                        session
                            .send_child_request(child_request, self.config.rpc_request_timeout(), false)
                            .await
                            .map(|reply| reply.message.to_string())
                            .map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
        };

        self.monitoring.chain(
            request.chain_id,
            request.call_id,
            ChainEventType::FunctionCallComplete,
            self.participant.guid(),
            self.participant.guid(),
            serde_json::json!({ "tool": call.name }),
        );

        match result {
            Ok(value) => value,
            Err(message) => format!("error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::NoopClassifier;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use genesis_core::bus::LocalBus;
    use genesis_memory::InMemoryMemory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn chat(&self, _messages: &[ChatMessage], tools: &[ToolDefinition]) -> std::result::Result<LlmTurn, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 && !tools.is_empty() {
                Ok(LlmTurn::ToolCalls(vec![ToolCallRequest {
                    id: "call-1".to_string(),
                    name: tools[0].name.clone(),
                    arguments: serde_json::json!({"x": 127.0, "y": 384.0}),
                }]))
            } else {
                Ok(LlmTurn::Final(ChatMessage::assistant("the sum is 511")))
            }
        }
    }

    fn test_context(llm: Arc<dyn LlmClient>) -> OrchestrationContext {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        OrchestrationContext {
            registry: FunctionRegistry::new(participant.clone()),
            config: participant.config(),
            memory: Arc::new(InMemoryMemory::new()),
            llm,
            classifier: Arc::new(NoopClassifier),
            monitoring: MonitoringDecorator::null(),
            internal_tools: Vec::new(),
            internal_dispatch: None,
            peer_tool_cache: std::sync::Mutex::new(HashMap::new()),
            participant,
        }
    }

    #[tokio::test]
    async fn direct_chat_with_no_tools_returns_final_message() {
        let context = test_context(Arc::new(StubLlm { calls: AtomicUsize::new(1) }));
        let request = RpcRequest::new_root(serde_json::json!({"message": "hi"}));
        let outcome = context.run_turn(&request, "hi".to_string()).await;
        assert!(outcome.status.is_ok());
        assert_eq!(outcome.message["message"], "the sum is 511");
    }

    #[tokio::test]
    async fn tool_call_round_trip_computes_511() {
        let context = test_context(Arc::new(StubLlm { calls: AtomicUsize::new(0) }));
        context
            .registry
            .register_local(
                "add",
                "adds two numbers",
                serde_json::json!({"type": "object"}),
                vec![],
                Arc::new(|args: serde_json::Value| async move {
                    let x = args["x"].as_f64().unwrap_or(0.0);
                    let y = args["y"].as_f64().unwrap_or(0.0);
                    Ok(serde_json::json!({ "result": x + y }))
                }),
            )
            .await
            .unwrap();

        let request = RpcRequest::new_root(serde_json::json!({"message": "what is 127 + 384?"}));
        let outcome = context.run_turn(&request, "what is 127 + 384?".to_string()).await;
        assert!(outcome.status.is_ok());
        assert_eq!(outcome.message["message"], "the sum is 511");
    }

    #[tokio::test]
    async fn cycle_is_refused_before_any_llm_call() {
        let context = test_context(Arc::new(StubLlm { calls: AtomicUsize::new(0) }));
        let mut request = RpcRequest::new_root(serde_json::json!({"message": "hi"}));
        request.depth = 4;
        let outcome = context.run_turn(&request, "hi".to_string()).await;
        assert!(outcome.status.is_err());
        assert!(matches!(outcome.status.unwrap_err(), GenesisError::CycleDetected { .. }));
    }
}

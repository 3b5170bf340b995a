//! The external LLM call seam (§1 Non-goals: "implementing a language-model
//! engine" is out of scope; the trait boundary to one is not). Shapes
//! mirror `querymt::chat`'s types (`ChatRole`, `ChatMessage`,
//! `ToolCall`) closely enough that a real provider adapter is a thin
//! wrapper, without pulling the provider SDK itself into this crate.

use crate::tool::ToolDefinition;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Set on `ChatRole::Tool` messages: which call this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn assistant_with_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self { role: ChatRole::Assistant, content: String::new(), tool_calls, tool_call_id: None }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// The model's answer for one turn: either a final assistant message, or a
/// batch of tool calls to dispatch before the loop continues (§4.5 step 6).
#[derive(Debug, Clone)]
pub enum LlmTurn {
    Final(ChatMessage),
    ToolCalls(Vec<ToolCallRequest>),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM provider error: {0}")]
    Provider(String),
    #[error("LLM call rate limited, retry after {retry_after_secs:?}s: {message}")]
    RateLimited { message: String, retry_after_secs: Option<u64> },
}

/// Seam to an external LLM provider SDK. A real adapter wraps a concrete
/// provider client; genesis-agent itself only depends on this trait.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LlmTurn, LlmError>;
}

/// Exponential backoff with full jitter on rate-limit errors only; other
/// errors propagate immediately (§4.5 error semantics: "LLM call failure
/// after retries → reply with status ≠ 0"). When the provider gives an
/// explicit `retry_after_secs`, that wins over the computed backoff — it's
/// the provider's own instruction, not a guess to jitter away.
pub async fn chat_with_retry(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
    max_retries: u32,
    base_backoff_ms: u64,
    multiplier: f64,
) -> Result<LlmTurn, LlmError> {
    let mut attempt: u32 = 0;
    loop {
        match client.chat(messages, tools).await {
            Ok(turn) => return Ok(turn),
            Err(LlmError::RateLimited { message, retry_after_secs }) => {
                attempt += 1;
                if attempt > max_retries {
                    return Err(LlmError::RateLimited { message, retry_after_secs });
                }
                let wait_ms = match retry_after_secs {
                    Some(s) => s * 1000,
                    None => {
                        let ceiling = (base_backoff_ms as f64 * multiplier.powi(attempt as i32 - 1)) as u64;
                        rand::thread_rng().gen_range(0..=ceiling)
                    }
                };
                tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            }
            Err(other) => return Err(other),
        }
    }
}

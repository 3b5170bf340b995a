//! Runtime configuration, env-driven per spec §6.
//!
//! Grounded in `crates/agent/src/config.rs`: every tunable is
//! a `serde`-deserialized field with a `default_*` function rather than a
//! literal scattered through the orchestration code, so one place documents
//! every default named in the spec (k=8, MAX_AGENT_DEPTH=4, tool-call budget
//! 4 rounds, soft wall-clock budget 60s, reply drain window 1s).

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_domain_id() -> u32 {
    0
}

fn default_memory_k() -> usize {
    8
}

fn default_max_agent_depth() -> u32 {
    4
}

fn default_tool_round_budget() -> u32 {
    4
}

fn default_agent_soft_timeout_secs() -> u64 {
    60
}

fn default_reply_drain_window_ms() -> u64 {
    1_000
}

fn default_rpc_request_timeout_secs() -> u64 {
    30
}

fn default_classification_enabled() -> bool {
    false
}

fn default_classification_threshold() -> usize {
    12
}

fn default_llm_retry_backoff_ms() -> u64 {
    200
}

fn default_llm_retry_multiplier() -> f64 {
    2.0
}

/// Process-wide Genesis configuration. Constructed from environment
/// variables (`GENESIS_DOMAIN_ID`, ...) with a file-based override
/// available for tests, mirroring the "env + optional TOML"
/// layering in `AgentConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `GENESIS_DOMAIN_ID` — bus domain id.
    pub domain_id: u32,
    /// Default number of memory items retrieved per turn (§4.5 step 2).
    pub memory_k: usize,
    /// MAX_AGENT_DEPTH (§4.5 step 7).
    pub max_agent_depth: u32,
    /// Per-turn tool-call budget in rounds (§4.5 step 8).
    pub tool_round_budget: u32,
    /// Agent-side soft wall-clock budget before replying non-zero (§4.3).
    pub agent_soft_timeout_secs: u64,
    /// Reply drain quiet window after the first reply (§4.3 step 3).
    pub reply_drain_window_ms: u64,
    /// Interface-side RPC request timeout (§4.3).
    pub rpc_request_timeout_secs: u64,
    /// Whether the pre-classification stage (§4.5 step 4) is enabled.
    pub classification_enabled: bool,
    /// Function-count threshold above which classification kicks in, when enabled.
    pub classification_threshold: usize,
    pub llm_retry_backoff_ms: u64,
    pub llm_retry_multiplier: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain_id: default_domain_id(),
            memory_k: default_memory_k(),
            max_agent_depth: default_max_agent_depth(),
            tool_round_budget: default_tool_round_budget(),
            agent_soft_timeout_secs: default_agent_soft_timeout_secs(),
            reply_drain_window_ms: default_reply_drain_window_ms(),
            rpc_request_timeout_secs: default_rpc_request_timeout_secs(),
            classification_enabled: default_classification_enabled(),
            classification_threshold: default_classification_threshold(),
            llm_retry_backoff_ms: default_llm_retry_backoff_ms(),
            llm_retry_multiplier: default_llm_retry_multiplier(),
        }
    }
}

impl Config {
    /// Read `GENESIS_DOMAIN_ID` (default 0); every other tunable keeps its
    /// compiled-in default. Provider API keys (`OPENAI_API_KEY` and
    /// analogues) are read directly by LLM collaborators, not by this type.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("GENESIS_DOMAIN_ID") {
            if let Ok(id) = raw.parse() {
                cfg.domain_id = id;
            }
        }
        cfg
    }

    pub fn agent_soft_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_soft_timeout_secs)
    }

    pub fn reply_drain_window(&self) -> Duration {
        Duration::from_millis(self.reply_drain_window_ms)
    }

    pub fn rpc_request_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_request_timeout_secs)
    }
}

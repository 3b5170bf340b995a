//! §4.5 Agent Orchestration Loop and the four role façades that sit on top
//! of `genesis-core`/`genesis-rpc`/`genesis-registry`/`genesis-memory`.

// `#[genesis_tools]`-generated dispatch functions refer back into this
// crate as `::genesis_agent::internal_tool::...`; this lets them resolve
// from within the crate's own tests.
extern crate self as genesis_agent;

pub mod agent;
pub mod classifier;
pub mod cycle;
pub mod function_service;
pub mod interface;
pub mod internal_tool;
pub mod llm;
pub mod monitoring;
pub mod observer;
pub mod orchestration;
pub mod peer_tool;
pub mod tool;

pub use agent::Agent;
pub use classifier::{FunctionClassifier, NoopClassifier};
pub use function_service::FunctionService;
pub use interface::Interface;
pub use llm::{ChatMessage, ChatRole, LlmClient, LlmError, LlmTurn};
pub use monitoring::{EventSink, GraphEvent, MonitoringDecorator, NodeState};
pub use observer::{ChannelSink, Observer};
pub use orchestration::OrchestrationContext;
pub use tool::{ToolDefinition, ToolEntry, ToolSource};

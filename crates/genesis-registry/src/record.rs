//! §3 Function record.

use async_trait::async_trait;
use genesis_core::Guid;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A local callable backing a `FunctionRecord` with `impl_ref = Some(_)`.
#[async_trait]
pub trait LocalFunction: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value, String>;
}

#[async_trait]
impl<F, Fut> LocalFunction for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value, String>> + Send,
{
    async fn call(&self, args: Value) -> Result<Value, String> {
        (self)(args).await
    }
}

#[derive(Clone)]
pub struct FunctionRecord {
    /// Stable for the life of the provider process (§3 invariant); the
    /// canonical identifier in chain events.
    pub function_id: Guid,
    pub name: String,
    pub description: String,
    pub parameter_schema: Value,
    pub provider_id: Guid,
    pub capabilities: Vec<String>,
    pub operation_type: OperationType,
    /// Present only for locally hosted functions (§3).
    pub local_impl: Option<Arc<dyn LocalFunction>>,
    /// Remote functions route invocation through this RPC service name.
    pub service_name: Option<String>,
}

impl fmt::Debug for FunctionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRecord")
            .field("function_id", &self.function_id)
            .field("name", &self.name)
            .field("provider_id", &self.provider_id)
            .field("operation_type", &self.operation_type)
            .field("is_local", &self.local_impl.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Local,
    Remote,
}

impl FunctionRecord {
    pub fn is_local(&self) -> bool {
        self.local_impl.is_some()
    }
}

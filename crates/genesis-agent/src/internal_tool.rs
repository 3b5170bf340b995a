//! §4.7 Internal tool reflection: the runtime half of the `#[genesis_tools]`
//! / `#[tool(...)]` registration macro in `genesis-macros`.
//!
//! The macro emits, per annotated method, a free dispatch function and an
//! `inventory::submit!` of a [`ToolRegistrationFactory`]. This module
//! collects those at the agent's one-time reflection pass (§4.7: "the
//! generated schema is cached once per class lifetime") into an
//! [`InternalToolCache`] keyed by the hosting type's [`TypeId`], so an
//! agent instance only ever sees the registrations that belong to its own
//! concrete type.

use schemars::{schema_for as schemars_schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
pub use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use inventory;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

pub fn to_value<T: Serialize>(value: T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

pub fn schema_for<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars_schema_for!(T)).unwrap_or(Value::Null)
}

/// One method's worth of registration data, produced by the macro.
#[derive(Clone, Copy)]
pub struct ToolRegistration {
    pub type_id: fn() -> TypeId,
    pub tool_name: &'static str,
    pub description: &'static str,
    pub parameter_schema: fn() -> Value,
    pub dispatch: for<'a> fn(&'a dyn Any, Value) -> BoxFuture<'a, Result<Value, String>>,
}

/// `inventory`-collected wrapper: `inventory::submit!` needs a concrete
/// type to register, so the macro submits a thin newtype over the factory
/// function pointer rather than the (non-`'static`-friendly) registration
/// itself.
pub struct ToolRegistrationFactory(pub fn() -> ToolRegistration);

inventory::collect!(ToolRegistrationFactory);

/// One fully reflected internal tool record (§3: "Internal tool record").
#[derive(Clone)]
pub struct InternalToolRecord {
    pub tool_name: String,
    pub parameter_schema: Value,
    pub description: String,
    registration: ToolRegistration,
}

impl InternalToolRecord {
    pub async fn call(&self, instance: &dyn Any, args: Value) -> Result<Value, String> {
        (self.registration.dispatch)(instance, args).await
    }
}

/// Per-agent-type cache of reflected internal tools, built once and reused
/// for the lifetime of the process (§4.7: "cached once per class
/// lifetime").
pub struct InternalToolCache {
    records: Vec<InternalToolRecord>,
}

impl InternalToolCache {
    /// Reflect all `#[tool(...)]`-annotated methods registered for `T`.
    pub fn for_type<T: 'static>() -> Self {
        let target = TypeId::of::<T>();
        let records = inventory::iter::<ToolRegistrationFactory>()
            .map(|factory| (factory.0)())
            .filter(|reg| (reg.type_id)() == target)
            .map(|reg| InternalToolRecord {
                tool_name: reg.tool_name.to_string(),
                parameter_schema: (reg.parameter_schema)(),
                description: reg.description.to_string(),
                registration: reg,
            })
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[InternalToolRecord] {
        &self.records
    }

    pub fn find(&self, tool_name: &str) -> Option<&InternalToolRecord> {
        self.records.iter().find(|r| r.tool_name == tool_name)
    }
}

/// A name-indexed internal tool call bound to one concrete agent instance,
/// suitable for storing in a type-erased orchestration context (§4.5 step
/// 7: internal tools are looked up by name alongside external functions and
/// peer-agent tools).
pub type StaticDispatch =
    Arc<dyn Fn(String, Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// Bind `cache` to one concrete `instance`, producing a dispatcher whose
/// calls no longer need to know `T` — the returned closure owns its own
/// clone of `instance` per invocation, so the resulting future is `'static`
/// even though the underlying dispatch function borrows `&dyn Any`.
pub fn make_dispatcher<T: Send + Sync + 'static>(
    instance: Arc<T>,
    cache: Arc<InternalToolCache>,
) -> StaticDispatch {
    Arc::new(move |tool_name: String, args: Value| {
        let instance = instance.clone();
        let cache = cache.clone();
        Box::pin(async move {
            let record = cache
                .find(&tool_name)
                .ok_or_else(|| format!("unknown internal tool '{tool_name}'"))?
                .clone();
            record.call(instance.as_ref() as &dyn Any, args).await
        })
    })
}

/// Process-wide cache of `InternalToolCache`s keyed by `TypeId`, so
/// multiple agent instances of the same concrete type share one reflection
/// pass.
#[derive(Default)]
pub struct InternalToolCacheRegistry {
    caches: once_cell::sync::OnceCell<std::sync::Mutex<HashMap<TypeId, Arc<InternalToolCache>>>>,
}

impl InternalToolCacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build<T: 'static>(&self) -> Arc<InternalToolCache> {
        let mutex = self
            .caches
            .get_or_init(|| std::sync::Mutex::new(HashMap::new()));
        let mut guard = mutex.lock().expect("internal tool cache mutex poisoned");
        guard
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(InternalToolCache::for_type::<T>()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_macros::genesis_tools;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    struct Greeter;

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct GreetArgs {
        name: String,
    }

    #[genesis_tools]
    impl Greeter {
        #[tool(description = "Greets someone by name")]
        async fn greet(&self, args: GreetArgs) -> Result<Value, String> {
            Ok(Value::String(format!("hello, {}", args.name)))
        }
    }

    #[tokio::test]
    async fn reflection_finds_annotated_method_and_can_call_it() {
        let cache = InternalToolCache::for_type::<Greeter>();
        let record = cache.find("greet").expect("greet should be registered");
        assert_eq!(record.description, "Greets someone by name");
        assert!(record.parameter_schema["properties"]["name"].is_object());

        let instance = Greeter;
        let result = record
            .call(&instance as &dyn Any, serde_json::json!({"name": "Ada"}))
            .await
            .unwrap();
        assert_eq!(result, Value::String("hello, Ada".to_string()));
    }

    #[test]
    fn unrelated_types_do_not_see_each_others_tools() {
        struct Other;
        let cache = InternalToolCache::for_type::<Other>();
        assert!(cache.find("greet").is_none());
    }
}

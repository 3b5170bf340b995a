//! §4.4 Function Registry: the in-process catalog mixing locally
//! registered functions and functions discovered over the advertisement
//! bus.

use crate::error::{RegistryError, Result};
use crate::record::{FunctionRecord, LocalFunction, OperationType};
use genesis_core::advertisement::{Advertisement, AdvertisementEvent, Kind};
use genesis_core::{Guid, Participant};
use genesis_rpc::{RpcSession, RpcRequest};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub type DiscoveryCallback = Arc<dyn Fn(&FunctionRecord) + Send + Sync>;

struct Inner {
    records: HashMap<Guid, FunctionRecord>,
    callbacks: Vec<DiscoveryCallback>,
}

/// The registry is internally synchronized (§5) via a `parking_lot::RwLock`;
/// `list()` clones out an immutable snapshot rather than exposing the lock.
#[derive(Clone)]
pub struct FunctionRegistry {
    participant: Participant,
    inner: Arc<RwLock<Inner>>,
}

impl FunctionRegistry {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            inner: Arc::new(RwLock::new(Inner {
                records: HashMap::new(),
                callbacks: Vec::new(),
            })),
        }
    }

    /// Register a locally hosted function, publish its FUNCTION
    /// advertisement, and return its freshly minted stable `function_id`.
    pub async fn register_local(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: Value,
        capabilities: Vec<String>,
        callable: Arc<dyn LocalFunction>,
    ) -> genesis_core::Result<Guid> {
        let function_id = Guid::new();
        let name = name.into();
        let record = FunctionRecord {
            function_id,
            name: name.clone(),
            description: description.into(),
            parameter_schema: parameter_schema.clone(),
            provider_id: self.participant.guid(),
            capabilities: capabilities.clone(),
            operation_type: OperationType::Local,
            local_impl: Some(callable),
            service_name: None,
        };
        self.insert(record.clone());

        let advertisement = Advertisement {
            advertisement_id: function_id.to_string(),
            kind: Kind::Function,
            name,
            service_name: String::new(),
            provider_id: self.participant.guid(),
            schema_json: parameter_schema,
            capabilities,
            classification_tags: vec![],
            specializations: vec![],
            timestamp: time::OffsetDateTime::now_utc(),
        };
        self.participant.bus().publish(advertisement).await?;
        Ok(function_id)
    }

    /// Register a record discovered as a remote FUNCTION advertisement,
    /// routed for invocation through `service_name`.
    pub fn register_remote(&self, advertisement: &Advertisement, service_name: String) {
        let function_id = match advertisement.advertisement_id.parse::<uuid::Uuid>() {
            Ok(u) => Guid::from(u),
            Err(_) => return,
        };
        let record = FunctionRecord {
            function_id,
            name: advertisement.name.clone(),
            description: String::new(),
            parameter_schema: advertisement.schema_json.clone(),
            provider_id: advertisement.provider_id,
            capabilities: advertisement.capabilities.clone(),
            operation_type: OperationType::Remote,
            local_impl: None,
            service_name: Some(service_name),
        };
        self.insert(record);
    }

    pub fn remove(&self, function_id: &Guid) {
        self.inner.write().records.remove(function_id);
    }

    /// Apply one advertisement-bus event for FUNCTION-kind advertisements,
    /// wiring discovery/removal and firing discovery callbacks
    /// asynchronously relative to the bus (§4.4).
    pub fn apply_bus_event(&self, event: AdvertisementEvent, service_name_hint: &str) {
        match event {
            AdvertisementEvent::Alive(ad) if matches!(ad.kind, Kind::Function) => {
                self.register_remote(&ad, service_name_hint.to_string());
            }
            AdvertisementEvent::Departed { advertisement_id, .. } => {
                if let Ok(u) = advertisement_id.parse::<uuid::Uuid>() {
                    self.remove(&Guid::from(u));
                }
            }
            _ => {}
        }
    }

    fn insert(&self, record: FunctionRecord) {
        let mut inner = self.inner.write();
        inner.records.insert(record.function_id, record.clone());
        for cb in inner.callbacks.clone() {
            cb(&record);
        }
    }

    pub fn add_discovery_callback(&self, cb: DiscoveryCallback) {
        self.inner.write().callbacks.push(cb);
    }

    pub fn remove_discovery_callback_all(&self) {
        self.inner.write().callbacks.clear();
    }

    /// All currently-ALIVE records (local + remote), de-duplicated by
    /// `function_id`, as an immutable snapshot.
    pub fn list(&self) -> Vec<FunctionRecord> {
        self.inner.read().records.values().cloned().collect()
    }

    pub fn lookup(&self, function_id: &Guid) -> Option<FunctionRecord> {
        self.inner.read().records.get(function_id).cloned()
    }

    pub fn lookup_by_name(&self, name: &str) -> Vec<FunctionRecord> {
        self.inner
            .read()
            .records
            .values()
            .filter(|r| r.name == name)
            .cloned()
            .collect()
    }

    /// Invoke a function by id: local functions are called directly;
    /// remote functions route through an RPC request over the owning
    /// service.
    pub async fn invoke(&self, function_id: &Guid, args: Value) -> Result<Value> {
        let record = self
            .lookup(function_id)
            .ok_or(RegistryError::UnknownFunctionId(*function_id))?;

        if let Some(callable) = &record.local_impl {
            return callable
                .call(args)
                .await
                .map_err(|message| RegistryError::LocalCallFailed {
                    name: record.name.clone(),
                    message,
                });
        }

        let service_name = record
            .service_name
            .clone()
            .ok_or_else(|| RegistryError::NoRemoteService {
                name: record.name.clone(),
            })?;

        let mut session = RpcSession::new(self.participant.clone(), service_name);
        let request_message = serde_json::json!({ "function": record.name, "args": args });
        let reply = session
            .send_request(request_message, Duration::from_secs(30), false)
            .await
            .map_err(|e| RegistryError::RemoteCallFailed {
                name: record.name.clone(),
                message: e.to_string(),
            })?;

        if !reply.status.is_success() {
            return Err(RegistryError::RemoteCallFailed {
                name: record.name.clone(),
                message: reply.message.to_string(),
            });
        }
        Ok(reply.message)
    }

    /// Build the `RpcRequest` that a would-be caller could inspect before
    /// sending — exposed for callers (e.g. the orchestration loop) that
    /// want to thread ancestry/`chain_id` through a remote function call.
    pub fn remote_request_for(&self, name: &str, args: Value) -> RpcRequest {
        RpcRequest::new_root(serde_json::json!({ "function": name, "args": args }))
    }
}

//! §3 Participant: owns one bus connection, a participant GUID, and all
//! topics/readers/writers. A participant may host multiple role-instances
//! (interface, agent, service) in one process.

use crate::advertisement::AdvertisementBus;
use crate::config::Config;
use crate::guid::Guid;
use crate::qos::QosLibrary;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

/// Process-local registry keyed by `(participant, topic_name)`, so
/// co-hosted roles sharing one `Participant` share one topic object per
/// name rather than creating duplicates — DDS-like buses forbid duplicate
/// topics per participant (spec §9 design note).
#[derive(Default)]
pub struct TopicRegistry {
    topics: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing topic object for `name`, or constructs and
    /// registers one via `make` if absent.
    pub fn get_or_create<T: Send + Sync + 'static>(
        &self,
        name: &str,
        make: impl FnOnce() -> Arc<T>,
    ) -> Arc<T> {
        if let Some(existing) = self.topics.get(name) {
            if let Ok(typed) = Arc::downcast::<T>(existing.value().clone()) {
                return typed;
            }
        }
        let created = make();
        self.topics
            .insert(name.to_string(), created.clone() as Arc<dyn Any + Send + Sync>);
        created
    }
}

/// A single bus connection shared by every role-instance hosted in this
/// process: the participant GUID, the advertisement bus handle, the QoS
/// library, and the process-local topic registry.
#[derive(Clone)]
pub struct Participant {
    guid: Guid,
    bus: Arc<dyn AdvertisementBus>,
    config: Arc<Config>,
    qos: Arc<QosLibrary>,
    topics: Arc<TopicRegistry>,
}

impl Participant {
    pub fn new(bus: Arc<dyn AdvertisementBus>, config: Config, qos: QosLibrary) -> Self {
        Self {
            guid: Guid::new(),
            bus,
            config: Arc::new(config),
            qos: Arc::new(qos),
            topics: Arc::new(TopicRegistry::new()),
        }
    }

    /// Construct with process defaults: a fresh `LocalBus`, env-derived
    /// config, and built-in QoS profiles. Convenient for tests and
    /// single-process topologies; production wiring would pass a real bus
    /// binding and a QoS library loaded from file instead.
    pub fn local(bus: Arc<dyn AdvertisementBus>) -> Self {
        Self::new(bus, Config::from_env(), QosLibrary::with_builtin_defaults())
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn bus(&self) -> Arc<dyn AdvertisementBus> {
        self.bus.clone()
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn qos(&self) -> Arc<QosLibrary> {
        self.qos.clone()
    }

    pub fn topics(&self) -> Arc<TopicRegistry> {
        self.topics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LocalBus;

    #[test]
    fn co_hosted_roles_share_one_topic_object() {
        let p = Participant::local(Arc::new(LocalBus::new()));
        let a = p.topics().get_or_create("rpc/Math_Request", || Arc::new(42u32));
        let b = p.topics().get_or_create("rpc/Math_Request", || Arc::new(99u32));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, 42);
    }

    #[test]
    fn each_participant_gets_a_distinct_guid() {
        let p1 = Participant::local(Arc::new(LocalBus::new()));
        let p2 = Participant::local(Arc::new(LocalBus::new()));
        assert_ne!(p1.guid(), p2.guid());
    }
}

//! §4.2 Discovery cache & departure.
//!
//! Each role maintains an in-memory `advertisement_id -> Advertisement`
//! mapping, upserted on ALIVE and removed on departure, with callbacks fired
//! in delivery order. Per §5, the cache is owned and mutated only by the
//! role's cooperative scheduler task — this type is therefore `!Sync` by
//! convention (used from a single task) even though nothing enforces that
//! at the type level; callers are the role actors in `genesis-agent`.

use crate::advertisement::{Advertisement, AdvertisementBus, AdvertisementEvent, Kind};
use std::collections::HashMap;
use std::sync::Arc;

pub type DiscoveryCallback = Arc<dyn Fn(&Advertisement) + Send + Sync>;
pub type DepartureCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// In-memory cache reflecting only ALIVE instances (§4.2 invariant); stale
/// entries are never served to tool-selection.
pub struct DiscoveryCache {
    records: HashMap<String, Advertisement>,
    on_discover: Vec<DiscoveryCallback>,
    on_depart: Vec<DepartureCallback>,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            on_discover: Vec::new(),
            on_depart: Vec::new(),
        }
    }

    pub fn add_discovery_callback(&mut self, cb: DiscoveryCallback) {
        self.on_discover.push(cb);
    }

    pub fn add_departure_callback(&mut self, cb: DepartureCallback) {
        self.on_depart.push(cb);
    }

    /// Apply one bus event, firing callbacks in order. A departure for `id`
    /// delivered after an ALIVE for the same `id` fires discover-then-depart
    /// in that order, since each call to `apply` handles exactly one event.
    /// A re-publication identical to the cached record (spec §8 idempotence
    /// law) updates the record but does not fire a second discover callback.
    pub fn apply(&mut self, event: AdvertisementEvent) {
        match event {
            AdvertisementEvent::Alive(ad) => {
                let is_duplicate = self
                    .records
                    .get(&ad.advertisement_id)
                    .is_some_and(|existing| existing.same_content(&ad));
                self.records.insert(ad.advertisement_id.clone(), ad.clone());
                if !is_duplicate {
                    for cb in &self.on_discover {
                        cb(&ad);
                    }
                }
            }
            AdvertisementEvent::Departed { advertisement_id, .. } => {
                if self.records.remove(&advertisement_id).is_some() {
                    for cb in &self.on_depart {
                        cb(&advertisement_id);
                    }
                }
            }
        }
    }

    pub fn get(&self, advertisement_id: &str) -> Option<&Advertisement> {
        self.records.get(advertisement_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Advertisement> {
        self.records.values()
    }

    pub fn by_kind(&self, kind: Kind) -> impl Iterator<Item = &Advertisement> {
        self.records
            .values()
            .filter(move |a| a.kind as u8 == kind as u8)
    }

    pub fn by_service_name<'a>(&'a self, service_name: &'a str) -> impl Iterator<Item = &'a Advertisement> {
        self.records
            .values()
            .filter(move |a| a.service_name == service_name)
    }
}

impl Default for DiscoveryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain a bus subscription's current backlog into a cache synchronously.
/// Used at startup to seed a cache from `BusSubscription::initial` before
/// the owning task starts consuming the live event stream.
pub fn seed_from_initial(cache: &mut DiscoveryCache, initial: Vec<Advertisement>) {
    for ad in initial {
        cache.apply(AdvertisementEvent::Alive(ad));
    }
}

/// Spawn a task draining `bus`'s subscription for `filter` into `cache`
/// forever, returning the join handle. Exists mainly for production wiring;
/// tests usually drive `DiscoveryCache::apply` directly for determinism.
pub fn spawn_cache_pump(
    bus: Arc<dyn AdvertisementBus>,
    filter: Option<Kind>,
    mut apply: impl FnMut(AdvertisementEvent) + Send + 'static,
) -> tokio::task::JoinHandle<()> {
    let mut sub = bus.subscribe(filter);
    for ad in sub.initial.drain(..) {
        apply(AdvertisementEvent::Alive(ad));
    }
    tokio::spawn(async move {
        while let Some(event) = sub.events.recv().await {
            apply(event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::Guid;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::OffsetDateTime;

    fn ad(id: &str) -> Advertisement {
        Advertisement {
            advertisement_id: id.to_string(),
            kind: Kind::Agent,
            name: id.to_string(),
            service_name: "svc".to_string(),
            provider_id: Guid::new(),
            schema_json: json!({}),
            capabilities: vec![],
            classification_tags: vec![],
            specializations: vec![],
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn alive_then_departed_fires_both_in_order() {
        let mut cache = DiscoveryCache::new();
        let discovered = Arc::new(AtomicUsize::new(0));
        let departed = Arc::new(AtomicUsize::new(0));

        let d2 = discovered.clone();
        cache.add_discovery_callback(Arc::new(move |_| {
            d2.fetch_add(1, Ordering::SeqCst);
        }));
        let p2 = departed.clone();
        cache.add_departure_callback(Arc::new(move |_| {
            p2.fetch_add(1, Ordering::SeqCst);
        }));

        cache.apply(AdvertisementEvent::Alive(ad("x")));
        assert_eq!(discovered.load(Ordering::SeqCst), 1);
        assert_eq!(departed.load(Ordering::SeqCst), 0);
        assert!(cache.get("x").is_some());

        cache.apply(AdvertisementEvent::Departed {
            advertisement_id: "x".to_string(),
            state: crate::advertisement::InstanceState::NotAliveDisposed,
        });
        assert_eq!(departed.load(Ordering::SeqCst), 1);
        assert!(cache.get("x").is_none());
    }

    #[test]
    fn identical_republication_does_not_refire_discover() {
        let mut cache = DiscoveryCache::new();
        let discovered = Arc::new(AtomicUsize::new(0));
        let d2 = discovered.clone();
        cache.add_discovery_callback(Arc::new(move |_| {
            d2.fetch_add(1, Ordering::SeqCst);
        }));

        cache.apply(AdvertisementEvent::Alive(ad("x")));
        cache.apply(AdvertisementEvent::Alive(ad("x")));
        assert_eq!(discovered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn departure_of_unknown_id_is_noop() {
        let mut cache = DiscoveryCache::new();
        let departed = Arc::new(AtomicUsize::new(0));
        let p2 = departed.clone();
        cache.add_departure_callback(Arc::new(move |_| {
            p2.fetch_add(1, Ordering::SeqCst);
        }));
        cache.apply(AdvertisementEvent::Departed {
            advertisement_id: "ghost".to_string(),
            state: crate::advertisement::InstanceState::NotAliveNoWriters,
        });
        assert_eq!(departed.load(Ordering::SeqCst), 0);
    }
}

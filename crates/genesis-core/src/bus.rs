//! `LocalBus`: an in-process `AdvertisementBus`.
//!
//! spec.md treats the wire transport as an external collaborator ("a
//! structured pub/sub transport ... is assumed", §1 non-goals); no concrete
//! DDS/Zenoh/NATS binding is implemented here. This is the seam such a
//! binding would fill, and the implementation used by every role in a
//! single-process or test topology.
//!
//! Grounded on `EventFanout` (`crates/agent/src/event_fanout.rs`): a
//! broadcast channel delivers live events to subscribers, with a
//! `dashmap`-backed durable cache standing in for transient-local catch-up.

use crate::advertisement::{Advertisement, AdvertisementBus, AdvertisementEvent, BusSubscription, InstanceState, Kind};
use crate::error::{GenesisError, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Cache depth floor mandated by spec §4.1: "no samples are silently
/// dropped while within cache depth (≥500)".
pub const MIN_CACHE_DEPTH: usize = 500;

const FANOUT_BUFFER: usize = 1024;

struct Inner {
    cache: DashMap<String, Advertisement>,
    sender: broadcast::Sender<AdvertisementEvent>,
}

/// Shared, cloneable handle to a single in-process advertisement bus.
#[derive(Clone)]
pub struct LocalBus {
    inner: Arc<Inner>,
}

impl LocalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FANOUT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                cache: DashMap::new(),
                sender,
            }),
        }
    }

    /// Current live set, independent of any filter — used by RPC broadcast
    /// tie-breaking (§4.3) which needs the full ALIVE roster for a service.
    pub fn live_snapshot(&self) -> Vec<Advertisement> {
        self.inner
            .cache
            .iter()
            .map(|e| e.value().clone())
            .collect()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AdvertisementBus for LocalBus {
    async fn publish(&self, advertisement: Advertisement) -> Result<()> {
        tracing::debug!(
            advertisement_id = %advertisement.advertisement_id,
            kind = ?advertisement.kind,
            "publishing advertisement"
        );
        let is_duplicate = self
            .inner
            .cache
            .get(&advertisement.advertisement_id)
            .is_some_and(|existing| existing.same_content(&advertisement));
        self.inner
            .cache
            .insert(advertisement.advertisement_id.clone(), advertisement.clone());
        if is_duplicate {
            // Idempotence law (spec §8): identical re-publication is a
            // no-op for subscribers, not a second discovery callback.
            return Ok(());
        }
        // No receivers is not an error: a fresh bus with no subscribers yet
        // is the common case at startup.
        let _ = self.inner.sender.send(AdvertisementEvent::Alive(advertisement));
        Ok(())
    }

    async fn dispose(&self, advertisement_id: &str) -> Result<()> {
        if self.inner.cache.remove(advertisement_id).is_none() {
            return Err(GenesisError::BusUnavailable(format!(
                "dispose of unknown advertisement_id '{advertisement_id}'"
            )));
        }
        let _ = self.inner.sender.send(AdvertisementEvent::Departed {
            advertisement_id: advertisement_id.to_string(),
            state: InstanceState::NotAliveDisposed,
        });
        Ok(())
    }

    fn subscribe(&self, filter: Option<Kind>) -> BusSubscription {
        let initial: Vec<Advertisement> = self
            .inner
            .cache
            .iter()
            .map(|e| e.value().clone())
            .filter(|a| matches_filter(a.kind, filter))
            .collect();

        let mut rx = self.inner.sender.subscribe();
        let (tx, forwarded) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let passes = match &event {
                            AdvertisementEvent::Alive(a) => matches_filter(a.kind, filter),
                            // Departures are always forwarded: a subscriber that
                            // never saw the ALIVE (because it joined after and
                            // filtered it out) simply no-ops on an unknown id,
                            // but one that did see it must get the departure.
                            AdvertisementEvent::Departed { .. } => true,
                        };
                        if passes && tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Cache depth (≥500) bounds how far behind a subscriber
                        // may fall before this can happen; log and keep going.
                        tracing::warn!("advertisement bus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        BusSubscription {
            initial,
            events: forwarded,
        }
    }
}

fn matches_filter(kind: Kind, filter: Option<Kind>) -> bool {
    match filter {
        None => true,
        Some(f) => f as u8 == kind as u8,
    }
}

//! §3 Advertisement record and §4.1 Advertisement Bus contract.

use crate::guid::Guid;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// `kind` discriminant, wire values per spec §6's content-filter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Kind {
    Agent = 1,
    Service = 2,
    Function = 3,
}

/// A durable record announcing one hosted capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertisement {
    pub advertisement_id: String,
    pub kind: Kind,
    pub name: String,
    pub service_name: String,
    pub provider_id: Guid,
    pub schema_json: Value,
    pub capabilities: Vec<String>,
    pub classification_tags: Vec<String>,
    pub specializations: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Advertisement {
    /// Whether `self` and `other` describe the same capability offering,
    /// ignoring `timestamp` (which every re-publication bumps even when
    /// nothing else changed). Used to detect a no-op re-publication (spec
    /// §8 idempotence law: "publishing the same advertisement_id twice with
    /// identical attributes is observationally equivalent to a single
    /// publication").
    pub fn same_content(&self, other: &Advertisement) -> bool {
        self.advertisement_id == other.advertisement_id
            && self.kind as u8 == other.kind as u8
            && self.name == other.name
            && self.service_name == other.service_name
            && self.provider_id == other.provider_id
            && self.schema_json == other.schema_json
            && self.capabilities == other.capabilities
            && self.classification_tags == other.classification_tags
            && self.specializations == other.specializations
    }
}

/// Liveness state of one `advertisement_id` as observed by a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Alive,
    NotAliveDisposed,
    NotAliveNoWriters,
}

/// An event delivered to a bus subscriber: either an (re-)publication or a
/// departure for a given `advertisement_id`.
#[derive(Debug, Clone)]
pub enum AdvertisementEvent {
    Alive(Advertisement),
    Departed {
        advertisement_id: String,
        state: InstanceState,
    },
}

/// Contract of §4.1: publish/dispose an advertisement, subscribe with a
/// server-side `kind` filter. Implementers must push the filter to the
/// transport rather than post-filter in application code — `subscribe`
/// therefore takes the filter as a parameter of the call, not a
/// post-processing step by the caller.
#[async_trait::async_trait]
pub trait AdvertisementBus: Send + Sync {
    /// Idempotent per `advertisement_id`; re-publishing updates the
    /// instance and is observationally equivalent to a single publication
    /// to every subscriber already caught up (spec §8 idempotence law).
    async fn publish(&self, advertisement: Advertisement) -> crate::error::Result<()>;

    /// Marks the instance NOT_ALIVE_DISPOSED; subscribers must treat this
    /// as departure.
    async fn dispose(&self, advertisement_id: &str) -> crate::error::Result<()>;

    /// Subscribe with a server-side content filter on `kind`. Returns the
    /// current live set matching the filter (transient-local catch-up)
    /// followed by a stream of subsequent events.
    fn subscribe(&self, filter: Option<Kind>) -> BusSubscription;
}

/// A subscription handle: the initial live snapshot plus a receiver for
/// subsequent alive/departed events, matching the filter given to
/// `subscribe`.
pub struct BusSubscription {
    pub initial: Vec<Advertisement>,
    pub events: tokio::sync::mpsc::UnboundedReceiver<AdvertisementEvent>,
}

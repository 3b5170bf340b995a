//! Roster lookup needed for broadcast tie-breaking (§4.3): each replying
//! candidate must independently compute its rank among currently-ALIVE
//! agents offering the same `service_name`. Kept as a trait so `genesis-rpc`
//! does not depend on the discovery-cache implementation in `genesis-core`
//! / `genesis-agent`; the agent wires its own cache in as the source.

use genesis_core::Guid;
use time::OffsetDateTime;

pub trait RosterSource: Send + Sync {
    /// All currently-ALIVE `(provider_guid, advertisement_timestamp)` pairs
    /// for agents offering `service_name`.
    fn roster(&self, service_name: &str) -> Vec<(Guid, OffsetDateTime)>;
}

/// Deterministic tie-break: lexicographic ascending on
/// `(provider_guid, advertisement_timestamp)`; rank 0 is the winner.
/// Implemented independently by each candidate (§4.3) — no coordinator.
pub fn rank_of(mut roster: Vec<(Guid, OffsetDateTime)>, me: Guid) -> Option<usize> {
    roster.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    roster.iter().position(|(guid, _)| *guid == me)
}

//! §2 Observer role façade: a passive subscriber over the monitoring event
//! stream and the advertisement bus. Never sits on the critical path of any
//! request — it only watches.

use crate::monitoring::{EventSink, GraphEvent, NodeState};
use genesis_core::advertisement::{AdvertisementEvent, Kind};
use genesis_core::{Guid, Participant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// An [`EventSink`] that forwards every [`GraphEvent`] onto an unbounded
/// channel. `emit` never awaits and never blocks its caller; a slow or
/// absent consumer only grows the channel's backlog, not the critical
/// path's latency.
pub struct ChannelSink {
    sender: UnboundedSender<GraphEvent>,
}

impl EventSink for ChannelSink {
    fn emit(&self, event: GraphEvent) {
        // An observer that stopped listening just drops events on the floor.
        let _ = self.sender.send(event);
    }
}

/// Subscribes to the advertisement bus and the monitoring event stream to
/// build a live picture of the mesh for a graph UI or similar tooling.
/// Holds no state needed by any other role — removing an `Observer`
/// changes nothing about request handling.
pub struct Observer {
    participant: Participant,
    events: UnboundedReceiver<GraphEvent>,
}

impl Observer {
    /// Create an observer and the sink it should be wired into every
    /// role's [`crate::monitoring::MonitoringDecorator`].
    pub fn new(participant: Participant) -> (Self, ChannelSink) {
        let (sender, events) = unbounded_channel();
        (Self { participant, events }, ChannelSink { sender })
    }

    /// Next monitoring event, or `None` once every sink handle has been
    /// dropped.
    pub async fn next_event(&mut self) -> Option<GraphEvent> {
        self.events.recv().await
    }

    /// Snapshot of currently-ALIVE agents from the advertisement bus,
    /// independent of the monitoring stream — useful for an observer that
    /// starts after agents have already announced.
    pub fn known_agents(&self) -> Vec<Guid> {
        let subscription = self.participant.bus().subscribe(Some(Kind::Agent));
        subscription.initial.into_iter().map(|ad| ad.provider_id).collect()
    }

    /// Derive a best-effort [`NodeState`] transition from a raw bus event,
    /// for an observer that wants liveness without wiring monitoring into
    /// every role.
    pub fn node_state_for(event: &AdvertisementEvent) -> Option<(Guid, NodeState)> {
        match event {
            AdvertisementEvent::Alive(ad) if matches!(ad.kind, Kind::Agent) => {
                Some((ad.provider_id, NodeState::Ready))
            }
            AdvertisementEvent::Alive(_) => None,
            AdvertisementEvent::Departed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{EdgeKind, MonitoringDecorator};
    use genesis_core::advertisement::Advertisement;
    use genesis_core::bus::LocalBus;
    use serde_json::json;
    use std::sync::Arc;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn observer_receives_edges_emitted_through_its_sink() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let (mut observer, sink) = Observer::new(participant);
        let decorator = MonitoringDecorator::new(Arc::new(sink));

        let a = Guid::new();
        let b = Guid::new();
        decorator.edge(EdgeKind::AgentToAgent, a, b);

        let event = observer.next_event().await.expect("sink is still alive");
        match event {
            GraphEvent::Edge(e) => {
                assert_eq!(e.source_id, a);
                assert_eq!(e.target_id, b);
            }
            _ => panic!("expected an edge event"),
        }
    }

    #[test]
    fn node_state_ignores_non_agent_advertisements() {
        let function_ad = Advertisement {
            advertisement_id: "f1".to_string(),
            kind: Kind::Function,
            name: "add".to_string(),
            service_name: "Math".to_string(),
            provider_id: Guid::new(),
            schema_json: json!({}),
            capabilities: vec![],
            classification_tags: vec![],
            specializations: vec![],
            timestamp: OffsetDateTime::now_utc(),
        };
        assert!(Observer::node_state_for(&AdvertisementEvent::Alive(function_ad)).is_none());
    }

    #[test]
    fn node_state_reports_ready_for_agent_advertisements() {
        let agent_ad = Advertisement {
            advertisement_id: "a1".to_string(),
            kind: Kind::Agent,
            name: "Primary".to_string(),
            service_name: "Primary".to_string(),
            provider_id: Guid::new(),
            schema_json: json!({}),
            capabilities: vec![],
            classification_tags: vec![],
            specializations: vec![],
            timestamp: OffsetDateTime::now_utc(),
        };
        let provider_id = agent_ad.provider_id;
        let (guid, state) =
            Observer::node_state_for(&AdvertisementEvent::Alive(agent_ad)).expect("agent advertisement");
        assert_eq!(guid, provider_id);
        assert_eq!(state, NodeState::Ready);
    }
}

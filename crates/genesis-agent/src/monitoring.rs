//! §4.8 Monitoring Scaffolding: an orthogonal decorator layer emitting two
//! unified event kinds on a single event stream. All writes are best-effort
//! and never block the critical path (§9 design note: composition over the
//! original's two-tier inheritance).

use genesis_core::Guid;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Discovering,
    Ready,
    Busy,
    Degraded,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    InterfaceToAgent,
    AgentToService,
    AgentToAgent,
    ServiceToFunction,
}

#[derive(Debug, Clone)]
pub struct NodeEvent {
    pub participant_id: Guid,
    pub state: NodeState,
}

#[derive(Debug, Clone)]
pub struct EdgeEvent {
    pub kind: EdgeKind,
    pub source_id: Guid,
    pub target_id: Guid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEventType {
    InterfaceRequestStart,
    AgentRequestStart,
    FunctionCallStart,
    FunctionCallComplete,
    LlmCallStart,
    LlmCallComplete,
    ClassificationResult,
    AgentResponse,
    InterfaceRequestComplete,
}

/// `{chain_id, call_id, event_type, source_id, target_id, payload}` (§4.8).
/// A single `chain_id` threads through an end-to-end user request across
/// every role it touches.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    pub chain_id: Guid,
    pub call_id: Guid,
    pub event_type: ChainEventType,
    pub source_id: Guid,
    pub target_id: Guid,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub enum GraphEvent {
    Node(NodeEvent),
    Edge(EdgeEvent),
    Chain(ChainEvent),
}

/// Destination for monitoring output. Implementations must not let a
/// failure here propagate to the caller (§4.8: "never block the critical
/// path"); `MonitoringDecorator` enforces that regardless of what a given
/// sink does internally.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GraphEvent);
}

/// Drops everything. Used when no observer is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: GraphEvent) {}
}

/// Wraps a sink so emission failures (panics inside a user-supplied sink
/// notwithstanding) never propagate: `emit` itself cannot fail, so this is
/// mostly a clarity wrapper plus the seam other composition can hang off.
#[derive(Clone)]
pub struct MonitoringDecorator {
    sink: Arc<dyn EventSink>,
}

impl MonitoringDecorator {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn null() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn node(&self, participant_id: Guid, state: NodeState) {
        self.sink.emit(GraphEvent::Node(NodeEvent { participant_id, state }));
    }

    pub fn edge(&self, kind: EdgeKind, source_id: Guid, target_id: Guid) {
        self.sink.emit(GraphEvent::Edge(EdgeEvent { kind, source_id, target_id }));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn chain(
        &self,
        chain_id: Guid,
        call_id: Guid,
        event_type: ChainEventType,
        source_id: Guid,
        target_id: Guid,
        payload: Value,
    ) {
        self.sink.emit(GraphEvent::Chain(ChainEvent {
            chain_id,
            call_id,
            event_type,
            source_id,
            target_id,
            payload,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<GraphEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: GraphEvent) {
            self.events.lock().push(event);
        }
    }

    #[test]
    fn agent_to_agent_edge_is_recorded() {
        let sink = Arc::new(RecordingSink::default());
        let decorator = MonitoringDecorator::new(sink.clone());
        let primary = Guid::new();
        let weather = Guid::new();

        decorator.edge(EdgeKind::AgentToAgent, primary, weather);

        let events = sink.events.lock();
        assert_eq!(events.len(), 1);
        match &events[0] {
            GraphEvent::Edge(e) => {
                assert_eq!(e.kind, EdgeKind::AgentToAgent);
                assert_eq!(e.source_id, primary);
                assert_eq!(e.target_id, weather);
            }
            _ => panic!("expected an edge event"),
        }
    }

    #[test]
    fn null_decorator_accepts_everything_silently() {
        let decorator = MonitoringDecorator::null();
        decorator.node(Guid::new(), NodeState::Ready);
        decorator.chain(
            Guid::new(),
            Guid::new(),
            ChainEventType::AgentResponse,
            Guid::new(),
            Guid::new(),
            serde_json::json!({}),
        );
    }
}

//! Request/reply transport over a participant's shared `TopicRegistry`
//! (§5: "multiple roles in one process share one participant and
//! therefore share one topic object per `(participant, topic_name)`").
//!
//! This stands in for the concrete DDS/Zenoh/NATS request-topic binding
//! spec.md assumes (§1 non-goals); it is the in-process seam such a
//! binding would implement.

use crate::topic::{reply_topic, request_topic};
use crate::types::{RpcReply, RpcRequest};
use genesis_core::Participant;
use std::sync::Arc;
use tokio::sync::broadcast;

const TOPIC_BUFFER: usize = 256;

struct Topic<T> {
    sender: broadcast::Sender<T>,
}

fn topic_for<T: Clone + Send + Sync + 'static>(
    participant: &Participant,
    name: &str,
) -> Arc<Topic<T>> {
    participant.topics().get_or_create(name, || {
        let (sender, _) = broadcast::channel(TOPIC_BUFFER);
        Arc::new(Topic { sender })
    })
}

/// Publish a request onto `service_name`'s request topic.
pub fn publish_request(participant: &Participant, service_name: &str, request: RpcRequest) {
    let topic = topic_for::<RpcRequest>(participant, &request_topic(service_name));
    let _ = topic.sender.send(request);
}

/// Subscribe to `service_name`'s request topic.
pub fn subscribe_requests(
    participant: &Participant,
    service_name: &str,
) -> broadcast::Receiver<RpcRequest> {
    topic_for::<RpcRequest>(participant, &request_topic(service_name))
        .sender
        .subscribe()
}

/// Publish a reply onto `service_name`'s reply topic.
pub fn publish_reply(participant: &Participant, service_name: &str, reply: RpcReply) {
    let topic = topic_for::<RpcReply>(participant, &reply_topic(service_name));
    let _ = topic.sender.send(reply);
}

/// Subscribe to `service_name`'s reply topic. Kept separate from the RPC
/// client (§4.3: "Reply reader on the interface is separate from the RPC
/// client") so an observer can detect a "quiet" stream for streaming-style
/// final-reply detection independent of any one client's drain logic.
pub fn subscribe_replies(
    participant: &Participant,
    service_name: &str,
) -> broadcast::Receiver<RpcReply> {
    topic_for::<RpcReply>(participant, &reply_topic(service_name))
        .sender
        .subscribe()
}

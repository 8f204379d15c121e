//! # Transport Boundary
//!
//! The seam between the synchronization engine and whatever broker moves
//! messages between nodes. [`TransportClient::send`] is a synchronous send in
//! the protocol sense: the future resolves only once the broker has accepted
//! the message, surfacing transport failures to the caller instead of
//! swallowing them.
//!
//! [`InProcessBroker`] is the shipped implementation: a process-local topic
//! fanout over tokio broadcast channels, giving FIFO-per-sender ordering on a
//! topic and nothing more. It backs the integration tests and single-process
//! multi-node setups.

use super::message::MessageEnvelope;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Capacity of each topic's broadcast channel
const TOPIC_CAPACITY: usize = 1024;

/// A named topic shared by all cluster members
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub topic: String,
}

impl Destination {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

/// Broker client able to place an envelope on a destination
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Send an envelope; resolves once the broker has accepted it
    async fn send(&self, destination: &Destination, envelope: MessageEnvelope) -> Result<()>;
}

/// Process-local topic broker built on tokio broadcast channels
#[derive(Default)]
pub struct InProcessBroker {
    topics: Mutex<HashMap<String, broadcast::Sender<MessageEnvelope>>>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a destination, creating its topic on first use
    pub fn subscribe(&self, destination: &Destination) -> broadcast::Receiver<MessageEnvelope> {
        self.sender(destination).subscribe()
    }

    /// Number of live subscribers on a destination
    pub fn subscriber_count(&self, destination: &Destination) -> usize {
        self.topics
            .lock()
            .get(&destination.topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    fn sender(&self, destination: &Destination) -> broadcast::Sender<MessageEnvelope> {
        let mut topics = self.topics.lock();
        topics
            .entry(destination.topic.clone())
            .or_insert_with(|| {
                debug!(topic = %destination.topic, "Creating in-process topic");
                broadcast::channel(TOPIC_CAPACITY).0
            })
            .clone()
    }
}

#[async_trait]
impl TransportClient for InProcessBroker {
    async fn send(&self, destination: &Destination, envelope: MessageEnvelope) -> Result<()> {
        let sender = self.sender(destination);
        match sender.send(envelope) {
            Ok(receivers) => {
                trace!(
                    topic = %destination.topic,
                    receivers = receivers,
                    "Envelope delivered to topic"
                );
                Ok(())
            }
            // A topic with no subscribers accepts and discards the message,
            // matching broker topic semantics for absent consumers.
            Err(broadcast::error::SendError(envelope)) => {
                trace!(
                    topic = %destination.topic,
                    message_id = %envelope.message_id,
                    "No subscribers on topic, message discarded"
                );
                Ok(())
            }
        }
    }
}

/// Transport that always fails, for exercising producer-side error paths
#[cfg(test)]
pub struct FailingTransport;

#[cfg(test)]
#[async_trait]
impl TransportClient for FailingTransport {
    async fn send(&self, destination: &Destination, _envelope: MessageEnvelope) -> Result<()> {
        Err(crate::error::SyncError::transport(format!(
            "broker unreachable for topic {}",
            destination.topic
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::messaging::message::MessageProperties;

    fn envelope(payload: &str) -> MessageEnvelope {
        MessageEnvelope::new(payload.to_string(), MessageProperties::new())
    }

    #[tokio::test]
    async fn test_send_without_subscribers_is_accepted() {
        let broker = InProcessBroker::new();
        let dest = Destination::new("geocluster.test");
        broker.send(&dest, envelope("{}")).await.unwrap();
    }

    #[tokio::test]
    async fn test_fanout_to_all_subscribers() {
        let broker = InProcessBroker::new();
        let dest = Destination::new("geocluster.test");

        let mut rx_a = broker.subscribe(&dest);
        let mut rx_b = broker.subscribe(&dest);
        assert_eq!(broker.subscriber_count(&dest), 2);

        broker.send(&dest, envelope(r#"{"n":1}"#)).await.unwrap();

        assert_eq!(rx_a.recv().await.unwrap().payload, r#"{"n":1}"#);
        assert_eq!(rx_b.recv().await.unwrap().payload, r#"{"n":1}"#);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = InProcessBroker::new();
        let catalog = Destination::new("geocluster.catalog");
        let other = Destination::new("geocluster.other");

        let mut rx = broker.subscribe(&other);
        broker.send(&catalog, envelope("{}")).await.unwrap();

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_failing_transport_surfaces_error() {
        let transport = FailingTransport;
        let err = transport
            .send(&Destination::new("geocluster.test"), envelope("{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));
    }
}

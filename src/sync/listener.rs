//! # Producer-Side Catalog Listener
//!
//! Bridges local catalog notifications into the publisher. The listener is
//! invoked synchronously on the mutating thread, so the producer-enabled
//! check happens at mutation time, which is exactly when suppression during a replay
//! is in force. Events that pass the gate are queued to an async pump task
//! that performs the actual transport sends.

use crate::catalog::{CatalogEvent, CatalogListener};
use crate::handler::SyncEvent;
use crate::messaging::{Destination, MessageProperties, TransportClient};
use crate::sync::publisher::EventPublisher;
use crate::sync::toggle::ToggleState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Catalog listener gating and forwarding local mutations for publication
pub struct CatalogSyncListener {
    toggle: Arc<ToggleState>,
    outbound: mpsc::UnboundedSender<CatalogEvent>,
}

impl CatalogSyncListener {
    /// Create the listener and the receiving end of its outbound queue.
    /// Register the listener with the catalog and hand the receiver to
    /// [`spawn_publish_pump`].
    pub fn new(toggle: Arc<ToggleState>) -> (Arc<Self>, mpsc::UnboundedReceiver<CatalogEvent>) {
        let (outbound, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { toggle, outbound }), receiver)
    }
}

impl CatalogListener for CatalogSyncListener {
    fn handle_event(&self, event: &CatalogEvent) {
        // Gate check happens here, on the mutating thread: during a replay
        // the producer is suppressed and the event goes nowhere.
        if !self.toggle.is_producer_enabled() {
            debug!(event_kind = %event.kind(), "Producer disabled, skipping local event");
            return;
        }
        // Receiver dropped means the node is shutting down.
        let _ = self.outbound.send(event.clone());
    }
}

/// Drain the listener's queue, publishing each event to the cluster topic.
///
/// Publish failures are logged and the pump moves on: a lost replication
/// message surfaces in the log, never as a crashed producer.
pub fn spawn_publish_pump<O: SyncEvent + 'static>(
    mut events: mpsc::UnboundedReceiver<O>,
    publisher: Arc<EventPublisher<O>>,
    transport: Arc<dyn TransportClient>,
    destination: Destination,
    base_properties: MessageProperties,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let result = publisher
                .publish(
                    &destination,
                    transport.as_ref(),
                    base_properties.clone(),
                    &event,
                )
                .await;
            if let Err(err) = result {
                error!(
                    event_kind = %event.kind(),
                    topic = %destination.topic,
                    error = %err,
                    "Unable to publish local event"
                );
            }
        }
        debug!(topic = %destination.topic, "Publish pump stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{local_id, Catalog, CatalogInfo, MemoryCatalog, WorkspaceInfo};
    use crate::handler::catalog::default_factories;
    use crate::handler::HandlerRegistry;
    use crate::messaging::{InProcessBroker, INSTANCE_NAME_KEY};

    fn workspace(name: &str) -> CatalogInfo {
        CatalogInfo::Workspace(WorkspaceInfo {
            id: local_id(),
            name: name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_local_mutation_is_published() {
        let catalog = Arc::new(MemoryCatalog::new());
        let toggle = Arc::new(ToggleState::new(true, true));
        let (listener, receiver) = CatalogSyncListener::new(toggle);
        catalog.add_listener(listener);

        let registry =
            Arc::new(HandlerRegistry::new(default_factories(catalog.clone())).unwrap());
        let publisher = Arc::new(EventPublisher::new(registry));
        let broker = Arc::new(InProcessBroker::new());
        let dest = Destination::new("geocluster.test");
        let mut rx = broker.subscribe(&dest);

        let mut props = MessageProperties::new();
        props.insert(INSTANCE_NAME_KEY.to_string(), "node-a".to_string());
        let pump = spawn_publish_pump(receiver, publisher, broker.clone(), dest, props);

        catalog.add(workspace("geo")).unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.instance_name(), Some("node-a"));
        assert!(envelope.payload.contains("\"geo\""));

        pump.abort();
    }

    #[tokio::test]
    async fn test_disabled_producer_publishes_nothing() {
        let catalog = Arc::new(MemoryCatalog::new());
        let toggle = Arc::new(ToggleState::new(false, true));
        let (listener, mut receiver) = CatalogSyncListener::new(toggle);
        catalog.add_listener(listener);

        catalog.add(workspace("geo")).unwrap();

        assert!(matches!(
            receiver.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));
    }
}

//! # Consumer Container
//!
//! Owns the consumer side of a node's transport connection: a delivery task
//! reading envelopes from a topic subscription and feeding them through the
//! [`Synchronizer`]. Connect/disconnect are explicit so an operator can take
//! a node off the bus at runtime; a disconnected node misses messages with no
//! catch-up, matching the protocol's at-most-once contract.

use crate::handler::SyncEvent;
use crate::messaging::MessageEnvelope;
use crate::sync::synchronizer::Synchronizer;
use crate::sync::toggle::ToggleState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Attempts made waiting for the delivery task to wind down
const SHUTDOWN_ATTEMPTS: u32 = 3;
/// Pause between shutdown checks
const SHUTDOWN_WAIT: Duration = Duration::from_millis(200);

/// Consumer-side delivery loop for one node
pub struct ConsumerContainer<O: SyncEvent> {
    synchronizer: Arc<Synchronizer<O>>,
    toggle: Arc<ToggleState>,
    task: Option<JoinHandle<()>>,
}

impl<O: SyncEvent + 'static> ConsumerContainer<O> {
    pub fn new(synchronizer: Arc<Synchronizer<O>>, toggle: Arc<ToggleState>) -> Self {
        Self {
            synchronizer,
            toggle,
            task: None,
        }
    }

    /// Whether the delivery task is currently running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start consuming from a topic subscription. A no-op when already
    /// connected.
    pub fn connect(&mut self, mut subscription: broadcast::Receiver<MessageEnvelope>) {
        if self.is_running() {
            debug!("Consumer already connected");
            return;
        }

        let synchronizer = self.synchronizer.clone();
        let toggle = self.toggle.clone();
        self.task = Some(tokio::spawn(async move {
            info!("Consumer connected to topic");
            loop {
                match subscription.recv().await {
                    Ok(envelope) => {
                        // The consumer gate only pauses applying; the
                        // subscription stays registered with the broker.
                        if !toggle.is_consumer_enabled() {
                            debug!(
                                message_id = %envelope.message_id,
                                "Consumer disabled, dropping message"
                            );
                            continue;
                        }
                        synchronizer.on_message(&envelope);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Missed messages are gone for good; the operator
                        // recovers with a full resync, outside this engine.
                        warn!(missed = missed, "Consumer lagged behind the topic");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Topic closed, consumer stopping");
                        break;
                    }
                }
            }
        }));
    }

    /// Stop consuming. Cancels the delivery task at its next await point
    /// (a message already inside `on_message` still completes) and waits
    /// briefly for it to wind down.
    pub async fn disconnect(&mut self) {
        let Some(task) = self.task.take() else {
            debug!("Consumer already disconnected");
            return;
        };

        info!("Disconnecting consumer...");
        task.abort();
        for attempt in 1..=SHUTDOWN_ATTEMPTS {
            if task.is_finished() {
                info!("Consumer disconnected from the destination topic");
                warn!("Events published while disconnected will not be replayed on this node");
                return;
            }
            debug!(attempt = attempt, "Waiting for consumer shutdown...");
            tokio::time::sleep(SHUTDOWN_WAIT).await;
        }
        warn!("Consumer delivery task did not confirm shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{local_id, Catalog, CatalogEvent, CatalogInfo, MemoryCatalog, WorkspaceInfo};
    use crate::handler::catalog::{default_factories, CATALOG_ADD_HANDLER_ID};
    use crate::handler::HandlerRegistry;
    use crate::messaging::{
        Destination, InProcessBroker, MessageProperties, TransportClient, HANDLER_ID_KEY,
        INSTANCE_NAME_KEY,
    };
    use tokio::time::{sleep, Duration};

    fn envelope(name: &str) -> MessageEnvelope {
        let event = CatalogEvent::Added(CatalogInfo::Workspace(WorkspaceInfo {
            id: local_id(),
            name: name.to_string(),
        }));
        let mut props = MessageProperties::new();
        props.insert(HANDLER_ID_KEY.to_string(), CATALOG_ADD_HANDLER_ID.to_string());
        props.insert(INSTANCE_NAME_KEY.to_string(), "node-a".to_string());
        MessageEnvelope::new(serde_json::to_string(&event).unwrap(), props)
    }

    fn container(
        catalog: Arc<MemoryCatalog>,
        toggle: Arc<ToggleState>,
    ) -> ConsumerContainer<CatalogEvent> {
        let registry =
            Arc::new(HandlerRegistry::new(default_factories(catalog)).unwrap());
        let synchronizer = Arc::new(Synchronizer::new(registry, toggle.clone(), "node-b"));
        ConsumerContainer::new(synchronizer, toggle)
    }

    #[tokio::test]
    async fn test_connected_container_applies_messages() {
        let catalog = Arc::new(MemoryCatalog::new());
        let toggle = Arc::new(ToggleState::new(true, true));
        let broker = InProcessBroker::new();
        let dest = Destination::new("geocluster.test");

        let mut container = container(catalog.clone(), toggle);
        container.connect(broker.subscribe(&dest));
        assert!(container.is_running());

        broker.send(&dest, envelope("geo")).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert!(catalog.workspace_by_name("geo").is_some());
        container.disconnect().await;
        assert!(!container.is_running());
    }

    #[tokio::test]
    async fn test_disabled_consumer_drops_messages() {
        let catalog = Arc::new(MemoryCatalog::new());
        let toggle = Arc::new(ToggleState::new(true, false));
        let broker = InProcessBroker::new();
        let dest = Destination::new("geocluster.test");

        let mut container = container(catalog.clone(), toggle);
        container.connect(broker.subscribe(&dest));

        broker.send(&dest, envelope("geo")).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert!(catalog.workspace_by_name("geo").is_none());
        container.disconnect().await;
    }

    #[tokio::test]
    async fn test_double_connect_is_a_noop() {
        let catalog = Arc::new(MemoryCatalog::new());
        let toggle = Arc::new(ToggleState::new(true, true));
        let broker = InProcessBroker::new();
        let dest = Destination::new("geocluster.test");

        let mut container = container(catalog, toggle);
        container.connect(broker.subscribe(&dest));
        container.connect(broker.subscribe(&dest));
        assert!(container.is_running());
        container.disconnect().await;
    }
}

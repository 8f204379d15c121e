//! # Event Publisher
//!
//! Producer-side pipeline: resolve a handler for the local event, tag the
//! envelope with the handler factory's identifier, serialize, and hand the
//! message to the transport for a synchronous (acknowledged) send.
//!
//! The publisher is stateless and never touches the catalog; the
//! producer-enabled guard belongs to the calling listener, which keeps this
//! type trivially testable in isolation.

use crate::error::{Result, SyncError};
use crate::handler::{HandlerRegistry, SyncEvent};
use crate::messaging::{Destination, MessageEnvelope, MessageProperties, TransportClient, HANDLER_ID_KEY};
use std::sync::Arc;
use tracing::debug;

/// Publishes local domain events onto the cluster topic
pub struct EventPublisher<O: SyncEvent> {
    registry: Arc<HandlerRegistry<O>>,
}

impl<O: SyncEvent> EventPublisher<O> {
    pub fn new(registry: Arc<HandlerRegistry<O>>) -> Self {
        Self { registry }
    }

    /// Serialize and send one event.
    ///
    /// Resolution and serialization failures propagate to the caller as
    /// transport-layer errors without attempting the send; the local mutation
    /// that triggered the publish is not rolled back here; the error only
    /// means the change was not replicated.
    pub async fn publish(
        &self,
        destination: &Destination,
        transport: &dyn TransportClient,
        mut properties: MessageProperties,
        event: &O,
    ) -> Result<()> {
        let handler = self
            .registry
            .handler_for_event(event)
            .map_err(|err| SyncError::transport(format!("unable to publish: {err}")))?;

        properties.insert(HANDLER_ID_KEY.to_string(), handler.factory_id().to_string());
        let payload = handler.serialize(event)?;
        let envelope = MessageEnvelope::new(payload, properties);

        debug!(
            message_id = %envelope.message_id,
            handler_id = handler.factory_id(),
            event_kind = %event.kind(),
            topic = %destination.topic,
            "Publishing event"
        );

        // Synchronous send: block the caller until the broker accepts the
        // message, surfacing transport failures instead of swallowing them.
        transport.send(destination, envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{local_id, CatalogInfo, MemoryCatalog, WorkspaceInfo};
    use crate::catalog::CatalogEvent;
    use crate::handler::catalog::{default_factories, CATALOG_ADD_HANDLER_ID};
    use crate::messaging::InProcessBroker;

    fn setup() -> (EventPublisher<CatalogEvent>, InProcessBroker, Destination) {
        let catalog: Arc<dyn crate::catalog::Catalog> = Arc::new(MemoryCatalog::new());
        let registry = Arc::new(HandlerRegistry::new(default_factories(catalog)).unwrap());
        (
            EventPublisher::new(registry),
            InProcessBroker::new(),
            Destination::new("geocluster.test"),
        )
    }

    fn added_workspace(name: &str) -> CatalogEvent {
        CatalogEvent::Added(CatalogInfo::Workspace(WorkspaceInfo {
            id: local_id(),
            name: name.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_publish_tags_envelope_with_handler_id() {
        let (publisher, broker, dest) = setup();
        let mut rx = broker.subscribe(&dest);

        publisher
            .publish(&dest, &broker, MessageProperties::new(), &added_workspace("geo"))
            .await
            .unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.handler_id(), Some(CATALOG_ADD_HANDLER_ID));
        assert!(envelope.payload.contains("\"geo\""));
    }

    #[tokio::test]
    async fn test_publish_preserves_caller_properties() {
        let (publisher, broker, dest) = setup();
        let mut rx = broker.subscribe(&dest);

        let mut props = MessageProperties::new();
        props.insert("purge".to_string(), "true".to_string());
        publisher
            .publish(&dest, &broker, props, &added_workspace("geo"))
            .await
            .unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.properties.get("purge").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_unresolvable_event_becomes_transport_error_without_send() {
        let registry: Arc<HandlerRegistry<CatalogEvent>> =
            Arc::new(HandlerRegistry::new(vec![]).unwrap());
        let publisher = EventPublisher::new(registry);
        let broker = InProcessBroker::new();
        let dest = Destination::new("geocluster.test");
        let mut rx = broker.subscribe(&dest);

        let err = publisher
            .publish(&dest, &broker, MessageProperties::new(), &added_workspace("geo"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Transport { .. }));
        assert!(err.to_string().contains("no handler found"));
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}

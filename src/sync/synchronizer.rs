//! # Synchronizer
//!
//! Consumer-side pipeline: recover the handler identity from an inbound
//! envelope, suppress the local producer, deserialize, and apply.
//!
//! This layer is at-most-once by design: any failure (unknown handler id,
//! malformed payload, apply error) is logged with full message context and
//! the message is dropped. Errors never propagate into the transport's
//! delivery task, and the suppression guard is released on every path.

use crate::handler::{HandlerRegistry, SyncEvent};
use crate::messaging::MessageEnvelope;
use crate::sync::toggle::ToggleState;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of a delivery attempt, used by callers and tests to observe the
/// drop-vs-apply decision without parsing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handler applied the event
    Applied,
    /// Handler recognized the event but chose not to apply it
    NotApplied,
    /// Message was dropped (own message, missing/unknown handler id,
    /// deserialization or apply failure)
    Dropped,
}

/// Applies inbound envelopes against local state
pub struct Synchronizer<O: SyncEvent> {
    registry: Arc<HandlerRegistry<O>>,
    toggle: Arc<ToggleState>,
    /// This node's identity; messages we produced ourselves are skipped
    instance_name: String,
}

impl<O: SyncEvent> Synchronizer<O> {
    pub fn new(
        registry: Arc<HandlerRegistry<O>>,
        toggle: Arc<ToggleState>,
        instance_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            toggle,
            instance_name: instance_name.into(),
        }
    }

    /// Handle one inbound message. Never returns an error; the consumer side
    /// logs and drops instead of crashing the delivery task.
    pub fn on_message(&self, envelope: &MessageEnvelope) -> DeliveryOutcome {
        if envelope.instance_name() == Some(self.instance_name.as_str()) {
            debug!(
                message_id = %envelope.message_id,
                "Skipping message produced by this node"
            );
            return DeliveryOutcome::Dropped;
        }

        let Some(handler_id) = envelope.handler_id() else {
            warn!(
                message_id = %envelope.message_id,
                properties = ?envelope.properties,
                "Message carries no handler id, dropping"
            );
            return DeliveryOutcome::Dropped;
        };

        let mut handler = match self.registry.handler_for_id(handler_id) {
            Ok(handler) => handler,
            Err(err) => {
                warn!(
                    message_id = %envelope.message_id,
                    handler_id = %handler_id,
                    properties = ?envelope.properties,
                    error = %err,
                    "Unable to resolve handler for inbound message, dropping"
                );
                return DeliveryOutcome::Dropped;
            }
        };

        // Recursion guard: applying this event fires the same local catalog
        // notifications a user action would; with the producer suppressed
        // they go nowhere. The guard restores the previous state when this
        // scope unwinds, error or not.
        let _suppression = self.toggle.suppress_producer();

        handler.set_properties(envelope.properties.clone());

        let event = match handler.deserialize(&envelope.payload) {
            Ok(event) => event,
            Err(err) => {
                error!(
                    message_id = %envelope.message_id,
                    handler_id = %handler_id,
                    properties = ?envelope.properties,
                    error = %err,
                    "Unable to deserialize inbound payload, dropping"
                );
                return DeliveryOutcome::Dropped;
            }
        };

        let event_kind = event.kind();
        match handler.synchronize(event) {
            Ok(true) => {
                info!(
                    message_id = %envelope.message_id,
                    handler_id = %handler_id,
                    event_kind = %event_kind,
                    age_ms = envelope.age_ms(),
                    "Applied remote event"
                );
                DeliveryOutcome::Applied
            }
            Ok(false) => {
                warn!(
                    message_id = %envelope.message_id,
                    handler_id = %handler_id,
                    event_kind = %event_kind,
                    "Remote event recognized but not applied"
                );
                DeliveryOutcome::NotApplied
            }
            Err(err) => {
                error!(
                    message_id = %envelope.message_id,
                    handler_id = %handler_id,
                    event_kind = %event_kind,
                    properties = ?envelope.properties,
                    error = %err,
                    "Unable to synchronize remote event, dropping"
                );
                DeliveryOutcome::Dropped
            }
        }
    }
}

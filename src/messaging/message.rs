//! # Message Envelope
//!
//! The unit placed on the transport: a serialized event payload plus a string
//! property bag. One property key is reserved for the producing handler
//! factory's identifier, which the consumer uses to resolve the exact same
//! handler implementation for symmetric deserialization. All cluster members
//! must run builds registering the same identifier for the event kinds they
//! share; that is the protocol's compatibility contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Reserved property: identifier of the handler factory that produced the
/// payload, read back on the consumer side for symmetric resolution.
pub const HANDLER_ID_KEY: &str = "handler_id";

/// Reserved property: instance name of the producing node, used by consumers
/// to drop their own messages.
pub const INSTANCE_NAME_KEY: &str = "instance_name";

/// Handler-specific property understood by the style removal path: when
/// `"true"`, the backing style file is purged together with the style.
pub const PURGE_KEY: &str = "purge";

/// String key/value pairs attached to each message
pub type MessageProperties = HashMap<String, String>;

/// Envelope carried over the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique message id for log correlation
    pub message_id: Uuid,
    /// When the producing node built the envelope
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Serialized event payload (JSON text)
    pub payload: String,
    /// Property bag; includes the reserved keys above
    pub properties: MessageProperties,
}

impl MessageEnvelope {
    pub fn new(payload: String, properties: MessageProperties) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            payload,
            properties,
        }
    }

    /// The producing handler factory's identifier, if tagged
    pub fn handler_id(&self) -> Option<&str> {
        self.properties.get(HANDLER_ID_KEY).map(String::as_str)
    }

    /// The producing node's instance name, if tagged
    pub fn instance_name(&self) -> Option<&str> {
        self.properties.get(INSTANCE_NAME_KEY).map(String::as_str)
    }

    /// Message age in milliseconds
    pub fn age_ms(&self) -> u64 {
        chrono::Utc::now()
            .signed_duration_since(self.created_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_reserved_properties() {
        let mut props = MessageProperties::new();
        props.insert(HANDLER_ID_KEY.to_string(), "catalog-add".to_string());
        props.insert(INSTANCE_NAME_KEY.to_string(), "node-a".to_string());

        let envelope = MessageEnvelope::new("{}".to_string(), props);
        assert_eq!(envelope.handler_id(), Some("catalog-add"));
        assert_eq!(envelope.instance_name(), Some("node-a"));
    }

    #[test]
    fn test_envelope_without_tags() {
        let envelope = MessageEnvelope::new("{}".to_string(), MessageProperties::new());
        assert!(envelope.handler_id().is_none());
        assert!(envelope.instance_name().is_none());
    }

    #[test]
    fn test_age_is_non_negative() {
        let mut envelope = MessageEnvelope::new("{}".to_string(), MessageProperties::new());
        assert!(envelope.age_ms() < 1_000);

        // A clock skewed into the future must not underflow.
        envelope.created_at = chrono::Utc::now() + chrono::Duration::seconds(60);
        assert_eq!(envelope.age_ms(), 0);
    }

    #[test]
    fn test_envelope_survives_json_round_trip() {
        let mut props = MessageProperties::new();
        props.insert(HANDLER_ID_KEY.to_string(), "catalog-remove".to_string());
        let envelope = MessageEnvelope::new(r#"{"k":1}"#.to_string(), props);

        let json = serde_json::to_string(&envelope).unwrap();
        let back: MessageEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message_id, envelope.message_id);
        assert_eq!(back.payload, envelope.payload);
        assert_eq!(back.handler_id(), Some("catalog-remove"));
    }
}

//! # Messaging Module
//!
//! Message envelopes and the transport boundary used to move serialized
//! catalog events between cluster nodes. The broker is pluggable behind
//! [`transport::TransportClient`]; an in-process topic broker ships as the
//! default implementation and as the test bus.

pub mod message;
pub mod transport;

pub use message::{MessageEnvelope, MessageProperties, HANDLER_ID_KEY, INSTANCE_NAME_KEY, PURGE_KEY};
pub use transport::{Destination, InProcessBroker, TransportClient};

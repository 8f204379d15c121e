//! # Handler Contract
//!
//! The abstract unit of replication work: serialize a domain event for the
//! wire, deserialize it back, and apply ("synchronize") it against local
//! state.
//!
//! ## Overview
//!
//! Handlers are created per publish or per receive by a [`HandlerFactory`]
//! and discarded after use; they are stateless beyond their
//! constructor-injected collaborators. The factory's stable identifier is the
//! wire-level link between the producing and consuming sides: the producer
//! tags each envelope with it, and the consumer resolves the exact same
//! implementation by that tag instead of re-running the capability search.
//!
//! Identifiers are explicit string constants, deliberately decoupled from any
//! type or class name, so the wire protocol never depends on an
//! implementation language's naming.

pub mod catalog;
pub mod registry;

pub use registry::HandlerRegistry;

use crate::error::Result;
use crate::messaging::MessageProperties;

/// A domain event the engine can replicate
pub trait SyncEvent: Send + Sync + Clone {
    /// Stable event-kind label used in logs and resolution errors
    fn kind(&self) -> String;
}

/// One replication unit: wire codec plus local apply for a family of events
pub trait EventHandler<O: SyncEvent>: Send {
    /// Identifier of the factory that created this handler; stamped onto
    /// outgoing envelopes for symmetric consumer-side resolution
    fn factory_id(&self) -> &'static str;

    /// Encode an event for the wire. Pure; no side effects.
    fn serialize(&self, event: &O) -> Result<String>;

    /// Decode a wire payload back into an event
    fn deserialize(&self, payload: &str) -> Result<O>;

    /// Apply the event to local state. `Ok(false)` means "recognized but not
    /// applied" (non-fatal); an error means the message could not be applied
    /// and the caller owns logging and dropping it.
    fn synchronize(&mut self, event: O) -> Result<bool>;

    /// Attach the envelope's property bag before a synchronize call
    fn set_properties(&mut self, properties: MessageProperties);

    /// Read-only view of the transport-supplied properties
    fn properties(&self) -> &MessageProperties;
}

/// Priority-ranked constructor/predicate pair used to select a handler.
///
/// Registered once at process start; immutable for the process lifetime.
/// Identifiers must be unique within a process.
pub trait HandlerFactory<O: SyncEvent>: Send + Sync {
    /// Stable wire identifier for this factory's handlers
    fn id(&self) -> &'static str;

    /// Resolution rank; lower values are tried first
    fn priority(&self) -> i32;

    /// Whether this factory's handlers accept the given event
    fn can_handle(&self, event: &O) -> bool;

    /// Construct a fresh handler. A failure here does not fail resolution as
    /// long as a lower-ranked factory succeeds (failover chain).
    fn create_handler(&self) -> Result<Box<dyn EventHandler<O>>>;
}

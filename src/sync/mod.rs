//! # Synchronization Engine
//!
//! The moving parts of cluster replication:
//!
//! - [`toggle`]: producer/consumer gates with the RAII suppression guard
//!   that prevents replication loops
//! - [`publisher`]: resolves, serializes and sends local events
//! - [`synchronizer`]: resolves, deserializes and applies inbound messages
//! - [`listener`]: producer-side catalog listener feeding the publisher
//! - [`container`]: consumer-side delivery task wrapping a transport
//!   subscription
//!
//! ```text
//! local mutation → CatalogSyncListener → EventPublisher → transport
//!                                                             │
//!     toggle (suppressed) ← Synchronizer ← ConsumerContainer ←┘
//! ```

pub mod container;
pub mod listener;
pub mod publisher;
pub mod synchronizer;
pub mod toggle;

pub use container::ConsumerContainer;
pub use listener::CatalogSyncListener;
pub use publisher::EventPublisher;
pub use synchronizer::{DeliveryOutcome, Synchronizer};
pub use toggle::{SuppressionGuard, ToggleEvent, ToggleRole, ToggleState};

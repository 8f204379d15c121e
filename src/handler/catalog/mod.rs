//! # Catalog Event Handlers
//!
//! Concrete [`EventHandler`] implementations replicating catalog mutations:
//! one handler per mutation kind (add, remove, post-modify), each localizing
//! the incoming object graph against the local catalog before touching it.
//!
//! The wire payload is the JSON encoding of [`CatalogEvent`]; producer and
//! consumer sides share the codec through the factory identifier carried on
//! each envelope.

pub mod add;
pub mod post_modify;
pub mod remove;

pub use add::{CatalogAddFactory, CatalogAddHandler};
pub use post_modify::{CatalogPostModifyFactory, CatalogPostModifyHandler};
pub use remove::{CatalogRemoveFactory, CatalogRemoveHandler};

use super::{HandlerFactory, SyncEvent};
use crate::catalog::{Catalog, CatalogEvent};
use crate::error::{Result, SyncError};
use std::sync::Arc;

/// Wire identifier of the add handler
pub const CATALOG_ADD_HANDLER_ID: &str = "catalog-add";
/// Wire identifier of the remove handler
pub const CATALOG_REMOVE_HANDLER_ID: &str = "catalog-remove";
/// Wire identifier of the post-modify handler
pub const CATALOG_POST_MODIFY_HANDLER_ID: &str = "catalog-post-modify";

/// Default resolution rank for the built-in catalog factories
pub const DEFAULT_PRIORITY: i32 = 50;

impl SyncEvent for CatalogEvent {
    fn kind(&self) -> String {
        CatalogEvent::kind(self)
    }
}

/// Encode a catalog event for the wire
pub(crate) fn encode(event: &CatalogEvent) -> Result<String> {
    serde_json::to_string(event)
        .map_err(|e| SyncError::serialization(format!("{}: {e}", event.kind())))
}

/// Decode a wire payload back into a catalog event
pub(crate) fn decode(payload: &str) -> Result<CatalogEvent> {
    serde_json::from_str(payload).map_err(|e| SyncError::deserialization(e.to_string()))
}

/// The built-in factory set wired in by the composition root
pub fn default_factories(
    catalog: Arc<dyn Catalog>,
) -> Vec<Arc<dyn HandlerFactory<CatalogEvent>>> {
    vec![
        Arc::new(CatalogAddFactory::new(catalog.clone())),
        Arc::new(CatalogRemoveFactory::new(catalog.clone())),
        Arc::new(CatalogPostModifyFactory::new(catalog)),
    ]
}

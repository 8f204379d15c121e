//! Handler replicating catalog additions.

use super::{decode, encode, CATALOG_ADD_HANDLER_ID, DEFAULT_PRIORITY};
use crate::catalog::{localize::localize_info, Catalog, CatalogEvent};
use crate::error::Result;
use crate::handler::{EventHandler, HandlerFactory};
use crate::messaging::MessageProperties;
use std::sync::Arc;
use tracing::error;

/// Applies a remote `Added` event by localizing the incoming object graph and
/// adding it to the local catalog.
pub struct CatalogAddHandler {
    catalog: Arc<dyn Catalog>,
    properties: MessageProperties,
}

impl CatalogAddHandler {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            properties: MessageProperties::new(),
        }
    }
}

impl EventHandler<CatalogEvent> for CatalogAddHandler {
    fn factory_id(&self) -> &'static str {
        CATALOG_ADD_HANDLER_ID
    }

    fn serialize(&self, event: &CatalogEvent) -> Result<String> {
        encode(event)
    }

    fn deserialize(&self, payload: &str) -> Result<CatalogEvent> {
        decode(payload)
    }

    fn synchronize(&mut self, event: CatalogEvent) -> Result<bool> {
        match event {
            CatalogEvent::Added(info) => {
                let localized = localize_info(&info, self.catalog.as_ref())?;
                self.catalog.add(localized)?;
                Ok(true)
            }
            other => {
                error!(event_kind = %other.kind(), "Unrecognized event type for add handler");
                Ok(false)
            }
        }
    }

    fn set_properties(&mut self, properties: MessageProperties) {
        self.properties = properties;
    }

    fn properties(&self) -> &MessageProperties {
        &self.properties
    }
}

/// Factory for [`CatalogAddHandler`]
pub struct CatalogAddFactory {
    catalog: Arc<dyn Catalog>,
    priority: i32,
}

impl CatalogAddFactory {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_priority(catalog: Arc<dyn Catalog>, priority: i32) -> Self {
        Self { catalog, priority }
    }
}

impl HandlerFactory<CatalogEvent> for CatalogAddFactory {
    fn id(&self) -> &'static str {
        CATALOG_ADD_HANDLER_ID
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_handle(&self, event: &CatalogEvent) -> bool {
        matches!(event, CatalogEvent::Added(_))
    }

    fn create_handler(&self) -> Result<Box<dyn EventHandler<CatalogEvent>>> {
        Ok(Box::new(CatalogAddHandler::new(self.catalog.clone())))
    }
}

//! Handler replicating catalog removals, honoring the `purge` side channel
//! for styles.

use super::{decode, encode, CATALOG_REMOVE_HANDLER_ID, DEFAULT_PRIORITY};
use crate::catalog::{localize::localize_info, Catalog, CatalogEvent, CatalogInfo};
use crate::error::Result;
use crate::handler::{EventHandler, HandlerFactory};
use crate::messaging::{MessageProperties, PURGE_KEY};
use std::sync::Arc;
use tracing::{error, warn};

/// Applies a remote `Removed` event by localizing the object and removing it
/// from the local catalog. For styles, a `purge=true` message property also
/// drops the backing style file.
pub struct CatalogRemoveHandler {
    catalog: Arc<dyn Catalog>,
    properties: MessageProperties,
}

impl CatalogRemoveHandler {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            properties: MessageProperties::new(),
        }
    }

    fn purge_requested(&self) -> bool {
        self.properties
            .get(PURGE_KEY)
            .is_some_and(|value| value.parse().unwrap_or(false))
    }
}

impl EventHandler<CatalogEvent> for CatalogRemoveHandler {
    fn factory_id(&self) -> &'static str {
        CATALOG_REMOVE_HANDLER_ID
    }

    fn serialize(&self, event: &CatalogEvent) -> Result<String> {
        encode(event)
    }

    fn deserialize(&self, payload: &str) -> Result<CatalogEvent> {
        decode(payload)
    }

    fn synchronize(&mut self, event: CatalogEvent) -> Result<bool> {
        match event {
            CatalogEvent::Removed(info) => {
                let localized = localize_info(&info, self.catalog.as_ref())?;
                self.catalog.remove(&localized)?;

                if let CatalogInfo::Style(style) = &localized {
                    if self.purge_requested() {
                        // A failed purge leaves an orphan file, not an
                        // inconsistent catalog, so it does not fail the apply.
                        if let Err(err) = self.catalog.purge_style(style) {
                            warn!(
                                style = %style.name,
                                error = %err,
                                "Unable to purge style file"
                            );
                        }
                    }
                }
                Ok(true)
            }
            other => {
                error!(event_kind = %other.kind(), "Unrecognized event type for remove handler");
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

/// Factory for [`CatalogRemoveHandler`]
pub struct CatalogRemoveFactory {
    catalog: Arc<dyn Catalog>,
    priority: i32,
}

impl CatalogRemoveFactory {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl HandlerFactory<CatalogEvent> for CatalogRemoveFactory {
    fn id(&self) -> &'static str {
        CATALOG_REMOVE_HANDLER_ID
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_handle(&self, event: &CatalogEvent) -> bool {
        matches!(event, CatalogEvent::Removed(_))
    }

    fn create_handler(&self) -> Result<Box<dyn EventHandler<CatalogEvent>>> {
        Ok(Box::new(CatalogRemoveHandler::new(self.catalog.clone())))
    }
}

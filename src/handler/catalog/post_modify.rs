//! Handler replicating catalog modifications.

use super::{decode, encode, CATALOG_POST_MODIFY_HANDLER_ID, DEFAULT_PRIORITY};
use crate::catalog::{localize::localize_info, Catalog, CatalogEvent};
use crate::error::Result;
use crate::handler::{EventHandler, HandlerFactory};
use crate::messaging::MessageProperties;
use std::sync::Arc;
use tracing::error;

/// Applies a remote `PostModified` event: the incoming object carries the
/// already-modified state, so the handler localizes it, saves it over the
/// local object, and re-fires the post-modify notification so local
/// observers see the change.
pub struct CatalogPostModifyHandler {
    catalog: Arc<dyn Catalog>,
    properties: MessageProperties,
}

impl CatalogPostModifyHandler {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            properties: MessageProperties::new(),
        }
    }
}

impl EventHandler<CatalogEvent> for CatalogPostModifyHandler {
    fn factory_id(&self) -> &'static str {
        CATALOG_POST_MODIFY_HANDLER_ID
    }

    fn serialize(&self, event: &CatalogEvent) -> Result<String> {
        encode(event)
    }

    fn deserialize(&self, payload: &str) -> Result<CatalogEvent> {
        decode(payload)
    }

    fn synchronize(&mut self, event: CatalogEvent) -> Result<bool> {
        match event {
            CatalogEvent::PostModified(info) => {
                let localized = localize_info(&info, self.catalog.as_ref())?;
                self.catalog.save(localized.clone())?;
                self.catalog.fire_post_modified(&localized)?;
                Ok(true)
            }
            other => {
                error!(
                    event_kind = %other.kind(),
                    "Unrecognized event type for post-modify handler"
                );
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

/// Factory for [`CatalogPostModifyHandler`]
pub struct CatalogPostModifyFactory {
    catalog: Arc<dyn Catalog>,
    priority: i32,
}

impl CatalogPostModifyFactory {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl HandlerFactory<CatalogEvent> for CatalogPostModifyFactory {
    fn id(&self) -> &'static str {
        CATALOG_POST_MODIFY_HANDLER_ID
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_handle(&self, event: &CatalogEvent) -> bool {
        matches!(event, CatalogEvent::PostModified(_))
    }

    fn create_handler(&self) -> Result<Box<dyn EventHandler<CatalogEvent>>> {
        Ok(Box::new(CatalogPostModifyHandler::new(self.catalog.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{local_id, CatalogInfo, MemoryCatalog, WorkspaceInfo};

    #[test]
    fn test_modified_state_is_saved_locally() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog
            .add(CatalogInfo::Namespace(crate::catalog::NamespaceInfo {
                id: local_id(),
                prefix: "geo".to_string(),
                uri: "http://old".to_string(),
            }))
            .unwrap();

        let mut handler = CatalogPostModifyHandler::new(catalog.clone());
        let modified = crate::catalog::NamespaceInfo {
            id: "foreign-id".to_string(),
            prefix: "geo".to_string(),
            uri: "http://new".to_string(),
        };
        let applied = handler
            .synchronize(CatalogEvent::PostModified(CatalogInfo::Namespace(modified)))
            .unwrap();

        assert!(applied);
        assert_eq!(catalog.namespace_by_prefix("geo").unwrap().uri, "http://new");
    }

    #[test]
    fn test_modify_of_unknown_object_fails() {
        let catalog = Arc::new(MemoryCatalog::new());
        let mut handler = CatalogPostModifyHandler::new(catalog);
        let err = handler
            .synchronize(CatalogEvent::PostModified(CatalogInfo::Workspace(
                WorkspaceInfo {
                    id: "foreign".to_string(),
                    name: "geo".to_string(),
                },
            )))
            .unwrap_err();
        assert!(err.to_string().contains("cannot save"));
    }
}

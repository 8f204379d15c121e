//! # In-Memory Catalog
//!
//! Thread-safe reference implementation of the [`Catalog`] boundary, keyed by
//! natural keys. Mutations notify registered listeners synchronously on the
//! mutating thread, which is what makes producer suppression during a replay
//! observable by the sync listener.

use super::{
    Catalog, CatalogEvent, CatalogInfo, CatalogListener, LayerGroupInfo, LayerInfo, NamespaceInfo,
    ResourceInfo, StoreInfo, StyleInfo, WorkspaceInfo,
};
use crate::error::{Result, SyncError};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Style keys are (workspace, name); global styles have no workspace
type StyleKey = (Option<String>, String);

/// In-memory catalog with synchronous listener notification
#[derive(Default)]
pub struct MemoryCatalog {
    workspaces: RwLock<HashMap<String, WorkspaceInfo>>,
    namespaces: RwLock<HashMap<String, NamespaceInfo>>,
    stores: RwLock<HashMap<(String, String), StoreInfo>>,
    resources: RwLock<HashMap<(String, String), ResourceInfo>>,
    styles: RwLock<HashMap<StyleKey, StyleInfo>>,
    layers: RwLock<HashMap<String, LayerInfo>>,
    layer_groups: RwLock<HashMap<String, LayerGroupInfo>>,
    /// Filenames of style files known to this node (purge target)
    style_files: RwLock<HashSet<String>>,
    listeners: RwLock<Vec<Arc<dyn CatalogListener>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the backing file for a style is still present
    pub fn style_file_exists(&self, filename: &str) -> bool {
        self.style_files.read().contains(filename)
    }

    fn notify(&self, event: &CatalogEvent) {
        // Snapshot under the read lock, invoke outside it: a listener may
        // re-enter the catalog.
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.handle_event(event);
        }
    }

    fn insert(&self, info: &CatalogInfo) -> Result<()> {
        match info {
            CatalogInfo::Workspace(ws) => {
                Self::insert_unique(&self.workspaces, ws.name.clone(), ws.clone(), info)
            }
            CatalogInfo::Namespace(ns) => {
                Self::insert_unique(&self.namespaces, ns.prefix.clone(), ns.clone(), info)
            }
            CatalogInfo::Store(store) => Self::insert_unique(
                &self.stores,
                (store.workspace.name.clone(), store.name.clone()),
                store.clone(),
                info,
            ),
            CatalogInfo::Resource(res) => Self::insert_unique(
                &self.resources,
                (res.namespace.prefix.clone(), res.name.clone()),
                res.clone(),
                info,
            ),
            CatalogInfo::Style(style) => {
                Self::insert_unique(
                    &self.styles,
                    (style.workspace.as_ref().map(|ws| ws.name.clone()), style.name.clone()),
                    style.clone(),
                    info,
                )?;
                self.style_files.write().insert(style.filename.clone());
                Ok(())
            }
            CatalogInfo::Layer(layer) => {
                Self::insert_unique(&self.layers, layer.name.clone(), layer.clone(), info)
            }
            CatalogInfo::LayerGroup(group) => {
                Self::insert_unique(&self.layer_groups, group.name.clone(), group.clone(), info)
            }
        }
    }

    fn insert_unique<K, V>(
        map: &RwLock<HashMap<K, V>>,
        key: K,
        value: V,
        info: &CatalogInfo,
    ) -> Result<()>
    where
        K: std::hash::Hash + Eq,
    {
        let mut guard = map.write();
        if guard.contains_key(&key) {
            return Err(SyncError::apply(format!(
                "{} '{}' already exists in the local catalog",
                info.kind(),
                info.name()
            )));
        }
        guard.insert(key, value);
        Ok(())
    }

    fn delete(&self, info: &CatalogInfo) -> Result<()> {
        let removed = match info {
            CatalogInfo::Workspace(ws) => self.workspaces.write().remove(&ws.name).is_some(),
            CatalogInfo::Namespace(ns) => self.namespaces.write().remove(&ns.prefix).is_some(),
            CatalogInfo::Store(store) => self
                .stores
                .write()
                .remove(&(store.workspace.name.clone(), store.name.clone()))
                .is_some(),
            CatalogInfo::Resource(res) => self
                .resources
                .write()
                .remove(&(res.namespace.prefix.clone(), res.name.clone()))
                .is_some(),
            CatalogInfo::Style(style) => self
                .styles
                .write()
                .remove(&(style.workspace.as_ref().map(|ws| ws.name.clone()), style.name.clone()))
                .is_some(),
            CatalogInfo::Layer(layer) => self.layers.write().remove(&layer.name).is_some(),
            CatalogInfo::LayerGroup(group) => {
                self.layer_groups.write().remove(&group.name).is_some()
            }
        };
        if removed {
            Ok(())
        } else {
            Err(SyncError::apply(format!(
                "{} '{}' not found in the local catalog",
                info.kind(),
                info.name()
            )))
        }
    }

    fn replace(&self, info: &CatalogInfo) -> Result<()> {
        // save() must target an existing object; delete-then-insert keeps the
        // natural-key indexes consistent if the name itself changed.
        self.delete(info)
            .map_err(|_| {
                SyncError::apply(format!(
                    "cannot save {} '{}': not present in the local catalog",
                    info.kind(),
                    info.name()
                ))
            })
            .and_then(|()| self.insert(info))
    }
}

impl Catalog for MemoryCatalog {
    fn add(&self, info: CatalogInfo) -> Result<()> {
        self.insert(&info)?;
        debug!(kind = info.kind(), name = info.name(), "Catalog add");
        self.notify(&CatalogEvent::Added(info));
        Ok(())
    }

    fn remove(&self, info: &CatalogInfo) -> Result<()> {
        self.delete(info)?;
        debug!(kind = info.kind(), name = info.name(), "Catalog remove");
        self.notify(&CatalogEvent::Removed(info.clone()));
        Ok(())
    }

    fn save(&self, info: CatalogInfo) -> Result<()> {
        self.replace(&info)
    }

    fn fire_post_modified(&self, info: &CatalogInfo) -> Result<()> {
        debug!(kind = info.kind(), name = info.name(), "Catalog post-modify");
        self.notify(&CatalogEvent::PostModified(info.clone()));
        Ok(())
    }

    fn purge_style(&self, style: &StyleInfo) -> Result<()> {
        if self.style_files.write().remove(&style.filename) {
            debug!(style = %style.name, filename = %style.filename, "Purged style file");
            Ok(())
        } else {
            Err(SyncError::apply(format!(
                "style file '{}' not found",
                style.filename
            )))
        }
    }

    fn workspace_by_name(&self, name: &str) -> Option<WorkspaceInfo> {
        self.workspaces.read().get(name).cloned()
    }

    fn namespace_by_prefix(&self, prefix: &str) -> Option<NamespaceInfo> {
        self.namespaces.read().get(prefix).cloned()
    }

    fn store_by_name(&self, workspace: &str, name: &str) -> Option<StoreInfo> {
        self.stores
            .read()
            .get(&(workspace.to_string(), name.to_string()))
            .cloned()
    }

    fn resource_by_name(&self, namespace: &str, name: &str) -> Option<ResourceInfo> {
        self.resources
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    fn style_by_name(&self, workspace: Option<&str>, name: &str) -> Option<StyleInfo> {
        self.styles
            .read()
            .get(&(workspace.map(str::to_string), name.to_string()))
            .cloned()
    }

    fn layer_by_name(&self, name: &str) -> Option<LayerInfo> {
        self.layers.read().get(name).cloned()
    }

    fn layer_group_by_name(&self, name: &str) -> Option<LayerGroupInfo> {
        self.layer_groups.read().get(name).cloned()
    }

    fn add_listener(&self, listener: Arc<dyn CatalogListener>) {
        self.listeners.write().push(listener);
    }
}

//! # Object-Graph Localization
//!
//! Re-resolves every cross-reference inside an incoming object graph against
//! the *local* catalog's identity space before any mutation.
//!
//! Objects arriving from another node carry that node's opaque ids; only
//! natural keys (names within a workspace/namespace) are meaningful across
//! the cluster. Each function below returns a copy of its input whose
//! references point at objects already present locally, or fails cleanly when
//! a referenced parent does not exist; a partially-wired object must never
//! reach the catalog.
//!
//! The object at the top of the graph keeps its incoming state; if it is not
//! yet known locally it is assigned a fresh local id.

use super::{
    Catalog, CatalogInfo, LayerGroupInfo, LayerInfo, NamespaceInfo, ResourceInfo, StoreInfo,
    StyleInfo, WorkspaceInfo,
};
use crate::error::{Result, SyncError};

fn missing(kind: &str, name: &str) -> SyncError {
    SyncError::apply(format!("referenced {kind} '{name}' does not exist locally"))
}

/// Localize a workspace: adopts the local id when a workspace with the same
/// name exists, keeps the incoming state either way.
pub fn localize_workspace(info: &WorkspaceInfo, catalog: &dyn Catalog) -> WorkspaceInfo {
    let id = catalog
        .workspace_by_name(&info.name)
        .map_or_else(super::local_id, |local| local.id);
    WorkspaceInfo {
        id,
        name: info.name.clone(),
    }
}

/// Localize a namespace by prefix
pub fn localize_namespace(info: &NamespaceInfo, catalog: &dyn Catalog) -> NamespaceInfo {
    let id = catalog
        .namespace_by_prefix(&info.prefix)
        .map_or_else(super::local_id, |local| local.id);
    NamespaceInfo {
        id,
        prefix: info.prefix.clone(),
        uri: info.uri.clone(),
    }
}

/// Localize a store; its parent workspace must already exist locally
pub fn localize_store(info: &StoreInfo, catalog: &dyn Catalog) -> Result<StoreInfo> {
    let workspace = catalog
        .workspace_by_name(&info.workspace.name)
        .ok_or_else(|| missing("workspace", &info.workspace.name))?;

    let id = catalog
        .store_by_name(&workspace.name, &info.name)
        .map_or_else(super::local_id, |local| local.id);

    Ok(StoreInfo {
        id,
        name: info.name.clone(),
        workspace,
        connection: info.connection.clone(),
        enabled: info.enabled,
    })
}

/// Localize a resource; its namespace and parent store must exist locally
pub fn localize_resource(info: &ResourceInfo, catalog: &dyn Catalog) -> Result<ResourceInfo> {
    let namespace = catalog
        .namespace_by_prefix(&info.namespace.prefix)
        .ok_or_else(|| missing("namespace", &info.namespace.prefix))?;
    let store = catalog
        .store_by_name(&info.store.workspace.name, &info.store.name)
        .ok_or_else(|| missing("store", &info.store.name))?;

    let id = catalog
        .resource_by_name(&namespace.prefix, &info.name)
        .map_or_else(super::local_id, |local| local.id);

    Ok(ResourceInfo {
        id,
        name: info.name.clone(),
        namespace,
        store,
        title: info.title.clone(),
    })
}

/// Localize a style; its workspace, when set, must exist locally
pub fn localize_style(info: &StyleInfo, catalog: &dyn Catalog) -> Result<StyleInfo> {
    let workspace = match &info.workspace {
        Some(ws) => Some(
            catalog
                .workspace_by_name(&ws.name)
                .ok_or_else(|| missing("workspace", &ws.name))?,
        ),
        None => None,
    };

    let ws_name = workspace.as_ref().map(|ws| ws.name.as_str());
    let id = catalog
        .style_by_name(ws_name, &info.name)
        .map_or_else(super::local_id, |local| local.id);

    Ok(StyleInfo {
        id,
        name: info.name.clone(),
        workspace,
        filename: info.filename.clone(),
    })
}

/// Localize a layer; its resource and every attached style must exist locally
pub fn localize_layer(info: &LayerInfo, catalog: &dyn Catalog) -> Result<LayerInfo> {
    let resource = catalog
        .resource_by_name(&info.resource.namespace.prefix, &info.resource.name)
        .ok_or_else(|| missing("resource", &info.resource.name))?;

    let default_style = lookup_style(&info.default_style, catalog)?;
    let styles = info
        .styles
        .iter()
        .map(|style| lookup_style(style, catalog))
        .collect::<Result<Vec<_>>>()?;

    let id = catalog
        .layer_by_name(&info.name)
        .map_or_else(super::local_id, |local| local.id);

    Ok(LayerInfo {
        id,
        name: info.name.clone(),
        resource,
        default_style,
        styles,
    })
}

/// Localize a layer group; its workspace (when set) and every member layer
/// must exist locally
pub fn localize_layer_group(info: &LayerGroupInfo, catalog: &dyn Catalog) -> Result<LayerGroupInfo> {
    let workspace = match &info.workspace {
        Some(ws) => Some(
            catalog
                .workspace_by_name(&ws.name)
                .ok_or_else(|| missing("workspace", &ws.name))?,
        ),
        None => None,
    };

    let layers = info
        .layers
        .iter()
        .map(|layer| {
            catalog
                .layer_by_name(&layer.name)
                .ok_or_else(|| missing("layer", &layer.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let id = catalog
        .layer_group_by_name(&info.name)
        .map_or_else(super::local_id, |local| local.id);

    Ok(LayerGroupInfo {
        id,
        name: info.name.clone(),
        workspace,
        layers,
    })
}

/// Localize any catalog object by kind. The match is exhaustive by
/// construction, so an unhandled object kind is a compile error rather than a
/// silently dropped message.
pub fn localize_info(info: &CatalogInfo, catalog: &dyn Catalog) -> Result<CatalogInfo> {
    Ok(match info {
        CatalogInfo::Workspace(ws) => CatalogInfo::Workspace(localize_workspace(ws, catalog)),
        CatalogInfo::Namespace(ns) => CatalogInfo::Namespace(localize_namespace(ns, catalog)),
        CatalogInfo::Store(store) => CatalogInfo::Store(localize_store(store, catalog)?),
        CatalogInfo::Resource(res) => CatalogInfo::Resource(localize_resource(res, catalog)?),
        CatalogInfo::Style(style) => CatalogInfo::Style(localize_style(style, catalog)?),
        CatalogInfo::Layer(layer) => CatalogInfo::Layer(localize_layer(layer, catalog)?),
        CatalogInfo::LayerGroup(group) => {
            CatalogInfo::LayerGroup(localize_layer_group(group, catalog)?)
        }
    })
}

// A style reference inside a layer must resolve, unlike a style being added,
// so this is a strict lookup rather than a localization.
fn lookup_style(style: &StyleInfo, catalog: &dyn Catalog) -> Result<StyleInfo> {
    let ws_name = style.workspace.as_ref().map(|ws| ws.name.as_str());
    catalog
        .style_by_name(ws_name, &style.name)
        .ok_or_else(|| missing("style", &style.name))
}

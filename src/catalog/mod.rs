//! # Catalog Collaborator Model
//!
//! Domain objects, mutation events, and the catalog boundary the
//! synchronization engine calls into.
//!
//! ## Overview
//!
//! The catalog is an external collaborator: the engine only needs `add`,
//! `remove`, `fire_post_modified` and the by-natural-key lookups used for
//! localization. Object ids are node-local and opaque; cross-node matching is
//! always by natural key (name within workspace/namespace), never by id.
//!
//! A thread-safe in-memory implementation lives in [`memory`]; reference
//! localization lives in [`localize`].

pub mod localize;
pub mod memory;

pub use memory::MemoryCatalog;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Mint a fresh node-local object id
pub fn local_id() -> String {
    Uuid::new_v4().to_string()
}

/// A workspace groups stores and styles under one name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
}

/// A namespace pairs a prefix with a URI; resources live inside one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub id: String,
    pub prefix: String,
    pub uri: String,
}

/// A data store, parented under a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub id: String,
    pub name: String,
    pub workspace: WorkspaceInfo,
    pub connection: HashMap<String, String>,
    pub enabled: bool,
}

/// A published resource (feature type / coverage), parented under a store
/// and qualified by a namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: String,
    pub name: String,
    pub namespace: NamespaceInfo,
    pub store: StoreInfo,
    pub title: Option<String>,
}

/// A style, optionally scoped to a workspace, backed by a style file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleInfo {
    pub id: String,
    pub name: String,
    pub workspace: Option<WorkspaceInfo>,
    pub filename: String,
}

/// A layer publishing one resource with a default style and alternates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: String,
    pub name: String,
    pub resource: ResourceInfo,
    pub default_style: StyleInfo,
    pub styles: Vec<StyleInfo>,
}

/// A named grouping of layers, optionally scoped to a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerGroupInfo {
    pub id: String,
    pub name: String,
    pub workspace: Option<WorkspaceInfo>,
    pub layers: Vec<LayerInfo>,
}

/// The closed set of catalog object kinds.
///
/// Being a closed enum, every match over it is exhaustive: an unrecognized
/// object kind is unrepresentable rather than silently skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogInfo {
    Workspace(WorkspaceInfo),
    Namespace(NamespaceInfo),
    Store(StoreInfo),
    Resource(ResourceInfo),
    Style(StyleInfo),
    Layer(LayerInfo),
    LayerGroup(LayerGroupInfo),
}

impl CatalogInfo {
    /// Object kind as a stable lowercase label (used in logs and errors)
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogInfo::Workspace(_) => "workspace",
            CatalogInfo::Namespace(_) => "namespace",
            CatalogInfo::Store(_) => "store",
            CatalogInfo::Resource(_) => "resource",
            CatalogInfo::Style(_) => "style",
            CatalogInfo::Layer(_) => "layer",
            CatalogInfo::LayerGroup(_) => "layer_group",
        }
    }

    /// Node-local opaque id of the wrapped object
    pub fn id(&self) -> &str {
        match self {
            CatalogInfo::Workspace(info) => &info.id,
            CatalogInfo::Namespace(info) => &info.id,
            CatalogInfo::Store(info) => &info.id,
            CatalogInfo::Resource(info) => &info.id,
            CatalogInfo::Style(info) => &info.id,
            CatalogInfo::Layer(info) => &info.id,
            CatalogInfo::LayerGroup(info) => &info.id,
        }
    }

    /// Natural name of the wrapped object (prefix for namespaces)
    pub fn name(&self) -> &str {
        match self {
            CatalogInfo::Workspace(info) => &info.name,
            CatalogInfo::Namespace(info) => &info.prefix,
            CatalogInfo::Store(info) => &info.name,
            CatalogInfo::Resource(info) => &info.name,
            CatalogInfo::Style(info) => &info.name,
            CatalogInfo::Layer(info) => &info.name,
            CatalogInfo::LayerGroup(info) => &info.name,
        }
    }
}

/// A catalog mutation notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CatalogEvent {
    Added(CatalogInfo),
    Removed(CatalogInfo),
    PostModified(CatalogInfo),
}

impl CatalogEvent {
    /// Stable event-kind label, e.g. `catalog.added/workspace`
    pub fn kind(&self) -> String {
        let (verb, info) = match self {
            CatalogEvent::Added(info) => ("added", info),
            CatalogEvent::Removed(info) => ("removed", info),
            CatalogEvent::PostModified(info) => ("post_modified", info),
        };
        format!("catalog.{verb}/{}", info.kind())
    }

    /// The catalog object the event refers to
    pub fn info(&self) -> &CatalogInfo {
        match self {
            CatalogEvent::Added(info)
            | CatalogEvent::Removed(info)
            | CatalogEvent::PostModified(info) => info,
        }
    }
}

/// Listener invoked synchronously, on the mutating thread, for every catalog
/// mutation. The producer-side sync listener hangs off this seam.
pub trait CatalogListener: Send + Sync {
    fn handle_event(&self, event: &CatalogEvent);
}

/// The catalog boundary the synchronization engine depends on.
///
/// Implementations own their internal locking; the engine never serializes
/// catalog access itself.
pub trait Catalog: Send + Sync {
    /// Add an object; duplicate natural keys are an error. Fires
    /// [`CatalogEvent::Added`] to registered listeners on success.
    fn add(&self, info: CatalogInfo) -> Result<()>;

    /// Remove an object by natural key; a missing object is an error. Fires
    /// [`CatalogEvent::Removed`] on success.
    fn remove(&self, info: &CatalogInfo) -> Result<()>;

    /// Replace the stored state of an existing object without firing events
    fn save(&self, info: CatalogInfo) -> Result<()>;

    /// Fire a [`CatalogEvent::PostModified`] notification for an object
    fn fire_post_modified(&self, info: &CatalogInfo) -> Result<()>;

    /// Drop the style file backing a style (the `purge` side channel of a
    /// style removal)
    fn purge_style(&self, style: &StyleInfo) -> Result<()>;

    fn workspace_by_name(&self, name: &str) -> Option<WorkspaceInfo>;
    fn namespace_by_prefix(&self, prefix: &str) -> Option<NamespaceInfo>;
    fn store_by_name(&self, workspace: &str, name: &str) -> Option<StoreInfo>;
    fn resource_by_name(&self, namespace: &str, name: &str) -> Option<ResourceInfo>;
    fn style_by_name(&self, workspace: Option<&str>, name: &str) -> Option<StyleInfo>;
    fn layer_by_name(&self, name: &str) -> Option<LayerInfo>;
    fn layer_group_by_name(&self, name: &str) -> Option<LayerGroupInfo>;

    /// Register a listener receiving synchronous mutation notifications
    fn add_listener(&self, listener: Arc<dyn CatalogListener>);
}

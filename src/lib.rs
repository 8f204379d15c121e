#![allow(clippy::doc_markdown)] // Allow technical terms like JSON, RAII in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # GeoCluster Core
//!
//! Event-synchronization engine for clustered catalog deployments.
//!
//! ## Overview
//!
//! A cluster of nodes each holds its own catalog of geospatial configuration
//! objects (workspaces, stores, layers, styles). When one node mutates its
//! catalog, that mutation is captured as an event, serialized, and published
//! to a shared topic; every other node consumes the message and replays the
//! mutation against its own catalog. The engine keeps the catalogs converged
//! without any node ever holding a global lock.
//!
//! ## Key Features
//!
//! - **Pluggable Handler Contract**: Every event type is served by an
//!   [`handler::EventHandler`] that owns serialization, deserialization and
//!   local application
//! - **Priority-Ranked Registry**: [`handler::HandlerRegistry`] resolves the
//!   best handler per event with a failover chain across factories
//! - **Replication-Loop Safety**: [`sync::ToggleState`] suppresses the
//!   producer gate while inbound events are applied, so a replayed mutation
//!   never re-publishes
//! - **Object-Graph Localization**: Inbound catalog objects are re-attached
//!   to the local catalog by natural key before application
//! - **Role-Based Nodes**: master, slave and master-slave roles decide which
//!   direction of the event flow a node participates in
//!
//! ## Module Organization
//!
//! - [`catalog`] - Catalog objects, events, listeners and localization
//! - [`handler`] - Handler contract, factories and the priority registry
//! - [`messaging`] - Message envelopes and the transport abstraction
//! - [`sync`] - Publisher, synchronizer, toggles and the consumer container
//! - [`node`] - Composition root wiring one cluster member
//! - [`config`] - Node configuration with file persistence and env overrides
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geocluster_core::config::{ClusterConfig, NodeRole};
//! use geocluster_core::messaging::InProcessBroker;
//! use geocluster_core::node::ClusterNode;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = Arc::new(InProcessBroker::new());
//!
//! let mut config = ClusterConfig::default();
//! config.role = NodeRole::MasterSlave;
//!
//! let mut node = ClusterNode::new(config, broker)?;
//! node.start();
//! node.configuration_loaded();
//!
//! // Mutations on node.catalog() now replicate to every other node
//! // sharing the broker.
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod node;
pub mod sync;

pub use config::{ClusterConfig, NodeRole};
pub use error::{Result, SyncError};
pub use node::ClusterNode;

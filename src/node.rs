//! # Cluster Node Composition Root
//!
//! Explicit wiring of one node: configuration, catalog, handler registry,
//! toggles, publisher pump and consumer container. Everything is constructed
//! and owned here; there is no process-wide singleton; hosting processes
//! build a [`ClusterNode`] (or wire the pieces themselves) and keep the
//! handle.
//!
//! Lifecycle: the producer gate starts disabled and stays disabled until
//! [`ClusterNode::configuration_loaded`] signals that the node has finished
//! loading its own configuration, since publishing before that would flood the
//! cluster with "I just loaded everything" events.

use crate::catalog::{Catalog, CatalogEvent, MemoryCatalog};
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::handler::catalog::default_factories;
use crate::handler::HandlerRegistry;
use crate::messaging::{Destination, InProcessBroker, MessageProperties, INSTANCE_NAME_KEY};
use crate::sync::{
    listener::spawn_publish_pump, CatalogSyncListener, ConsumerContainer, EventPublisher,
    Synchronizer, ToggleEvent, ToggleState,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// One fully wired cluster member
pub struct ClusterNode {
    config: ClusterConfig,
    catalog: Arc<MemoryCatalog>,
    toggle: Arc<ToggleState>,
    publisher: Arc<EventPublisher<CatalogEvent>>,
    broker: Arc<InProcessBroker>,
    destination: Destination,
    container: ConsumerContainer<CatalogEvent>,
    pump: Option<JoinHandle<()>>,
}

impl ClusterNode {
    /// Wire a node against a shared broker. The node is inert until
    /// [`start`](Self::start) is called.
    pub fn new(config: ClusterConfig, broker: Arc<InProcessBroker>) -> Result<Self> {
        let catalog = Arc::new(MemoryCatalog::new());
        // Producer always starts disabled; the configuration-loaded signal
        // enables it for producing roles. The consumer gate follows the role
        // immediately.
        let toggle = Arc::new(ToggleState::new(false, config.role.consumes()));

        let registry = Arc::new(HandlerRegistry::new(default_factories(catalog.clone()))?);
        let publisher = Arc::new(EventPublisher::new(registry.clone()));
        let synchronizer = Arc::new(Synchronizer::new(
            registry,
            toggle.clone(),
            config.instance_name.clone(),
        ));
        let container = ConsumerContainer::new(synchronizer, toggle.clone());
        let destination = Destination::new(config.topic.clone());

        Ok(Self {
            config,
            catalog,
            toggle,
            publisher,
            broker,
            destination,
            container,
            pump: None,
        })
    }

    /// Attach the producer listener and, for consuming roles, subscribe to
    /// the cluster topic.
    pub fn start(&mut self) {
        let (listener, outbound) = CatalogSyncListener::new(self.toggle.clone());
        self.catalog.add_listener(listener);

        let mut base_properties = MessageProperties::new();
        base_properties.insert(
            INSTANCE_NAME_KEY.to_string(),
            self.config.instance_name.clone(),
        );
        self.pump = Some(spawn_publish_pump(
            outbound,
            self.publisher.clone(),
            self.broker.clone(),
            self.destination.clone(),
            base_properties,
        ));

        if self.config.role.consumes() {
            self.container
                .connect(self.broker.subscribe(&self.destination));
        }

        info!(
            instance_name = %self.config.instance_name,
            role = ?self.config.role,
            topic = %self.destination.topic,
            "Cluster node started"
        );
    }

    /// Lifecycle signal: the node finished loading its own configuration.
    /// Enables the producer gate for producing roles.
    pub fn configuration_loaded(&self) {
        info!(
            instance_name = %self.config.instance_name,
            producer = self.config.role.produces(),
            "Configuration loaded, settling producer gate"
        );
        self.toggle.set_producer_enabled(self.config.role.produces());
    }

    /// Administrative toggle, e.g. an operator flipping master/slave roles
    /// at runtime
    pub fn apply_toggle(&self, event: ToggleEvent) {
        self.toggle.apply(event);
    }

    /// Stop consuming and publishing
    pub async fn shutdown(&mut self) {
        self.container.disconnect().await;
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        info!(instance_name = %self.config.instance_name, "Cluster node stopped");
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<MemoryCatalog> {
        self.catalog.clone()
    }

    pub fn toggle(&self) -> Arc<ToggleState> {
        self.toggle.clone()
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

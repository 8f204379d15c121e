//! # Handler Factory Registry
//!
//! Holds the factories registered at process start and answers the two
//! resolution queries of the replication protocol:
//!
//! 1. **By capability** (producer side): walk the factories accepting the
//!    event in ascending priority order and return the first handler that
//!    constructs successfully, forming a failover chain, so a misconfigured factory
//!    degrades resolution instead of failing it.
//! 2. **By identifier** (consumer side): exact lookup by the id carried in
//!    the message's property bag, skipping the capability search entirely.
//!
//! The registry is built from an explicit list handed to its constructor by
//! the composition root; there is no ambient singleton and no runtime
//! discovery.

use super::{EventHandler, HandlerFactory, SyncEvent};
use crate::error::{Result, SyncError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable registry of handler factories
pub struct HandlerRegistry<O: SyncEvent> {
    /// Registration order is preserved and breaks priority ties
    factories: Vec<Arc<dyn HandlerFactory<O>>>,
    by_id: HashMap<&'static str, Arc<dyn HandlerFactory<O>>>,
}

impl<O: SyncEvent> HandlerRegistry<O> {
    /// Build a registry from the factories present at startup.
    ///
    /// Fails if two factories share an identifier: the id is the wire-level
    /// resolution key, so duplicates would make consumer-side resolution
    /// ambiguous.
    pub fn new(factories: Vec<Arc<dyn HandlerFactory<O>>>) -> Result<Self> {
        let mut by_id: HashMap<&'static str, Arc<dyn HandlerFactory<O>>> = HashMap::new();
        for factory in &factories {
            if by_id.insert(factory.id(), factory.clone()).is_some() {
                return Err(SyncError::duplicate_handler_id(factory.id()));
            }
        }
        debug!(count = factories.len(), "Handler registry initialized");
        Ok(Self { factories, by_id })
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Producer-side resolution: best handler for a local event
    pub fn handler_for_event(&self, event: &O) -> Result<Box<dyn EventHandler<O>>> {
        let mut candidates: Vec<&Arc<dyn HandlerFactory<O>>> = self
            .factories
            .iter()
            .filter(|factory| factory.can_handle(event))
            .collect();
        // Stable sort keeps registration order among equal priorities.
        candidates.sort_by_key(|factory| factory.priority());

        for factory in candidates {
            match factory.create_handler() {
                Ok(handler) => {
                    debug!(
                        handler_id = factory.id(),
                        event_kind = %event.kind(),
                        "Resolved handler by capability"
                    );
                    return Ok(handler);
                }
                Err(err) => {
                    // Failover: fall through to the next-ranked candidate.
                    warn!(
                        handler_id = factory.id(),
                        error = %err,
                        "Handler factory failed to construct, trying next candidate"
                    );
                }
            }
        }

        let event_kind = event.kind();
        warn!(event_kind = %event_kind, "No handler factory accepted the event");
        Err(SyncError::no_handler_for_event(event_kind))
    }

    /// Consumer-side resolution: exact lookup by the identifier carried in a
    /// message's property bag
    pub fn handler_for_id(&self, handler_id: &str) -> Result<Box<dyn EventHandler<O>>> {
        match self.by_id.get(handler_id) {
            Some(factory) => factory.create_handler(),
            None => {
                warn!(handler_id = %handler_id, "No handler factory registered under id");
                Err(SyncError::no_handler_for_id(handler_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::MessageProperties;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct TestEvent(String);

    impl SyncEvent for TestEvent {
        fn kind(&self) -> String {
            self.0.clone()
        }
    }

    struct TestHandler {
        factory_id: &'static str,
        properties: MessageProperties,
    }

    impl EventHandler<TestEvent> for TestHandler {
        fn factory_id(&self) -> &'static str {
            self.factory_id
        }
        fn serialize(&self, event: &TestEvent) -> Result<String> {
            Ok(event.0.clone())
        }
        fn deserialize(&self, payload: &str) -> Result<TestEvent> {
            Ok(TestEvent(payload.to_string()))
        }
        fn synchronize(&mut self, _event: TestEvent) -> Result<bool> {
            Ok(true)
        }
        fn set_properties(&mut self, properties: MessageProperties) {
            self.properties = properties;
        }
        fn properties(&self) -> &MessageProperties {
            &self.properties
        }
    }

    struct TestFactory {
        id: &'static str,
        priority: i32,
        accepts: &'static str,
        fail_construction: bool,
        created: AtomicUsize,
    }

    impl TestFactory {
        fn new(id: &'static str, priority: i32, accepts: &'static str) -> Arc<Self> {
            Arc::new(Self {
                id,
                priority,
                accepts,
                fail_construction: false,
                created: AtomicUsize::new(0),
            })
        }

        fn failing(id: &'static str, priority: i32, accepts: &'static str) -> Arc<Self> {
            Arc::new(Self {
                id,
                priority,
                accepts,
                fail_construction: true,
                created: AtomicUsize::new(0),
            })
        }
    }

    impl HandlerFactory<TestEvent> for TestFactory {
        fn id(&self) -> &'static str {
            self.id
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn can_handle(&self, event: &TestEvent) -> bool {
            event.0 == self.accepts
        }
        fn create_handler(&self) -> Result<Box<dyn EventHandler<TestEvent>>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            if self.fail_construction {
                return Err(SyncError::configuration("factory misconfigured"));
            }
            Ok(Box::new(TestHandler {
                factory_id: self.id,
                properties: MessageProperties::new(),
            }))
        }
    }

    #[test]
    fn test_lowest_priority_matching_factory_wins() {
        let low = TestFactory::new("low", 10, "evt");
        let high = TestFactory::new("high", 1, "evt");
        let registry = HandlerRegistry::new(vec![low.clone() as _, high.clone() as _]).unwrap();

        let handler = registry.handler_for_event(&TestEvent("evt".into())).unwrap();
        assert_eq!(handler.factory_id(), "high");
        assert_eq!(low.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failover_to_next_candidate() {
        let broken = TestFactory::failing("broken", 1, "evt");
        let fallback = TestFactory::new("fallback", 5, "evt");
        let registry =
            HandlerRegistry::new(vec![fallback.clone() as _, broken.clone() as _]).unwrap();

        let handler = registry.handler_for_event(&TestEvent("evt".into())).unwrap();
        assert_eq!(handler.factory_id(), "fallback");
        assert_eq!(broken.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_matching_factory_names_event_kind() {
        let registry =
            HandlerRegistry::new(vec![TestFactory::new("only", 1, "other") as _]).unwrap();
        // Handlers are not Debug, so drop the Ok side before unwrapping.
        let err = registry
            .handler_for_event(&TestEvent("evt".into()))
            .map(|_| ())
            .unwrap_err();
        assert!(err.is_no_handler_found());
        assert!(err.to_string().contains("evt"));
    }

    #[test]
    fn test_resolution_by_id_skips_predicate() {
        // The factory does not accept the event, but by-id lookup must still
        // return it: the producer already proved the match.
        let registry =
            HandlerRegistry::new(vec![TestFactory::new("exact", 1, "nothing") as _]).unwrap();
        let handler = registry.handler_for_id("exact").unwrap();
        assert_eq!(handler.factory_id(), "exact");

        let err = registry.handler_for_id("absent").map(|_| ()).unwrap_err();
        assert!(err.is_no_handler_found());
    }

    #[test]
    fn test_duplicate_ids_rejected_at_construction() {
        let err = HandlerRegistry::new(vec![
            TestFactory::new("dup", 1, "a") as _,
            TestFactory::new("dup", 2, "b") as _,
        ])
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateHandlerId { .. }));
    }

    #[test]
    fn test_registration_order_breaks_priority_ties() {
        let first = TestFactory::new("first", 3, "evt");
        let second = TestFactory::new("second", 3, "evt");
        let registry = HandlerRegistry::new(vec![first as _, second as _]).unwrap();

        let handler = registry.handler_for_event(&TestEvent("evt".into())).unwrap();
        assert_eq!(handler.factory_id(), "first");
    }
}

//! # Producer/Consumer Toggles
//!
//! Per-node boolean gates deciding whether local mutations are published and
//! whether remote messages are applied, plus the suppression guard that
//! disables publication for the duration of a replay.
//!
//! Both flags are plain atomics read by arbitrary application threads and
//! written by the delivery task; there is no lock to contend on (the original
//! implementation synchronized on an interned boxed boolean, which this
//! design deliberately replaces).

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Which gate a [`ToggleEvent`] flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleRole {
    Producer,
    Consumer,
}

/// Administrative notification flipping a gate at runtime, e.g. a master/
/// slave role change or the end of configuration loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEvent {
    pub role: ToggleRole,
    pub enabled: bool,
}

impl ToggleEvent {
    pub fn new(role: ToggleRole, enabled: bool) -> Self {
        Self { role, enabled }
    }
}

/// Atomic producer/consumer gates for one node
#[derive(Debug)]
pub struct ToggleState {
    producer_enabled: AtomicBool,
    consumer_enabled: AtomicBool,
}

impl ToggleState {
    /// Both gates default from configuration; the producer commonly starts
    /// disabled until the node finishes loading its own configuration.
    pub fn new(producer_enabled: bool, consumer_enabled: bool) -> Self {
        Self {
            producer_enabled: AtomicBool::new(producer_enabled),
            consumer_enabled: AtomicBool::new(consumer_enabled),
        }
    }

    pub fn is_producer_enabled(&self) -> bool {
        self.producer_enabled.load(Ordering::SeqCst)
    }

    pub fn is_consumer_enabled(&self) -> bool {
        self.consumer_enabled.load(Ordering::SeqCst)
    }

    /// Idempotent: setting the current value is a no-op and is not logged.
    pub fn set_producer_enabled(&self, enabled: bool) {
        if self.producer_enabled.swap(enabled, Ordering::SeqCst) != enabled {
            info!(enabled = enabled, "Producer toggle changed");
        }
    }

    pub fn set_consumer_enabled(&self, enabled: bool) {
        if self.consumer_enabled.swap(enabled, Ordering::SeqCst) != enabled {
            info!(enabled = enabled, "Consumer toggle changed");
        }
    }

    /// Apply an administrative toggle notification
    pub fn apply(&self, event: ToggleEvent) {
        match event.role {
            ToggleRole::Producer => self.set_producer_enabled(event.enabled),
            ToggleRole::Consumer => self.set_consumer_enabled(event.enabled),
        }
    }

    /// Disable the producer for the lifetime of the returned guard.
    ///
    /// Dropping the guard restores the pre-call state unconditionally, so the
    /// flag cannot leak even when the replay panics or errors out mid-apply.
    pub fn suppress_producer(&self) -> SuppressionGuard<'_> {
        let previous = self.producer_enabled.swap(false, Ordering::SeqCst);
        debug!(was_enabled = previous, "Producer suppressed for replay");
        SuppressionGuard {
            toggle: self,
            previous,
        }
    }
}

/// RAII guard holding the producer disabled during a replay
#[must_use = "dropping the guard immediately would end suppression"]
pub struct SuppressionGuard<'a> {
    toggle: &'a ToggleState,
    previous: bool,
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.toggle
            .producer_enabled
            .store(self.previous, Ordering::SeqCst);
        debug!(restored = self.previous, "Producer suppression released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_idempotent() {
        let toggle = ToggleState::new(true, false);
        toggle.set_producer_enabled(true);
        assert!(toggle.is_producer_enabled());
        toggle.set_producer_enabled(false);
        toggle.set_producer_enabled(false);
        assert!(!toggle.is_producer_enabled());
    }

    #[test]
    fn test_roles_flip_independently() {
        let toggle = ToggleState::new(false, false);
        toggle.apply(ToggleEvent::new(ToggleRole::Consumer, true));
        assert!(toggle.is_consumer_enabled());
        assert!(!toggle.is_producer_enabled());

        toggle.apply(ToggleEvent::new(ToggleRole::Producer, true));
        assert!(toggle.is_producer_enabled());
    }

    #[test]
    fn test_guard_restores_enabled_state() {
        let toggle = ToggleState::new(true, true);
        {
            let _guard = toggle.suppress_producer();
            assert!(!toggle.is_producer_enabled());
        }
        assert!(toggle.is_producer_enabled());
    }

    #[test]
    fn test_guard_restores_disabled_state() {
        let toggle = ToggleState::new(false, true);
        {
            let _guard = toggle.suppress_producer();
            assert!(!toggle.is_producer_enabled());
        }
        assert!(!toggle.is_producer_enabled());
    }

    #[test]
    fn test_nested_guards_unwind_in_order() {
        let toggle = ToggleState::new(true, true);
        {
            let _outer = toggle.suppress_producer();
            {
                let _inner = toggle.suppress_producer();
                assert!(!toggle.is_producer_enabled());
            }
            // Inner guard restores the already-suppressed state.
            assert!(!toggle.is_producer_enabled());
        }
        assert!(toggle.is_producer_enabled());
    }

    #[test]
    fn test_guard_survives_panic() {
        let toggle = ToggleState::new(true, true);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = toggle.suppress_producer();
            panic!("apply blew up");
        }));
        assert!(result.is_err());
        assert!(toggle.is_producer_enabled());
    }
}

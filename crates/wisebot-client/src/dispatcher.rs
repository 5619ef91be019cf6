//! Synchronous publish/subscribe hub keyed by [`EventCategory`].
//!
//! Listeners run on the emitting thread, in registration order. The
//! registry lock is released before any listener runs, so a listener may
//! register, unregister or emit re-entrantly. A panicking listener is
//! caught and logged; the remaining listeners still run.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, trace};

use crate::events::{ClientEvent, EventCategory};

/// Registered callback. Identity for [`Dispatcher::off`] is the `Arc` allocation.
pub type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Category → ordered listener list.
#[derive(Default)]
pub struct Dispatcher {
    registry: RwLock<HashMap<EventCategory, Vec<Listener>>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `category`.
    pub fn on(&self, category: EventCategory, listener: Listener) {
        self.registry.write().entry(category).or_default().push(listener);
    }

    /// Wrap `f` as a [`Listener`], register it and return the handle for [`off`](Self::off).
    pub fn listen<F>(&self, category: EventCategory, f: F) -> Listener
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(f);
        self.on(category, Arc::clone(&listener));
        listener
    }

    /// Remove the first registration of `listener` under `category`.
    ///
    /// Returns whether a registration was removed.
    pub fn off(&self, category: EventCategory, listener: &Listener) -> bool {
        let mut registry = self.registry.write();
        let Some(listeners) = registry.get_mut(&category) else {
            return false;
        };
        let Some(pos) = listeners.iter().position(|l| same_listener(l, listener)) else {
            return false;
        };
        let _ = listeners.remove(pos);
        if listeners.is_empty() {
            let _ = registry.remove(&category);
        }
        true
    }

    /// Invoke every listener registered for the event's category.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn emit(&self, event: &ClientEvent) -> usize {
        let category = event.category();
        let snapshot: Vec<Listener> = self
            .registry
            .read()
            .get(&category)
            .cloned()
            .unwrap_or_default();

        trace!(?category, listeners = snapshot.len(), "dispatching event");
        let mut delivered = 0;
        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    error!(?category, panic = %panic_message(payload.as_ref()), "listener panicked");
                }
            }
        }
        delivered
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.registry.write().clear();
    }

    /// Whether `listener` is currently registered for `category`.
    pub fn is_registered(&self, category: EventCategory, listener: &Listener) -> bool {
        self.registry
            .read()
            .get(&category)
            .is_some_and(|listeners| listeners.iter().any(|l| same_listener(l, listener)))
    }

    /// Number of listeners registered for `category`.
    pub fn listener_count(&self, category: EventCategory) -> usize {
        self.registry.read().get(&category).map_or(0, Vec::len)
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

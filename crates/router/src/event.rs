//! A small publish/subscribe bus for observability hooks.
//!
//! Listeners are stored in an [`ArcSwap`], so [`EventEmitter::emit`] never takes a lock and
//! listeners can be added or removed while requests are being dispatched.

use arc_swap::ArcSwap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Emitted before a request is dispatched, with `[method, path, matched_routes]`.
pub const REQUEST: &str = "micro.request";
/// Emitted when the chain runs out of routes, with `[method, path]`.
pub const NOT_FOUND: &str = "micro.not_found";
/// Emitted when a handler leaves an error status behind, with `[status, path]`.
pub const STATUS_ERROR: &str = "micro.status_error";
/// Emitted when a handler fails or panics, with `[path, cause]`.
pub const INTERNAL_ERROR: &str = "micro.internal_error";

/// A listener receives the event name and its arguments. Returning `false` stops the
/// event from reaching the listeners registered after it.
pub type Listener = Arc<dyn Fn(&str, &[Value]) -> bool + Send + Sync>;

/// Identifies a registered listener so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listeners = HashMap<String, Vec<(ListenerId, Listener)>>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: ArcSwap<Listeners>,
    next_id: AtomicU64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&str, &[Value]) -> bool + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener = Arc::new(listener);
        self.listeners.rcu(|current| {
            let mut next = Listeners::clone(current);
            next.entry(event.to_owned()).or_default().push((id, Arc::clone(&listener)));
            next
        });
        id
    }

    /// Removes the listener registered under `id`, returning whether it was found.
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let previous = self.listeners.rcu(|current| {
            let mut next = Listeners::clone(current);
            if let Some(listeners) = next.get_mut(event) {
                listeners.retain(|(listener_id, _)| *listener_id != id);
                if listeners.is_empty() {
                    next.remove(event);
                }
            }
            next
        });
        previous.get(event).is_some_and(|listeners| listeners.iter().any(|(listener_id, _)| *listener_id == id))
    }

    /// Removes every listener of `event` and hands them back in registration order.
    pub fn remove_all_listeners(&self, event: &str) -> Vec<Listener> {
        let previous = self.listeners.rcu(|current| {
            let mut next = Listeners::clone(current);
            next.remove(event);
            next
        });
        previous
            .get(event)
            .map(|listeners| listeners.iter().map(|(_, listener)| Arc::clone(listener)).collect())
            .unwrap_or_default()
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.listeners.load().get(event).is_some_and(|listeners| !listeners.is_empty())
    }

    /// Calls the listeners of `event` in registration order until one returns `false`.
    pub fn emit(&self, event: &str, args: &[Value]) {
        let listeners = self.listeners.load();
        let Some(listeners) = listeners.get(event) else {
            return;
        };
        for (_, listener) in listeners {
            if !listener(event, args) {
                break;
            }
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.load();
        let counts = listeners.iter().map(|(event, listeners)| (event.as_str(), listeners.len())).collect::<HashMap<_, _>>();
        f.debug_struct("EventEmitter").field("listeners", &counts).finish_non_exhaustive()
    }
}

//! Session events raised by the API client.
//!
//! The client emits `AuthEvent::Unauthenticated` when the API rejects a
//! credential. Stores and navigation subscribe here instead of the client
//! reaching into them, so neither side depends on the other.
//!
//! Listeners are held weakly: a dropped store simply stops receiving events.

use std::sync::{Arc, RwLock, Weak};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The API answered 401 to a request for `path`. The credential has
    /// already been cleared when listeners run.
    Unauthenticated { path: String },
}

pub trait AuthListener: Send + Sync {
    fn on_auth_event(&self, event: &AuthEvent);
}

#[derive(Clone, Default)]
pub struct AuthEvents {
    listeners: Arc<RwLock<Vec<Weak<dyn AuthListener>>>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<L: AuthListener + 'static>(&self, listener: &Arc<L>) {
        let listener: Arc<dyn AuthListener> = listener.clone();
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.retain(|l| l.strong_count() > 0);
        listeners.push(Arc::downgrade(&listener));
    }

    /// Deliver `event` to every live listener, synchronously and in
    /// subscription order.
    pub fn emit(&self, event: &AuthEvent) {
        // Snapshot first so a listener may subscribe without deadlocking
        let live: Vec<Arc<dyn AuthListener>> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        debug!(?event, listeners = live.len(), "Emitting auth event");
        for listener in live {
            listener.on_auth_event(event);
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }
}

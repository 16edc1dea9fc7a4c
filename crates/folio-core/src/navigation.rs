//! Client-side navigation.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::events::{AuthEvent, AuthListener};

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Navigate to `path`, keeping the current entry in history
    fn push(&self, path: &str);

    /// Navigate to `path`, replacing the current entry
    fn replace(&self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Push,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub kind: NavigationKind,
    pub path: String,
}

/// Entries and recorded navigations kept before the oldest are dropped
const MAX_HISTORY: usize = 100;

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<String>,
    log: Vec<Navigation>,
}

/// In-memory history stack. Records the navigations it performs, keeping
/// the most recent `MAX_HISTORY`.
#[derive(Debug)]
pub struct History {
    inner: Mutex<HistoryInner>,
}

impl History {
    pub fn new(initial: &str) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![initial.to_string()],
                log: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Navigations performed so far, oldest first
    pub fn navigations(&self) -> Vec<Navigation> {
        self.lock().log.clone()
    }
}

impl HistoryInner {
    fn record(&mut self, kind: NavigationKind, path: &str) {
        if self.log.len() == MAX_HISTORY {
            self.log.remove(0);
        }
        self.log.push(Navigation {
            kind,
            path: path.to_string(),
        });
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.lock().entries.last().cloned().unwrap_or_default()
    }

    fn push(&self, path: &str) {
        debug!(path, "Navigate");
        let mut inner = self.lock();
        if inner.entries.len() == MAX_HISTORY {
            inner.entries.remove(0);
        }
        inner.entries.push(path.to_string());
        inner.record(NavigationKind::Push, path);
    }

    fn replace(&self, path: &str) {
        debug!(path, "Navigate (replace)");
        let mut inner = self.lock();
        match inner.entries.last_mut() {
            Some(current) => *current = path.to_string(),
            None => inner.entries.push(path.to_string()),
        }
        inner.record(NavigationKind::Replace, path);
    }
}

/// Sends the user to the entry route whenever the API rejects the session.
pub struct RedirectOnExpiry {
    navigator: Arc<dyn Navigator>,
    entry_route: String,
}

impl RedirectOnExpiry {
    pub fn new(navigator: Arc<dyn Navigator>, entry_route: &str) -> Self {
        Self {
            navigator,
            entry_route: entry_route.to_string(),
        }
    }
}

impl AuthListener for RedirectOnExpiry {
    fn on_auth_event(&self, event: &AuthEvent) {
        match event {
            AuthEvent::Unauthenticated { path } => {
                info!(rejected = %path, to = %self.entry_route, "Session expired, redirecting");
                self.navigator.replace(&self.entry_route);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_replace() {
        let history = History::new("/");
        history.push("/projects");
        history.replace("/projects/1");
        assert_eq!(history.current_path(), "/projects/1");
        assert_eq!(
            history.navigations(),
            vec![
                Navigation {
                    kind: NavigationKind::Push,
                    path: "/projects".into(),
                },
                Navigation {
                    kind: NavigationKind::Replace,
                    path: "/projects/1".into(),
                },
            ]
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let history = History::new("/");
        for i in 0..MAX_HISTORY * 3 {
            history.push(&format!("/projects/{}", i));
            history.replace(&format!("/projects/{}/edit", i));
        }

        let inner = history.lock();
        assert_eq!(inner.entries.len(), MAX_HISTORY);
        assert_eq!(inner.log.len(), MAX_HISTORY);
        drop(inner);
        let last = MAX_HISTORY * 3 - 1;
        assert_eq!(history.current_path(), format!("/projects/{}/edit", last));
        assert_eq!(
            history.navigations().last().map(|n| n.path.clone()),
            Some(format!("/projects/{}/edit", last))
        );
    }

    #[test]
    fn test_redirect_on_expiry() {
        let history = Arc::new(History::new("/projects/7"));
        let listener = RedirectOnExpiry::new(history.clone(), "/");

        listener.on_auth_event(&AuthEvent::Unauthenticated {
            path: "/projects/7".into(),
        });

        assert_eq!(history.current_path(), "/");
        assert_eq!(history.navigations().len(), 1);
    }
}

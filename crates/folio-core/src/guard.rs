//! Route guard for the protected area.
//!
//! Two checks gate the same prefix:
//!
//! - the edge check runs before a protected page is produced and only sees
//!   whether a credential exists, never whether it is valid;
//! - the reactive check runs once the identity probe has resolved and
//!   catches credentials the API no longer accepts.

use tracing::debug;

use crate::auth::credential_from_cookie_header;
use crate::store::SessionState;

pub const DEFAULT_PROTECTED_PREFIX: &str = "/projects";
pub const DEFAULT_ENTRY_ROUTE: &str = "/";
pub const DEFAULT_HOME_ROUTE: &str = "/projects";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    Next,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    protected_prefix: String,
    entry_route: String,
    home_route: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PROTECTED_PREFIX, DEFAULT_ENTRY_ROUTE, DEFAULT_HOME_ROUTE)
    }
}

impl RouteGuard {
    pub fn new(protected_prefix: &str, entry_route: &str, home_route: &str) -> Self {
        Self {
            protected_prefix: protected_prefix.trim_end_matches('/').to_string(),
            entry_route: entry_route.to_string(),
            home_route: home_route.to_string(),
        }
    }

    pub fn entry_route(&self) -> &str {
        &self.entry_route
    }

    pub fn home_route(&self) -> &str {
        &self.home_route
    }

    /// Whether `path` is the protected prefix or below it.
    /// Query strings and fragments are ignored.
    pub fn is_protected(&self, path: &str) -> bool {
        let path = strip_query(path);
        match path.strip_prefix(self.protected_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Edge check against the raw credential artifact
    pub fn edge_check(&self, path: &str, credential: Option<&str>) -> EdgeDecision {
        let has_credential = credential.is_some_and(|c| !c.is_empty());
        if self.is_protected(path) && !has_credential {
            debug!(path, to = %self.entry_route, "No credential for protected route");
            return EdgeDecision::Redirect(self.entry_route.clone());
        }
        EdgeDecision::Next
    }

    /// Edge check reading the credential out of a `Cookie` request header
    pub fn edge_check_cookies(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        cookie_name: &str,
    ) -> EdgeDecision {
        let credential = cookie_header.and_then(|h| credential_from_cookie_header(h, cookie_name));
        self.edge_check(path, credential)
    }

    /// Where the resolved session says `path` should go instead, if anywhere
    pub fn reactive_check(&self, session: &SessionState, path: &str) -> Option<&str> {
        if !session.resolved {
            return None;
        }
        match session.identity {
            None if self.is_protected(path) => Some(self.entry_route.as_str()),
            Some(_) if strip_query(path) == self.entry_route => Some(self.home_route.as_str()),
            _ => None,
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(|c: char| c == '?' || c == '#').next().unwrap_or(path)
}

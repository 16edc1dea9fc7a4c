//! Session store: who is logged in and how the last session operation went.
//!
//! ```text
//! idle ──start──→ loading ──ok──→ idle
//!   ↑                │
//!   └──start── error ←┘ failure
//!
//! reset(): any state ──→ idle, identity cleared
//! ```

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, OperationError};
use crate::events::{AuthEvent, AuthListener};
use crate::models::{Identity, RegisterForm};

use super::sequence::{OpSequence, Ticket};
use super::SessionStatus;

const LOGIN_FAILED: &str = "Failed to fetch user data";
const LOGOUT_FAILED: &str = "Failed to logout";
const REGISTER_FAILED: &str = "Failed to register";
const PASSWORD_MISMATCH: &str = "Passwords do not match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SessionOp {
    Login,
    Logout,
    FetchIdentity,
    Register,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub status: SessionStatus,
    /// Set once the identity is known (present or absent). Route checks
    /// ignore the session until then.
    pub resolved: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    sequence: OpSequence<SessionOp>,
}

pub struct SessionStore {
    api: ApiClient,
    inner: Mutex<Inner>,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().state.identity.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().state.status.clone()
    }

    fn begin(&self, op: SessionOp) -> Ticket<SessionOp> {
        let mut inner = self.lock();
        inner.state.status = SessionStatus::Loading;
        inner.sequence.begin(op)
    }

    /// Apply a completion if it belongs to the latest invocation of its kind
    fn finish(&self, ticket: Ticket<SessionOp>, apply: impl FnOnce(&mut SessionState)) -> bool {
        let mut inner = self.lock();
        if !inner.sequence.is_current(&ticket) {
            debug!(?ticket, "Discarding result of superseded session operation");
            return false;
        }
        apply(&mut inner.state);
        true
    }

    /// Log in, then load the identity behind the new credential.
    /// Any failure leaves the identity untouched and the status in `error`.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), OperationError> {
        let ticket = self.begin(SessionOp::Login);

        match self.login_flow(email, password).await {
            Ok(identity) => {
                info!(user = %identity.email, "Login successful");
                self.finish(ticket, |state| {
                    state.identity = Some(identity);
                    state.status = SessionStatus::Idle;
                    state.resolved = true;
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                let err = OperationError::from_api(&e, LOGIN_FAILED);
                self.finish(ticket, |state| state.status = SessionStatus::Error(err.clone()));
                Err(err)
            }
        }
    }

    async fn login_flow(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        if let Some(token) = self.api.login(email, password).await? {
            if let Err(e) = self.api.credentials().store(&token) {
                warn!(error = %e, "Failed to persist credential");
            }
        }
        self.api.me().await
    }

    /// Log out. The local credential and identity are cleared whatever the
    /// server answers; a failed call is still reported.
    pub async fn logout(&self) -> Result<(), OperationError> {
        let ticket = self.begin(SessionOp::Logout);
        let result = self.api.logout().await;

        if let Err(e) = self.api.credentials().clear() {
            warn!(error = %e, "Failed to clear credential");
        }

        match result {
            Ok(()) => {
                info!("Logged out");
                self.finish(ticket, |state| {
                    state.identity = None;
                    state.status = SessionStatus::Idle;
                    state.resolved = true;
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed");
                let err = OperationError::from_api(&e, LOGOUT_FAILED);
                self.finish(ticket, |state| {
                    state.identity = None;
                    state.status = SessionStatus::Error(err.clone());
                    state.resolved = true;
                });
                Err(err)
            }
        }
    }

    /// Probe the identity endpoint. Any failure means "not logged in":
    /// the identity is cleared and the status returns to idle, never error.
    /// Returns the identity held by the store afterwards.
    pub async fn fetch_identity(&self) -> Option<Identity> {
        let ticket = self.begin(SessionOp::FetchIdentity);

        let identity = match self.api.me().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "Identity probe failed");
                None
            }
        };

        self.finish(ticket, |state| {
            state.identity = identity;
            state.status = SessionStatus::Idle;
            state.resolved = true;
        });
        self.identity()
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, form: &RegisterForm) -> Result<(), OperationError> {
        if !form.passwords_match() {
            let err = OperationError::validation(PASSWORD_MISMATCH);
            self.lock().state.status = SessionStatus::Error(err.clone());
            return Err(err);
        }

        let ticket = self.begin(SessionOp::Register);
        match self.api.register(form).await {
            Ok(()) => {
                info!(email = %form.email, "Account registered");
                self.finish(ticket, |state| state.status = SessionStatus::Idle);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                let err = OperationError::from_api(&e, REGISTER_FAILED);
                self.finish(ticket, |state| state.status = SessionStatus::Error(err.clone()));
                Err(err)
            }
        }
    }

    /// Clear identity and status without touching the network.
    /// In-flight operations are not cancelled and may still land.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = SessionState {
            identity: None,
            status: SessionStatus::Idle,
            resolved: true,
        };
    }
}

impl AuthListener for SessionStore {
    fn on_auth_event(&self, event: &AuthEvent) {
        match event {
            AuthEvent::Unauthenticated { .. } => self.reset(),
        }
    }
}

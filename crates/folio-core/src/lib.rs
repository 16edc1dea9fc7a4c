//! Folio Core - session and project state for the portfolio API client.
//!
//! This crate holds everything below the user interface:
//! - `api`: HTTP client, transport seam, and error types
//! - `auth`: bearer credential storage
//! - `store`: session and project list stores
//! - `guard`, `navigation`: route protection and history
//! - `context`: wires the pieces together for one application instance

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod events;
pub mod guard;
pub mod models;
pub mod navigation;
pub mod store;
pub mod utils;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, ErrorKind, OperationError, ReqwestTransport, Transport};
pub use auth::{CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore};
pub use config::{Config, CredentialBackend};
pub use context::SessionContext;
pub use events::{AuthEvent, AuthEvents, AuthListener};
pub use guard::{EdgeDecision, RouteGuard};
pub use models::{Identity, ImageUpload, Project, ProjectForm, ProjectImage, RegisterForm};
pub use navigation::{History, Navigator, RedirectOnExpiry};
pub use store::{
    ProjectsState, ProjectsStore, RequestStatus, SessionState, SessionStatus, SessionStore,
};

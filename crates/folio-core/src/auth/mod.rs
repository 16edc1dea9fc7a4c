//! Credential storage for the bearer token.
//!
//! This module provides:
//! - `CredentialStore`: the cookie-like token holder read on every request
//! - `MemoryCredentialStore`, `FileCredentialStore`, `KeyringCredentialStore`:
//!   process-local, cache-directory, and OS-keychain backends

pub mod credentials;

pub use credentials::{
    credential_from_cookie_header, CredentialData, CredentialStore, FileCredentialStore,
    KeyringCredentialStore, MemoryCredentialStore,
};

//! Data models for the portfolio API.
//!
//! - `Identity`: the authenticated user
//! - `Project`, `ProjectImage`: portfolio records
//! - `ProjectForm`, `RegisterForm`: client-side input for create/update and sign-up

pub mod identity;
pub mod project;

pub use identity::{Identity, RegisterForm};
pub(crate) use identity::{LoginRequest, RegisterRequest};
pub use project::{ImageUpload, Project, ProjectForm, ProjectImage};

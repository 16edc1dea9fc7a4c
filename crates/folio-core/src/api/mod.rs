//! REST API client module for the portfolio service.
//!
//! This module provides the `ApiClient` for the auth and project
//! endpoints, the `Transport` seam it sends through, and the error
//! types surfaced to stores.
//!
//! The API uses bearer token authentication; the token is issued as a
//! cookie by the login endpoint.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{
    ApiClient, DEFAULT_CREDENTIAL_COOKIE, IDENTITY_PATH, LOGIN_PATH, LOGOUT_PATH, PROJECTS_PATH,
    REGISTER_PATH,
};
pub use error::{ApiError, ErrorKind, OperationError};
pub use transport::{
    ApiRequest, ApiResponse, MultipartForm, MultipartPart, RequestBody, ReqwestTransport, Transport,
};

//! API client for the portfolio REST API.
//!
//! Every call goes through `ApiClient::send`, which attaches the stored
//! bearer credential on the way out and watches for 401 responses on the
//! way back. A 401 from anything but the identity probe clears the
//! credential and raises `AuthEvent::Unauthenticated` before the error is
//! returned to the caller.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::events::{AuthEvent, AuthEvents};
use crate::models::{Identity, LoginRequest, Project, ProjectForm, RegisterForm, RegisterRequest};

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::ApiError;

// ============================================================================
// Endpoints
// ============================================================================

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REGISTER_PATH: &str = "/auth/register";

/// Identity probe. A 401 here means "not logged in", not "session expired".
pub const IDENTITY_PATH: &str = "/auth/me";

pub const PROJECTS_PATH: &str = "/projects";

/// Default name of the cookie carrying the bearer token
pub const DEFAULT_CREDENTIAL_COOKIE: &str = "token";

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    events: AuthEvents,
    cookie_name: String,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        events: AuthEvents,
    ) -> Self {
        Self {
            transport,
            credentials,
            events,
            cookie_name: DEFAULT_CREDENTIAL_COOKIE.to_string(),
        }
    }

    /// Use a different cookie name for the credential
    pub fn with_cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_string();
        self
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.token() {
            let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| {
                    ApiError::InvalidRequest("Stored credential is not a valid header value".into())
                })?;
            let cookie = HeaderValue::from_str(&format!("{}={}", self.cookie_name, token))
                .map_err(|_| {
                    ApiError::InvalidRequest("Stored credential is not a valid cookie value".into())
                })?;
            headers.insert(header::AUTHORIZATION, bearer);
            headers.insert(header::COOKIE, cookie);
        }
        Ok(headers)
    }

    /// Send a request through the transport. Non-success statuses come
    /// back as `ApiError`; nothing is retried.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.headers.extend(self.auth_headers()?);
        let method = request.method.clone();
        let route = request.route().to_string();

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let err = ApiError::from_status(response.status, &response.text());
        if err.is_unauthorized() {
            self.handle_unauthorized(&route);
        } else {
            debug!(method = %method, path = %route, status = %response.status, "Request failed");
        }
        Err(err)
    }

    fn handle_unauthorized(&self, route: &str) {
        if route == IDENTITY_PATH {
            debug!("Identity probe rejected, no active session");
            return;
        }

        warn!(path = route, "Session rejected by API, clearing credential");
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "Failed to clear credential");
        }
        self.events.emit(&AuthEvent::Unauthenticated {
            path: route.to_string(),
        });
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    fn project_path(id: &str) -> Result<String, ApiError> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(ApiError::InvalidRequest(format!("Invalid project id: {:?}", id)));
        }
        Ok(format!("{}/{}", PROJECTS_PATH, id))
    }

    // ===== Auth =====

    /// Authenticate. Returns the credential issued by the server, taken from
    /// the `Set-Cookie` header or a `token` field in the body.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest { email, password })?;
        let response = self.send(request).await?;

        let token = response.set_cookie(&self.cookie_name).or_else(|| {
            response
                .json::<TokenBody>()
                .ok()
                .and_then(|b| b.token)
                .filter(|t| !t.is_empty())
        });
        debug!(credential_issued = token.is_some(), "Login accepted");
        Ok(token)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send(ApiRequest::post(LOGOUT_PATH)).await?;
        Ok(())
    }

    /// Fetch the identity behind the current credential
    pub async fn me(&self) -> Result<Identity, ApiError> {
        self.fetch(ApiRequest::get(IDENTITY_PATH)).await
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(), ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(&RegisterRequest::from(form))?;
        self.send(request).await?;
        Ok(())
    }

    // ===== Projects =====

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.fetch(ApiRequest::get(PROJECTS_PATH)).await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        self.fetch(ApiRequest::get(Self::project_path(id)?)).await
    }

    pub async fn create_project(&self, form: &ProjectForm) -> Result<Project, ApiError> {
        let request = ApiRequest::post(PROJECTS_PATH).multipart(form.to_multipart(false));
        self.fetch(request).await
    }

    pub async fn update_project(&self, id: &str, form: &ProjectForm) -> Result<Project, ApiError> {
        let request = ApiRequest::put(Self::project_path(id)?).multipart(form.to_multipart(true));
        self.fetch(request).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(Self::project_path(id)?)).await?;
        Ok(())
    }
}

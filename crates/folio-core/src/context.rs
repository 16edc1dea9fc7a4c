//! The session context: one per application, created at the root.
//!
//! Owns the credential store, API client, both stores, the navigator, and
//! the route guard, and wires the stores and the expiry redirect to the
//! client's auth events. Components receive the context (or the pieces
//! they need from it) instead of reaching for global state.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{ApiClient, OperationError, Transport};
use crate::auth::CredentialStore;
use crate::config::Config;
use crate::events::AuthEvents;
use crate::guard::{EdgeDecision, RouteGuard};
use crate::models::{Identity, RegisterForm};
use crate::navigation::{Navigator, RedirectOnExpiry};
use crate::store::{ProjectsStore, SessionStore};

pub struct SessionContext {
    api: ApiClient,
    session: Arc<SessionStore>,
    projects: Arc<ProjectsStore>,
    navigator: Arc<dyn Navigator>,
    guard: RouteGuard,
    // Held so the weak subscription stays alive
    _redirect: Arc<RedirectOnExpiry>,
}

impl SessionContext {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let events = AuthEvents::new();
        let api = ApiClient::new(transport, credentials, events.clone())
            .with_cookie_name(&config.credential_cookie);
        let guard = config.route_guard();

        let session = Arc::new(SessionStore::new(api.clone()));
        let projects = Arc::new(ProjectsStore::new(api.clone()));
        let redirect = Arc::new(RedirectOnExpiry::new(navigator.clone(), guard.entry_route()));

        // Stores reset before the redirect lands
        events.subscribe(&session);
        events.subscribe(&projects);
        events.subscribe(&redirect);

        Self {
            api,
            session,
            projects,
            navigator,
            guard,
            _redirect: redirect,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn projects(&self) -> &ProjectsStore {
        &self.projects
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }

    /// Navigate through the edge check. Protected routes without a
    /// credential land on the entry route instead.
    pub fn navigate(&self, path: &str) -> EdgeDecision {
        let credential = self.api.credentials().token();
        let decision = self.guard.edge_check(path, credential.as_deref());
        match decision {
            EdgeDecision::Next => self.navigator.push(path),
            EdgeDecision::Redirect(ref to) => self.navigator.replace(to),
        }
        decision
    }

    /// Apply the reactive check to the current route.
    /// Returns the route redirected to, if any.
    pub fn sync_route(&self) -> Option<String> {
        let current = self.navigator.current_path();
        let target = self
            .guard
            .reactive_check(&self.session.snapshot(), &current)?
            .to_string();
        debug!(from = %current, to = %target, "Session state redirect");
        self.navigator.replace(&target);
        Some(target)
    }

    /// Resolve the identity at startup and settle the route
    pub async fn bootstrap(&self) -> Option<Identity> {
        let identity = self.session.fetch_identity().await;
        self.sync_route();
        identity
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), OperationError> {
        self.session.login(email, password).await?;
        self.sync_route();
        Ok(())
    }

    /// Log out and clear all local state, then return to the entry route.
    /// A failed logout call is reported after the local cleanup.
    pub async fn logout(&self) -> Result<(), OperationError> {
        let result = self.session.logout().await;
        self.session.reset();
        self.projects.reset();
        self.navigator.replace(self.guard.entry_route());
        info!("Session closed");
        result
    }

    /// Create an account and return to the entry route to log in
    pub async fn register(&self, form: &RegisterForm) -> Result<(), OperationError> {
        self.session.register(form).await?;
        self.navigator.push(self.guard.entry_route());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{IDENTITY_PATH, LOGIN_PATH, LOGOUT_PATH, PROJECTS_PATH};
    use crate::navigation::NavigationKind;
    use crate::testing::{context, identity_json, project_json};
    use reqwest::Method;

    #[tokio::test]
    async fn test_expired_session_resets_everything_once() {
        let (ctx, transport, history) = context(Some("expired"), "/");
        transport.respond_json(Method::GET, IDENTITY_PATH, 200, identity_json());
        transport.respond_json(
            Method::GET,
            PROJECTS_PATH,
            200,
            serde_json::json!([project_json("a", &["go"])]),
        );
        transport.respond_json(Method::GET, "/projects/a", 401, serde_json::json!({}));
        ctx.bootstrap().await;
        ctx.projects().fetch_all().await.unwrap();
        ctx.projects().set_filter("go");
        ctx.navigate("/projects/a");
        let before = history.navigations().len();

        let err = ctx.projects().get("a").await.unwrap_err();

        assert_eq!(err.kind, crate::api::ErrorKind::AuthFailed);
        assert_eq!(ctx.api().credentials().token(), None);
        assert_eq!(ctx.session().identity(), None);
        assert!(ctx.projects().projects().is_empty());
        assert_eq!(ctx.projects().filter(), "");
        assert_eq!(ctx.current_path(), "/");
        let after = history.navigations();
        assert_eq!(after.len(), before + 1);
        assert_eq!(after.last().map(|n| n.kind), Some(NavigationKind::Replace));
    }

    #[tokio::test]
    async fn test_probe_rejection_does_not_redirect_by_itself() {
        let (ctx, transport, history) = context(Some("stale"), "/projects");
        transport.respond_json(Method::GET, IDENTITY_PATH, 401, serde_json::json!({}));

        let identity = ctx.session().fetch_identity().await;

        assert_eq!(identity, None);
        assert!(history.navigations().is_empty());
        assert_eq!(ctx.api().credentials().token().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_bootstrap_with_stale_credential_redirects_reactively() {
        let (ctx, transport, _history) = context(Some("stale"), "/");
        transport.respond_json(Method::GET, IDENTITY_PATH, 401, serde_json::json!({}));

        // The edge check lets the stale credential through
        assert_eq!(ctx.navigate("/projects"), EdgeDecision::Next);
        assert_eq!(ctx.current_path(), "/projects");

        ctx.bootstrap().await;

        assert_eq!(ctx.current_path(), "/");
    }

    #[tokio::test]
    async fn test_navigate_without_credential_redirects_at_edge() {
        let (ctx, transport, history) = context(None, "/");

        let decision = ctx.navigate("/projects/42");

        assert_eq!(decision, EdgeDecision::Redirect("/".into()));
        assert_eq!(ctx.current_path(), "/");
        assert!(transport.requests().is_empty());
        assert_eq!(history.navigations()[0].kind, NavigationKind::Replace);
    }

    #[tokio::test]
    async fn test_login_moves_to_home_route() {
        let (ctx, transport, _history) = context(None, "/");
        transport.respond_json(
            Method::POST,
            LOGIN_PATH,
            200,
            serde_json::json!({"token": "issued"}),
        );
        transport.respond_json(Method::GET, IDENTITY_PATH, 200, identity_json());

        ctx.login("ada@example.com", "pw").await.unwrap();

        assert_eq!(ctx.current_path(), "/projects");
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_entry_route() {
        let (ctx, transport, _history) = context(None, "/");
        transport.respond_json(Method::POST, LOGIN_PATH, 401, serde_json::json!({}));

        assert!(ctx.login("ada@example.com", "bad").await.is_err());

        assert_eq!(ctx.current_path(), "/");
        assert!(ctx.session().status().error().is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_stores_and_navigates() {
        let (ctx, transport, _history) = context(Some("valid"), "/projects");
        transport.respond_json(Method::GET, IDENTITY_PATH, 200, identity_json());
        transport.respond_json(
            Method::GET,
            PROJECTS_PATH,
            200,
            serde_json::json!([project_json("a", &[])]),
        );
        transport.fail(Method::POST, LOGOUT_PATH, "offline");
        ctx.bootstrap().await;
        ctx.projects().fetch_all().await.unwrap();

        let result = ctx.logout().await;

        assert!(result.is_err());
        assert_eq!(ctx.session().identity(), None);
        assert!(ctx.projects().projects().is_empty());
        assert_eq!(ctx.api().credentials().token(), None);
        assert_eq!(ctx.current_path(), "/");
    }

    #[tokio::test]
    async fn test_register_returns_to_entry_route() {
        let (ctx, transport, _history) = context(None, "/register");
        transport.respond_json(Method::POST, crate::api::REGISTER_PATH, 201, serde_json::json!({}));
        let form = RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "pw".into(),
            confirm: "pw".into(),
        };

        ctx.register(&form).await.unwrap();

        assert_eq!(ctx.current_path(), "/");
    }
}

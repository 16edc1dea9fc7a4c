//! Test doubles and fixtures shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::MemoryCredentialStore;
use crate::config::Config;
use crate::context::SessionContext;
use crate::events::{AuthEvent, AuthListener};
use crate::models::Identity;
use crate::navigation::History;

type RouteKey = (Method, String);

enum Reply {
    Respond(ApiResponse),
    Fail(String),
}

/// Scripted transport. Replies are queued per method and route and
/// consumed in order; an unscripted request gets a 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    replies: Mutex<HashMap<RouteKey, VecDeque<Reply>>>,
    gates: Mutex<HashMap<RouteKey, Arc<Notify>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn respond(&self, method: Method, path: &str, response: ApiResponse) {
        self.push(method, path, Reply::Respond(response));
    }

    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.respond(method, path, ApiResponse::new(status).with_json(&body));
    }

    /// The next request to this route fails without a response
    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, Reply::Fail(message.to_string()));
    }

    /// Hold the next request to this route until the returned handle is notified
    pub fn gate(&self, method: Method, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert((method, path.to_string()), notify.clone());
        notify
    }

    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        let key = (request.method.clone(), request.route().to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());
        let gate = self.gates.lock().unwrap().remove(&key);
        self.requests.lock().unwrap().push(request);

        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            match reply {
                Some(Reply::Respond(response)) => Ok(response),
                Some(Reply::Fail(message)) => Err(ApiError::NetworkError(message)),
                None => Ok(ApiResponse::new(StatusCode::NOT_FOUND)),
            }
        })
    }
}

/// Records every auth event it receives
#[derive(Default)]
pub(crate) struct EventRecorder {
    events: Mutex<Vec<AuthEvent>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuthListener for EventRecorder {
    fn on_auth_event(&self, event: &AuthEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub(crate) fn identity_json() -> Value {
    json!({
        "_id": "u1",
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "createdAt": "2024-01-15T10:00:00Z",
        "updatedAt": "2024-01-15T10:00:00Z"
    })
}

pub(crate) fn identity() -> Identity {
    serde_json::from_value(identity_json()).unwrap()
}

pub(crate) fn project_json(id: &str, technologies: &[&str]) -> Value {
    json!({
        "_id": id,
        "title": format!("Project {id}"),
        "description": "A portfolio piece",
        "technologies": technologies,
        "createdAt": "2024-02-01T09:30:00Z",
        "updatedAt": "2024-02-01T09:30:00Z"
    })
}

/// A full context over a mock transport, starting at `path`
pub(crate) fn context(
    token: Option<&str>,
    path: &str,
) -> (SessionContext, Arc<MockTransport>, Arc<History>) {
    let transport = Arc::new(MockTransport::new());
    let credentials = Arc::new(match token {
        Some(t) => MemoryCredentialStore::with_token(t),
        None => MemoryCredentialStore::new(),
    });
    let history = Arc::new(History::new(path));
    let ctx = SessionContext::new(
        &Config::default(),
        transport.clone(),
        credentials,
        history.clone(),
    );
    (ctx, transport, history)
}

//! The authenticated user and the auth request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user profile returned by the identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Sign-up form. `confirm` never leaves the client.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl RegisterForm {
    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a RegisterForm> for RegisterRequest<'a> {
    fn from(form: &'a RegisterForm) -> Self {
        Self {
            name: &form.name,
            email: &form.email,
            password: &form.password,
        }
    }
}

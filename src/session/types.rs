//! Request, response and state types for the session store. Token and password
//! fields are plain strings for serde, so every type carrying them implements a
//! redacting `Debug` and must never be logged through `Serialize`.

use crate::api::FieldErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque principal identifier; the API sends numbers, other deployments strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrincipalId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalId::Number(id) => write!(formatter, "{id}"),
            PrincipalId::Text(id) => formatter.write_str(id),
        }
    }
}

/// The authenticated identity returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl Principal {
    /// Name for display: `name`, else first and last name, else the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if full.is_empty() {
            self.email.clone()
        } else {
            full
        }
    }
}

/// Bearer credentials issued by the API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds counted from issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenSet {
    /// A credential carrying only an access token.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            token_type: None,
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Client-held authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub principal: Option<Principal>,
    pub tokens: Option<TokenSet>,
    pub expires_at: Option<DateTime<Utc>>,
    pub authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.authenticated && self.principal.is_some()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|tokens| tokens.access_token.as_str())
    }
}

#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration form. The admin profile sends every field; the legacy profile
/// only `email` and `password`. Both profiles check `password_confirm` locally.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl Registration {
    #[must_use]
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirm
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("password_confirm", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct LegacyRegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Login and registration responses; either field spelling is accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default, alias = "admin")]
    pub user: Option<Principal>,
    #[serde(default)]
    pub tokens: Option<TokenSet>,
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthResponse {
    pub fn credentials(&self) -> Option<TokenSet> {
        self.tokens
            .clone()
            .or_else(|| self.token.as_deref().map(TokenSet::bearer))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub tokens: TokenSet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
    pub valid: bool,
}

/// What a successful registration produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registered {
    /// The account exists; the caller is not signed in as it.
    Created(Principal),
    /// The account exists and the session now belongs to it.
    Authenticated(Principal),
}

impl Registered {
    #[must_use]
    pub fn principal(&self) -> &Principal {
        match self {
            Registered::Created(principal) | Registered::Authenticated(principal) => principal,
        }
    }
}

/// Structured failure returned by session actions. The message is also cached
/// on the session until cleared or superseded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub message: String,
    pub field_errors: Option<FieldErrors>,
}

impl AuthFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: None,
        }
    }
}

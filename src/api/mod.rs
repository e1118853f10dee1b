//! JSON client for the contest admin API with a shared credential slot. Every
//! request built here picks up the bearer token held in the slot unless the
//! caller passes one explicitly, so authenticated calls need no per-call wiring.
//! Clones of a client share the slot; separately constructed clients never do.
//! Token material must never be logged.

mod errors;

pub use errors::{ApiError, FieldErrors};

use crate::config::AppConfig;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info_span, Instrument};
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
/// Maximum number of error message characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credential: Arc<RwLock<Option<SecretString>>>,
}

impl ApiClient {
    /// Builds a client rooted at `base_url`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if `base_url` is not an absolute http(s) URL or
    /// the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|err| ApiError::Config(format!("Invalid API base URL {base_url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "API base URL must use http or https: {base_url}"
            )));
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim().to_string(),
            credential: Arc::new(RwLock::new(None)),
        })
    }

    /// # Errors
    /// Returns `ApiError::Config` if the underlying HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores the token attached to every later request as `Bearer <token>`.
    pub async fn set_bearer(&self, token: &str) {
        *self.credential.write().await = Some(SecretString::from(token.to_string()));
    }

    pub async fn clear_bearer(&self) {
        *self.credential.write().await = None;
    }

    /// The `Authorization` header value currently attached by default.
    pub async fn authorization(&self) -> Option<String> {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    /// GETs `path` and decodes the JSON body.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure, non-success status, or an undecodable body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let response = self
            .send(Method::GET, path, None::<&Value>, bearer)
            .await?;
        handle_json_response(response).await
    }

    /// POSTs a JSON body to `path` and decodes the JSON response.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure, non-success status, or an undecodable body.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::POST, path, Some(body), bearer).await?;
        handle_json_response(response).await
    }

    /// POSTs a JSON body to `path` and discards any response body.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn post_json_discard<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<(), ApiError> {
        let response = self.send(Method::POST, path, Some(body), bearer).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(http_error(response).await)
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = build_url_with_base(&self.base_url, path);
        debug!("request URL: {}", url);

        let mut builder = self.authorize(self.http.request(method.clone(), &url), bearer).await;
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let span = info_span!("api.request", http.method = %method, url = %url);
        builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)
    }

    /// Attaches the explicit token, or the slot's token when none is given.
    async fn authorize(&self, builder: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        if let Some(token) = bearer {
            return builder.bearer_auth(token);
        }
        match self.credential.read().await.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

/// Joins a base URL and a path with exactly one slash between them.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ApiError::Serialization(format!("Failed to build request: {err}"))
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Turns a non-success response into `ApiError::Http`, keeping the server's
/// `message` (or DRF-style `detail`) and `field_errors` when the body is JSON.
async fn http_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let Ok(json) = serde_json::from_str::<Value>(&body) else {
        debug!("non-JSON error body with status {}", status);
        return ApiError::Http {
            status,
            message: None,
            field_errors: None,
        };
    };

    let message = json
        .get("message")
        .or_else(|| json.get("detail"))
        .and_then(Value::as_str)
        .and_then(sanitize_message);
    let field_errors = json.get("field_errors").and_then(parse_field_errors);

    ApiError::Http {
        status,
        message,
        field_errors,
    }
}

/// Accepts either a list of messages or a single message per field.
fn parse_field_errors(value: &Value) -> Option<FieldErrors> {
    let object = value.as_object()?;
    let errors: FieldErrors = object
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Value::String(message) => vec![message.clone()],
                _ => Vec::new(),
            };
            (field.clone(), messages)
        })
        .filter(|(_, messages)| !messages.is_empty())
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn sanitize_message(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}

//! Authentication session store. One `SessionStore` owns the in-memory session,
//! its durable copy and the credential slot of the shared `ApiClient`; callers
//! hold it behind an `Arc` and pass it to the navigation guard. Only the store's
//! own actions mutate the session, and those actions are serialized by a
//! single-writer lock so interleaved calls never tear state. Readers take
//! snapshots and can observe `loading` while a call is in flight.
//!
//! Actions never propagate failures: they return `Result<_, AuthFailure>` (or a
//! plain verdict) and cache the failure message on the session for display.
//! Token material must not be logged.

pub(crate) mod client;
mod profile;
mod types;


pub use profile::{ApiProfile, StorageKeys, DEFAULT_TOKEN_LIFETIME_SECS};
pub use types::{
    AuthFailure, LoginCredentials, Principal, PrincipalId, Registered, Registration, Session,
    TokenSet,
};

use crate::api::{ApiClient, ApiError};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub const LOGIN_FAILED: &str = "Unable to sign in.";
pub const REGISTER_FAILED: &str = "Unable to create administrator.";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const REFRESH_FAILED: &str = "Unable to refresh the session.";
/// Default lead time for [`SessionStore::is_token_expiring`].
pub const DEFAULT_EXPIRY_LEAD_MINUTES: i64 = 2;

/// What the durable store currently holds for this profile.
enum Persisted {
    Absent,
    Corrupt(&'static str),
    Stored {
        principal: Principal,
        tokens: TokenSet,
        expires_at: Option<DateTime<Utc>>,
    },
}

pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    profile: ApiProfile,
    state: RwLock<Session>,
    writer: Mutex<()>,
}

impl SessionStore {
    /// Creates an empty, unauthenticated store. Call [`initialize`](Self::initialize)
    /// to restore a persisted session.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>, profile: ApiProfile) -> Self {
        Self {
            api,
            storage,
            profile,
            state: RwLock::new(Session::default()),
            writer: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn profile(&self) -> ApiProfile {
        self.profile
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.is_logged_in()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn current_principal(&self) -> Option<Principal> {
        self.state.read().await.principal.clone()
    }

    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.expires_at
    }

    /// Restores the persisted session, or settles on an unauthenticated one.
    ///
    /// Safe to call before every navigation: an already authenticated session is
    /// kept unless its expiry has elapsed, in which case it is torn down locally.
    /// Missing entries leave the session unauthenticated; incomplete, unreadable
    /// or expired entries are discarded without contacting the server.
    pub async fn initialize(&self) {
        let _writer = self.writer.lock().await;
        let now = Utc::now();

        let expired_in_memory = {
            let state = self.state.read().await;
            if state.authenticated && !is_expired(state.expires_at, now) {
                return;
            }
            state.authenticated
        };
        if expired_in_memory {
            info!("session expired, clearing local state");
            self.teardown().await;
            return;
        }

        match self.read_persisted() {
            Persisted::Absent => debug!("no persisted session"),
            Persisted::Corrupt(reason) => {
                warn!("discarding persisted session: {}", reason);
                self.teardown().await;
            }
            Persisted::Stored { expires_at, .. } if is_expired(expires_at, now) => {
                info!("persisted session expired, discarding");
                self.teardown().await;
            }
            Persisted::Stored {
                principal,
                tokens,
                expires_at,
            } => {
                self.api.set_bearer(&tokens.access_token).await;
                info!(principal = %principal.id, "session restored");

                let mut state = self.state.write().await;
                state.principal = Some(principal);
                state.tokens = Some(tokens);
                state.expires_at = expires_at;
                state.authenticated = true;
            }
        }
    }

    /// Signs in and persists the resulting session.
    ///
    /// # Errors
    /// Returns `AuthFailure` with the server's message, or a default one, when the
    /// request fails or the response is unusable.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<(), AuthFailure> {
        let _writer = self.writer.lock().await;
        self.begin().await;

        let result = match client::login(&self.api, self.profile, credentials).await {
            Ok((principal, tokens)) => match self.establish(principal, tokens).await {
                Ok(()) => Ok(()),
                Err(err) => Err(self.fail(&err, LOGIN_FAILED).await),
            },
            Err(err) => Err(self.fail(&err, LOGIN_FAILED).await),
        };

        self.finish().await;
        result
    }

    /// Creates an account. Mismatched passwords fail before any request is made.
    /// The admin profile returns the new principal without signing in; the legacy
    /// profile signs in exactly like [`login`](Self::login).
    ///
    /// # Errors
    /// Returns `AuthFailure`, including any per-field validation errors from the server.
    pub async fn register(&self, registration: &Registration) -> Result<Registered, AuthFailure> {
        let _writer = self.writer.lock().await;
        self.begin().await;

        if !registration.passwords_match() {
            let failure = AuthFailure::new(PASSWORD_MISMATCH);
            self.record(&failure).await;
            self.finish().await;
            return Err(failure);
        }

        let result = match client::register(&self.api, self.profile, registration).await {
            Ok((principal, _)) if !self.profile.register_authenticates() => {
                info!(principal = %principal.id, "administrator created");
                Ok(Registered::Created(principal))
            }
            Ok((principal, Some(tokens))) => {
                match self.establish(principal.clone(), tokens).await {
                    Ok(()) => Ok(Registered::Authenticated(principal)),
                    Err(err) => Err(self.fail(&err, REGISTER_FAILED).await),
                }
            }
            Ok((_, None)) => {
                let err = ApiError::Parse("Registration response is missing tokens.".to_string());
                Err(self.fail(&err, REGISTER_FAILED).await)
            }
            Err(err) => Err(self.fail(&err, REGISTER_FAILED).await),
        };

        self.finish().await;
        result
    }

    /// Ends the session. Server-side invalidation is attempted once and its
    /// failure is only logged; local teardown always happens.
    pub async fn logout(&self) {
        let _writer = self.writer.lock().await;
        self.logout_locked().await;
    }

    /// True when an expiry is tracked and now is within `lead_minutes` of it.
    pub async fn is_token_expiring(&self, lead_minutes: i64) -> bool {
        let expires_at = self.state.read().await.expires_at;
        token_expiring_at(expires_at, Utc::now(), lead_minutes)
    }

    /// Asks the server whether the held token is valid. Without a token this is
    /// `false` with no request; a failed request or a negative verdict logs out.
    pub async fn verify_token(&self) -> bool {
        let _writer = self.writer.lock().await;
        let token = self.state.read().await.access_token().map(str::to_string);
        let Some(token) = token else {
            return false;
        };

        match client::verify_token(&self.api, self.profile, &token).await {
            Ok(true) => true,
            Ok(false) => {
                info!("server rejected the session token");
                self.logout_locked().await;
                false
            }
            Err(err) => {
                warn!("token verification failed: {}", err);
                self.logout_locked().await;
                false
            }
        }
    }

    /// Replaces the token set using the held refresh token. A failed refresh
    /// keeps the current session and records the error.
    ///
    /// # Errors
    /// Returns `AuthFailure` when there is no refreshable session, the profile has
    /// no refresh endpoint, or the request fails.
    pub async fn refresh_tokens(&self) -> Result<(), AuthFailure> {
        let _writer = self.writer.lock().await;

        let (principal, refresh_token) = {
            let state = self.state.read().await;
            let refresh_token = state
                .tokens
                .as_ref()
                .and_then(|tokens| tokens.refresh_token.clone());
            (state.principal.clone().filter(|_| state.authenticated), refresh_token)
        };
        let (Some(principal), Some(refresh_token), Some(_)) =
            (principal, refresh_token, self.profile.refresh_path())
        else {
            let failure = AuthFailure::new(REFRESH_FAILED);
            self.record(&failure).await;
            return Err(failure);
        };

        self.begin().await;
        let result = match client::refresh_tokens(&self.api, self.profile, &refresh_token).await {
            Ok(mut tokens) => {
                if tokens.refresh_token.is_none() {
                    tokens.refresh_token = Some(refresh_token);
                }
                match self.establish(principal, tokens).await {
                    Ok(()) => Ok(()),
                    Err(err) => Err(self.fail(&err, REFRESH_FAILED).await),
                }
            }
            Err(err) => Err(self.fail(&err, REFRESH_FAILED).await),
        };
        self.finish().await;
        result
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(&self) {
        self.state.write().await.loading = false;
    }

    async fn record(&self, failure: &AuthFailure) {
        self.state.write().await.error = Some(failure.message.clone());
    }

    async fn fail(&self, err: &ApiError, default_message: &str) -> AuthFailure {
        warn!("session action failed: {}", err);
        let failure = AuthFailure {
            message: err
                .server_message()
                .unwrap_or(default_message)
                .to_string(),
            field_errors: err.field_errors().cloned(),
        };
        self.record(&failure).await;
        failure
    }

    /// Makes `principal` and `tokens` the current session, in memory, on disk and
    /// in the credential slot.
    async fn establish(&self, principal: Principal, tokens: TokenSet) -> Result<(), ApiError> {
        let expires_at = self.expiry_for(&tokens, Utc::now())?;

        self.persist(&principal, &tokens, expires_at);
        self.api.set_bearer(&tokens.access_token).await;
        info!(principal = %principal.id, "session established");

        let mut state = self.state.write().await;
        state.principal = Some(principal);
        state.tokens = Some(tokens);
        state.expires_at = expires_at;
        state.authenticated = true;
        Ok(())
    }

    fn expiry_for(
        &self,
        tokens: &TokenSet,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, ApiError> {
        if !self.profile.tracks_expiry() {
            return Ok(None);
        }

        let lifetime = tokens.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        if lifetime <= 0 {
            return Err(ApiError::Parse(format!(
                "Token lifetime must be positive, got {lifetime}."
            )));
        }

        Duration::try_seconds(lifetime)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .map(Some)
            .ok_or_else(|| ApiError::Parse(format!("Token lifetime out of range: {lifetime}.")))
    }

    async fn logout_locked(&self) {
        let token = self.state.read().await.access_token().map(str::to_string);
        if let Some(token) = token {
            if let Err(err) = client::logout(&self.api, self.profile, &token).await {
                warn!("failed to invalidate token on the server: {}", err);
            }
        }

        self.teardown().await;
        info!("session closed");
    }

    /// Clears the in-memory session, its durable entries and the credential slot.
    async fn teardown(&self) {
        {
            let mut state = self.state.write().await;
            state.principal = None;
            state.tokens = None;
            state.expires_at = None;
            state.authenticated = false;
            state.error = None;
        }

        for key in self.profile.storage_keys().all() {
            if let Err(err) = self.storage.remove(key) {
                warn!("failed to remove {} from the session store: {}", key, err);
            }
        }

        self.api.clear_bearer().await;
    }

    fn persist(&self, principal: &Principal, tokens: &TokenSet, expires_at: Option<DateTime<Utc>>) {
        let keys = self.profile.storage_keys();

        match self.profile.encode_tokens(tokens) {
            Ok(blob) => self.store(keys.tokens, &blob),
            Err(err) => warn!("failed to encode tokens: {}", err),
        }
        match serde_json::to_string(principal) {
            Ok(blob) => self.store(keys.principal, &blob),
            Err(err) => warn!("failed to encode principal: {}", err),
        }
        if let (Some(key), Some(expires_at)) = (keys.expiry, expires_at) {
            self.store(key, &expires_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
    }

    fn store(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            warn!("failed to write {} to the session store: {}", key, err);
        }
    }

    fn read_persisted(&self) -> Persisted {
        let keys = self.profile.storage_keys();
        let read = |key: &str| self.storage.get(key);

        let (Ok(raw_tokens), Ok(raw_principal), Ok(raw_expiry)) = (
            read(keys.tokens),
            read(keys.principal),
            keys.expiry.map(read).transpose(),
        ) else {
            return Persisted::Corrupt("session store could not be read");
        };

        // `raw_expiry` is `None` for profiles without expiry tracking.
        let expiry_present = matches!(raw_expiry, Some(Some(_)));
        match (raw_tokens, raw_principal, raw_expiry) {
            (None, None, None | Some(None)) => Persisted::Absent,
            (Some(raw_tokens), Some(raw_principal), raw_expiry)
                if expiry_present || raw_expiry.is_none() =>
            {
                let Some(tokens) = self.profile.decode_tokens(&raw_tokens) else {
                    return Persisted::Corrupt("credential blob is unreadable");
                };
                let Ok(principal) = serde_json::from_str::<Principal>(&raw_principal) else {
                    return Persisted::Corrupt("principal is unreadable");
                };
                let expires_at = match raw_expiry.flatten() {
                    None => None,
                    Some(raw) => match DateTime::parse_from_rfc3339(raw.trim()) {
                        Ok(at) => Some(at.with_timezone(&Utc)),
                        Err(_) => return Persisted::Corrupt("expiry is unreadable"),
                    },
                };
                Persisted::Stored {
                    principal,
                    tokens,
                    expires_at,
                }
            }
            _ => Persisted::Corrupt("session entries are incomplete"),
        }
    }
}

fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|expires_at| expires_at <= now)
}

/// Pure form of [`SessionStore::is_token_expiring`].
#[must_use]
pub fn token_expiring_at(
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    lead_minutes: i64,
) -> bool {
    let Some(expires_at) = expires_at else {
        return false;
    };
    // A lead too large to represent saturates: a positive one covers every
    // expiry, a negative one none.
    Duration::try_minutes(lead_minutes)
        .and_then(|lead| expires_at.checked_sub_signed(lead))
        .map_or(lead_minutes > 0, |threshold| now >= threshold)
}

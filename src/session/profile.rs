//! API profiles. The admin profile is the primary contract (token set with
//! refresh token and tracked expiry); the legacy profile keeps the older
//! `/auth/*` sign-in endpoints with a single bearer token and no expiry. Logout
//! and verification exist only under `/admin/*`, so both profiles share them.
//! Profiles are selected by configuration and never mixed within one session.

use super::types::TokenSet;
use std::fmt;
use std::str::FromStr;

/// Lifetime assumed when the admin API omits `expires_in` (its issuance default).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 1200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ApiProfile {
    #[default]
    Admin,
    Legacy,
}

/// Durable-storage key names for one profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub tokens: &'static str,
    pub principal: &'static str,
    pub expiry: Option<&'static str>,
}

impl StorageKeys {
    pub fn all(&self) -> impl Iterator<Item = &'static str> {
        [Some(self.tokens), Some(self.principal), self.expiry]
            .into_iter()
            .flatten()
    }
}

impl ApiProfile {
    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            ApiProfile::Admin => "/admin/login/",
            ApiProfile::Legacy => "/auth/login/",
        }
    }

    #[must_use]
    pub fn register_path(self) -> &'static str {
        match self {
            ApiProfile::Admin => "/admin/create/",
            ApiProfile::Legacy => "/auth/register/",
        }
    }

    #[must_use]
    pub fn logout_path(self) -> &'static str {
        "/admin/logout/"
    }

    #[must_use]
    pub fn verify_path(self) -> &'static str {
        "/admin/verify-token/"
    }

    /// `None` when the profile has no refresh flow.
    #[must_use]
    pub fn refresh_path(self) -> Option<&'static str> {
        match self {
            ApiProfile::Admin => Some("/admin/refresh-token/"),
            ApiProfile::Legacy => None,
        }
    }

    #[must_use]
    pub fn storage_keys(self) -> StorageKeys {
        match self {
            ApiProfile::Admin => StorageKeys {
                tokens: "admin_tokens",
                principal: "admin_data",
                expiry: Some("token_expiry"),
            },
            ApiProfile::Legacy => StorageKeys {
                tokens: "admin_token",
                principal: "admin_data",
                expiry: None,
            },
        }
    }

    #[must_use]
    pub fn tracks_expiry(self) -> bool {
        self.storage_keys().expiry.is_some()
    }

    /// Whether a successful registration signs the caller in.
    #[must_use]
    pub fn register_authenticates(self) -> bool {
        matches!(self, ApiProfile::Legacy)
    }

    /// Serializes the credential blob stored under the tokens key.
    ///
    /// # Errors
    /// Returns an error if the token set cannot be encoded as JSON.
    pub fn encode_tokens(self, tokens: &TokenSet) -> Result<String, serde_json::Error> {
        match self {
            ApiProfile::Admin => serde_json::to_string(tokens),
            ApiProfile::Legacy => Ok(tokens.access_token.clone()),
        }
    }

    /// Parses a stored credential blob; `None` when it is unusable.
    #[must_use]
    pub fn decode_tokens(self, raw: &str) -> Option<TokenSet> {
        match self {
            ApiProfile::Admin => serde_json::from_str::<TokenSet>(raw)
                .ok()
                .filter(|tokens| !tokens.access_token.trim().is_empty()),
            ApiProfile::Legacy => {
                let token = raw.trim();
                (!token.is_empty()).then(|| TokenSet::bearer(token))
            }
        }
    }
}

impl fmt::Display for ApiProfile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiProfile::Admin => formatter.write_str("admin"),
            ApiProfile::Legacy => formatter.write_str("legacy"),
        }
    }
}

impl FromStr for ApiProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(ApiProfile::Admin),
            "legacy" => Ok(ApiProfile::Legacy),
            other => Err(format!("unknown API profile: {other}")),
        }
    }
}

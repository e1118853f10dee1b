//! Client configuration for the API endpoint, the durable session store and the
//! API profile. Defaults target a local development backend; the CLI layers flag
//! and environment overrides on top. Configuration values are public; do not
//! store secrets here.

use crate::session::ApiProfile;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_STORE_PATH: &str = ".contest-admin/session.json";

/// Resolved client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub store_path: PathBuf,
    pub profile: ApiProfile,
    /// `None` leaves requests without a deadline.
    pub request_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            profile: ApiProfile::Admin,
            request_timeout: None,
        }
    }
}

impl AppConfig {
    /// Builds the default config and applies the provided overrides.
    #[must_use]
    pub fn load(overrides: ConfigOverrides) -> Self {
        let mut config = Self::default();
        apply_overrides(&mut config, overrides);
        config
    }
}

/// Optional values collected from flags or the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub store_path: Option<String>,
    pub profile: Option<ApiProfile>,
    pub request_timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Collects overrides, dropping blank strings and a zero timeout.
    #[must_use]
    pub fn new(
        api_base_url: Option<&str>,
        store_path: Option<&str>,
        profile: Option<ApiProfile>,
        request_timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.and_then(normalize_value),
            store_path: store_path.and_then(normalize_value),
            profile,
            request_timeout_secs: request_timeout_secs.filter(|secs| *secs > 0),
        }
    }
}

fn apply_overrides(config: &mut AppConfig, overrides: ConfigOverrides) {
    if let Some(value) = overrides.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = overrides.store_path {
        config.store_path = PathBuf::from(value);
    }
    if let Some(value) = overrides.profile {
        config.profile = value;
    }
    if let Some(secs) = overrides.request_timeout_secs {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

//! Client wrappers for the admin auth endpoints. These keep endpoint paths and
//! payload shapes in one place and must never log credentials or tokens.

use crate::api::{ApiClient, ApiError};
use crate::session::profile::ApiProfile;
use crate::session::types::{
    AuthResponse, LegacyRegisterRequest, LoginCredentials, Principal, RefreshRequest,
    RefreshResponse, Registration, TokenSet, VerifyResponse,
};
use serde_json::json;

/// Exchanges credentials for a principal and a token set.
pub async fn login(
    api: &ApiClient,
    profile: ApiProfile,
    credentials: &LoginCredentials,
) -> Result<(Principal, TokenSet), ApiError> {
    let response: AuthResponse = api
        .post_json(profile.login_path(), credentials, None)
        .await?;
    let tokens = response
        .credentials()
        .ok_or_else(|| ApiError::Parse("Login response is missing tokens.".to_string()))?;
    let principal = response
        .user
        .ok_or_else(|| ApiError::Parse("Login response is missing the account.".to_string()))?;
    Ok((principal, tokens))
}

/// Creates an account. Tokens are only present for profiles that sign the
/// caller in on registration.
pub async fn register(
    api: &ApiClient,
    profile: ApiProfile,
    registration: &Registration,
) -> Result<(Principal, Option<TokenSet>), ApiError> {
    let response: AuthResponse = match profile {
        ApiProfile::Admin => {
            api.post_json(profile.register_path(), registration, None)
                .await?
        }
        ApiProfile::Legacy => {
            let request = LegacyRegisterRequest {
                email: &registration.email,
                password: &registration.password,
            };
            api.post_json(profile.register_path(), &request, None)
                .await?
        }
    };
    let tokens = response.credentials();
    let principal = response.user.ok_or_else(|| {
        ApiError::Parse("Registration response is missing the account.".to_string())
    })?;
    Ok((principal, tokens))
}

/// Invalidates `access_token` on the server. The response body is ignored.
pub async fn logout(
    api: &ApiClient,
    profile: ApiProfile,
    access_token: &str,
) -> Result<(), ApiError> {
    api.post_json_discard(profile.logout_path(), &json!({}), Some(access_token))
        .await
}

/// Asks the server whether `access_token` is still valid.
pub async fn verify_token(
    api: &ApiClient,
    profile: ApiProfile,
    access_token: &str,
) -> Result<bool, ApiError> {
    let response: VerifyResponse = api
        .get_json(profile.verify_path(), Some(access_token))
        .await?;
    Ok(response.valid)
}

/// Exchanges a refresh token for a new token set.
pub async fn refresh_tokens(
    api: &ApiClient,
    profile: ApiProfile,
    refresh_token: &str,
) -> Result<TokenSet, ApiError> {
    let path = profile.refresh_path().ok_or_else(|| {
        ApiError::Config(format!("The {profile} profile has no refresh endpoint."))
    })?;
    let response: RefreshResponse = api
        .post_json(path, &RefreshRequest { refresh_token }, None)
        .await?;
    Ok(response.tokens)
}

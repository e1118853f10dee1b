//! Client-side session and route-access layer for the contest registration
//! admin panel.
//!
//! ## Core Flows
//!
//! ### Login
//!
//! 1. **Submit:** [`session::SessionStore::login`] posts `{email, password}` to the
//!    profile's login endpoint.
//! 2. **Persist:** The principal, the token blob and the absolute expiry are written
//!    to the durable store so the session survives a restart.
//! 3. **Attach:** The access token is placed in the [`api::ApiClient`] credential
//!    slot and sent as `Authorization: Bearer <token>` on every later request.
//!
//! ### Navigation
//!
//! Every transition goes through [`navigation::Router::navigate`], which resolves the
//! path against the static [`navigation::RouteTable`] and asks the
//! [`navigation::NavigationGuard`] to allow or redirect it. The guard runs
//! `initialize()` first, so a restored or expired session is always settled before
//! a policy is evaluated.
//!
//! Access control here is UX only; the API remains the authority.

pub mod api;
pub mod cli;
pub mod config;
pub mod navigation;
pub mod session;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

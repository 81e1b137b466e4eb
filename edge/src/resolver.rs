use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use admingate_misc::api;
use admingate_misc::api::auth::{RefreshResponse, SessionUser};

/// Why a session could not be resolved.
///
/// The gate treats both variants identically (fail closed, redirect to
/// login); they stay distinct so logs and tests can tell a revoked
/// session from a broken upstream.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No valid session for the forwarded credential: the refresh
    /// endpoint rejected it, or answered without a usable role.
    #[error("no valid session for the forwarded credential")]
    Unauthenticated,

    /// The refresh endpoint could not be reached or returned a body we
    /// cannot read.
    #[error("session refresh unavailable: {0}")]
    Upstream(String),
}

/// Resolves a forwarded credential into the current session user.
///
/// Implementations must not cache: a session can be revoked at any time,
/// so every call has to reflect current server-side truth.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, cookie: &str) -> Result<SessionUser, ResolveError>;
}

/// Production resolver: POSTs the refresh endpoint on the storefront API
/// origin, forwarding the caller's cookie header.
pub struct RestfulResolver {
    refresh_url: String,
    client: reqwest::Client,
}

impl RestfulResolver {
    pub fn new(api_url: &str) -> Self {
        let refresh_url = format!("{}{}", api_url.trim_end_matches('/'), api::REFRESH_PATH);
        Self {
            refresh_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SessionResolver for RestfulResolver {
    async fn resolve(&self, cookie: &str) -> Result<SessionUser, ResolveError> {
        debug!("Refreshing session against {}", self.refresh_url);

        let resp = self
            .client
            .post(&self.refresh_url)
            .header(api::HEADER_COOKIE, cookie)
            .header(api::HEADER_CONTENT_TYPE, api::MIME_JSON)
            .header(api::HEADER_CACHE_CONTROL, api::CACHE_NO_STORE)
            .send()
            .await
            .map_err(|e| ResolveError::Upstream(format!("request refresh endpoint: {e}")))?;

        if !resp.status().is_success() {
            debug!("Refresh endpoint answered {}", resp.status());
            return Err(ResolveError::Unauthenticated);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ResolveError::Upstream(format!("read refresh response: {e}")))?;

        let resp: RefreshResponse = serde_json::from_slice(&body)
            .map_err(|e| ResolveError::Upstream(format!("parse refresh response: {e}")))?;

        // A success response without a usable role is indistinguishable
        // from no session at all.
        match resp.into_user() {
            Some(user) if !user.role.is_empty() => Ok(user),
            _ => Err(ResolveError::Unauthenticated),
        }
    }
}

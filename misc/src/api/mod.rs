pub mod auth;

use serde::{Deserialize, Serialize};

/// Session-refresh endpoint on the storefront API origin.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

pub const HEALTHZ_PATH: &str = "/healthz";

pub const HEADER_COOKIE: &str = "Cookie";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CACHE_CONTROL: &str = "Cache-Control";
pub const HEADER_LOCATION: &str = "Location";

pub const MIME_JSON: &str = "application/json";

/// Refresh calls must reflect current server-side session truth, so all
/// caching is disabled on them.
pub const CACHE_NO_STORE: &str = "no-store";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub timestamp: u64,
}

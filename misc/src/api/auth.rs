use serde::{Deserialize, Serialize};

use crate::policy::Role;

/// The user object carried by a successful session refresh.
///
/// Only the role is load-bearing for authorization; the rest is metadata
/// the identity service happens to include.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Wire role name, one of the known role strings. May be absent on a
    /// malformed upstream response; an empty role never authenticates.
    #[serde(default)]
    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionUser {
    pub fn role(&self) -> Option<Role> {
        Role::from_name(&self.role)
    }
}

/// Body of the session-refresh response.
///
/// The identity service has shipped the user both nested under `data`
/// and at the top level; both shapes must be tolerated.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub data: Option<RefreshData>,

    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshData {
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl RefreshResponse {
    /// Extracts the session user, preferring the nested shape.
    pub fn into_user(self) -> Option<SessionUser> {
        self.data.and_then(|d| d.user).or(self.user)
    }
}

/// Parses a refresh response body into a usable session user.
///
/// Returns `None` for a malformed body, a body without a user in either
/// shape, or a user without a role. Both enforcement points go through
/// this one function, so "what counts as a session" cannot drift.
pub fn session_user_from_body(body: &[u8]) -> Option<SessionUser> {
    let resp: RefreshResponse = serde_json::from_slice(body).ok()?;
    let user = resp.into_user()?;
    if user.role.is_empty() {
        return None;
    }
    Some(user)
}

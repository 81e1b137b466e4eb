use std::sync::Arc;

use anyhow::Result;
use log::{debug, error};
use url::Url;

use admingate_misc::policy::{PolicyTable, Role, HOME_PATH, LOGIN_PATH, ORDERS_PREFIX};
use admingate_misc::redirect;

use crate::context::EdgeContext;
use crate::resolver::ResolveError;

/// Why the gate deliberately let a request through without checking it.
///
/// A bypass is a configuration escape hatch with different security
/// implications than an authorization success; the two must never be
/// conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// Edge enforcement is switched off.
    Disabled,
    /// The path is an unauthenticated entry point (login, register).
    PublicEntry,
    /// The path is outside the protected namespace.
    OutsideNamespace,
    /// The API origin is unset or does not share an origin with the
    /// request, so forwarded cookies cannot be trusted; enforcement
    /// shifts to the client guard.
    CrossOrigin,
}

/// Terminal outcome of one gate pass. Constructed fresh per request and
/// never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Authenticated and authorized for the requested path.
    Allow,
    /// Enforcement was skipped; see the reason.
    Bypass(BypassReason),
    /// No usable session; the original destination travels along.
    RedirectToLogin(String),
    /// Valid session, wrong subtree; send to the role's landing path.
    RedirectToFallback(&'static str),
    /// Valid session without any admin access.
    RedirectToHome,
}

impl GateDecision {
    /// Whether the request continues to the upstream content.
    pub fn passes(&self) -> bool {
        matches!(self, Self::Allow | Self::Bypass(_))
    }

    /// The redirect target, if this decision is a redirect.
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Allow | Self::Bypass(_) => None,
            Self::RedirectToLogin(next) => Some(redirect::login_url(LOGIN_PATH, next)),
            Self::RedirectToFallback(path) => Some(path.to_string()),
            Self::RedirectToHome => Some(HOME_PATH.to_string()),
        }
    }
}

/// A request as the gate sees it: destination, request origin and the
/// forwarded credential.
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    pub path: String,
    pub query: String,
    pub scheme: String,
    pub host: String,
    pub cookie: Option<String>,
}

impl GateRequest {
    fn continuation(&self) -> String {
        redirect::continuation(&self.path, &self.query)
    }

    fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// The edge authorization gate. Runs once per inbound request, before
/// any content is produced, and owns no cross-request state.
pub struct Gate {
    ctx: Arc<EdgeContext>,
}

impl Gate {
    pub fn new(ctx: Arc<EdgeContext>) -> Self {
        Self { ctx }
    }

    /// Decides the fate of one request. Infallible by contract: any
    /// internal fault resolves to a login redirect, never to `Allow`
    /// and never to a leaked error.
    pub async fn authorize(&self, req: &GateRequest) -> GateDecision {
        match self.try_authorize(req).await {
            Ok(decision) => {
                debug!("Gate: {} {} -> {:?}", req.origin(), req.path, decision);
                decision
            }
            Err(e) => {
                error!("Gate fault for {}, failing closed: {e:#}", req.path);
                GateDecision::RedirectToLogin(req.continuation())
            }
        }
    }

    async fn try_authorize(&self, req: &GateRequest) -> Result<GateDecision> {
        // Bypass rules, checked in order; first match wins.
        if !self.ctx.cfg.enforce {
            return Ok(GateDecision::Bypass(BypassReason::Disabled));
        }
        if PolicyTable::is_public_entry(&req.path) {
            return Ok(GateDecision::Bypass(BypassReason::PublicEntry));
        }
        if !PolicyTable::is_protected(&req.path) {
            return Ok(GateDecision::Bypass(BypassReason::OutsideNamespace));
        }
        if !origins_match(&self.ctx.cfg.api_url, &req.origin()) {
            return Ok(GateDecision::Bypass(BypassReason::CrossOrigin));
        }

        let cookie = req.cookie.as_deref().unwrap_or_default();
        let user = match self.ctx.resolver.resolve(cookie).await {
            Ok(user) => user,
            Err(ResolveError::Unauthenticated) => {
                return Ok(GateDecision::RedirectToLogin(req.continuation()));
            }
            Err(ResolveError::Upstream(err)) => {
                // Fail closed toward protected resources.
                debug!("Session refresh unavailable: {err}");
                return Ok(GateDecision::RedirectToLogin(req.continuation()));
            }
        };

        let decision = match user.role() {
            Some(role) if PolicyTable::allows(role, &req.path) => GateDecision::Allow,
            Some(Role::DeliveryPartner) => GateDecision::RedirectToFallback(ORDERS_PREFIX),
            _ => GateDecision::RedirectToHome,
        };
        Ok(decision)
    }
}

/// Whether the configured API origin shares scheme, host and port with
/// the request origin. An unset or unparsable origin never matches.
fn origins_match(api_url: &str, request_origin: &str) -> bool {
    if api_url.is_empty() {
        return false;
    }

    let api = match Url::parse(api_url) {
        Ok(url) => url,
        Err(_) => return false,
    };
    let req = match Url::parse(request_origin) {
        Ok(url) => url,
        Err(_) => return false,
    };

    api.scheme() == req.scheme()
        && api.host_str() == req.host_str()
        && api.port_or_known_default() == req.port_or_known_default()
}

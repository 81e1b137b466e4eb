use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::watch;

use admingate_misc::api;
use admingate_misc::api::auth::{session_user_from_body, SessionUser};

use crate::config::ClientConfig;

/// The client-held identity snapshot the guard renders against.
///
/// `is_loading` is true until the first refresh completes; `epoch` is
/// bumped on every completed refresh so redirect effects can be keyed on
/// the identity they were decided for.
#[derive(Debug, Clone, Default)]
pub struct IdentityState {
    pub user: Option<SessionUser>,
    pub is_loading: bool,
    pub epoch: u64,
}

impl IdentityState {
    /// The state before the first refresh has completed.
    pub fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
            epoch: 0,
        }
    }

    pub fn loaded(user: Option<SessionUser>, epoch: u64) -> Self {
        Self {
            user,
            is_loading: false,
            epoch,
        }
    }
}

/// Access to the asynchronously refreshed identity.
///
/// The source is backed by a watch channel: readers always see the
/// latest snapshot, and an awaiting reader wakes up when a refresh
/// lands.
pub struct IdentitySource {
    rx: watch::Receiver<IdentityState>,

    // Kept so a static source stays readable after construction.
    _tx: Option<watch::Sender<IdentityState>>,
}

impl IdentitySource {
    /// Starts the background refresh loop against the configured API.
    pub fn start(cfg: ClientConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(IdentityState::loading());

        let refresh_url = format!("{}{}", cfg.api_url.trim_end_matches('/'), api::REFRESH_PATH);
        let handler = RefreshHandler {
            client: reqwest::Client::new(),
            refresh_url,
            credential: cfg.credential,
            refresh_secs: cfg.refresh_secs,
            epoch: 0,
            state_tx,
        };
        tokio::spawn(async move {
            handler.main_loop().await;
        });

        Self {
            rx: state_rx,
            _tx: None,
        }
    }

    /// A source pinned to one state, for tests and embedders that manage
    /// identity themselves.
    pub fn new_static(state: IdentityState) -> Self {
        let (tx, rx) = watch::channel(state);
        Self { rx, _tx: Some(tx) }
    }

    /// The latest identity snapshot.
    pub fn current(&self) -> IdentityState {
        self.rx.borrow().clone()
    }

    /// Waits for the next refresh to land. Returns false when the
    /// refresh loop is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

struct RefreshHandler {
    client: reqwest::Client,
    refresh_url: String,
    credential: String,
    refresh_secs: u64,
    epoch: u64,
    state_tx: watch::Sender<IdentityState>,
}

impl RefreshHandler {
    async fn main_loop(mut self) {
        info!("Start identity refresh loop");
        let mut refresh_intv = tokio::time::interval(Duration::from_secs(self.refresh_secs));

        loop {
            refresh_intv.tick().await;
            self.handle_refresh().await;

            if self.state_tx.is_closed() {
                info!("All identity readers gone, stopping refresh loop");
                return;
            }
        }
    }

    async fn handle_refresh(&mut self) {
        // A failed refresh is definitive for this cycle: publish "no
        // identity" and let the next tick start fresh. No retries.
        let user = self.fetch_user().await;
        self.epoch += 1;

        debug!(
            "Identity refresh done, epoch: {}, role: {:?}",
            self.epoch,
            user.as_ref().map(|u| u.role.as_str())
        );
        self.state_tx
            .send_replace(IdentityState::loaded(user, self.epoch));
    }

    async fn fetch_user(&self) -> Option<SessionUser> {
        let resp = match self
            .client
            .post(&self.refresh_url)
            .header(api::HEADER_COOKIE, &self.credential)
            .header(api::HEADER_CONTENT_TYPE, api::MIME_JSON)
            .header(api::HEADER_CACHE_CONTROL, api::CACHE_NO_STORE)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Identity refresh request error: {e:#}");
                return None;
            }
        };

        if !resp.status().is_success() {
            debug!("Identity refresh answered {}", resp.status());
            return None;
        }

        match resp.bytes().await {
            Ok(body) => session_user_from_body(&body),
            Err(e) => {
                error!("Identity refresh read error: {e:#}");
                None
            }
        }
    }
}
